//! Data models for roster entities.
//!
//! This module contains the structures stored in the roster database:
//!
//! - `Member`: One roster entry with rank, service dates and board outcomes
//! - `Rank`: Pay grade with the enlisted promotion ladder
//! - `Team`: Team assignment, one roster array per team
//! - `CustomField`: Administrator-defined extra fields

pub mod field;
pub mod member;
pub mod organization;
pub mod rank;

pub use field::{CustomField, FieldType};
pub use member::{date_display, BoardStatus, BtzStatus, Member, FLIGHT_CHIEF, FLIGHT_COMMANDER};
pub use organization::Team;
pub use rank::{Rank, PROMOTION_LADDER};
