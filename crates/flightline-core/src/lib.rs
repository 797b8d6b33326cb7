//! Core library for flightline.
//!
//! Roster models, the promotion eligibility engine, the Realtime Database
//! client, the local cache and credential storage. Presentation crates
//! build on this; nothing here draws to a screen.

pub mod api;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod models;
pub mod promotion;
pub mod roster;

pub use clock::{Clock, FixedClock, SystemClock};
pub use models::{BoardStatus, BtzStatus, CustomField, FieldType, Member, Rank, Team};
pub use promotion::{evaluate, Action, Classification, Quarter, Verdict};
pub use roster::{RosterError, RosterService, RosterStore};
