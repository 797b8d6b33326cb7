//! The roster around the promotion engine.
//!
//! - `store`: the `RosterStore` boundary and its in-memory implementation
//! - `service`: fetch/persist/delete/move plus the promotion actions
//! - `edit`: form drafts and strict date input
//! - `chart`: the supervision tree

pub mod chart;
pub mod edit;
pub mod error;
pub mod service;
pub mod store;

pub use chart::{build_chart, supervisees, supervisor_candidates, would_create_cycle, Chart, ChartNode};
pub use edit::{new_field_id, new_member_id, parse_date_input, parse_optional_date_input, DateInputError, MemberDraft};
pub use error::RosterError;
pub use service::RosterService;
pub use store::{AnyStore, MemoryStore, RosterStore};
