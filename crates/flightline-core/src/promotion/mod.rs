//! Promotion eligibility and rank transitions.
//!
//! - [`quarter`]: calendar quarters used to schedule BTZ boards
//! - [`eligibility`]: per-member verdicts for the presentation layer
//! - [`sequencer`]: pure rank transitions and the roster-wide sweep
//!
//! None of these read the wall clock or touch the store. Callers pass
//! "today" in (see [`crate::clock`]) and persist whatever comes back.

pub mod dates;
pub mod eligibility;
pub mod error;
pub mod quarter;
pub mod sequencer;

pub use eligibility::{evaluate, evaluate_now, Action, Alert, BtzSchedule, Classification, Verdict};
pub use error::PromotionError;
pub use quarter::Quarter;
pub use sequencer::{
    apply_automatic_promotion, apply_board_promotion, apply_board_selection, apply_btz_selection,
    apply_due_board_promotion, process_auto_promotions, PromotionKind, PromotionRecord,
    SweepOutcome,
};
