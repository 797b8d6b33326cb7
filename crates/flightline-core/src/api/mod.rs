//! REST client for the Realtime Database that holds the roster.
//!
//! Team rosters live at `/<team>` as arrays of member records and the custom
//! field definitions at `/_config/customFields`. Requests are authenticated
//! with the database secret kept in the OS keychain.

pub mod client;
pub mod error;

pub use client::{RealtimeDbClient, FIELDS_PATH};
pub use error::ApiError;
