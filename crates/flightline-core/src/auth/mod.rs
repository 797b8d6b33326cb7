//! Credential storage.
//!
//! The Realtime Database secret is kept in the OS keychain via `keyring`,
//! keyed by database URL, and never written to the config file.

pub mod credentials;

pub use credentials::CredentialStore;
