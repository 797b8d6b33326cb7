use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "flightline";

/// Database secrets in the OS keychain, one entry per database URL.
pub struct CredentialStore;

impl CredentialStore {
    /// Store the secret for a database in the OS keychain
    pub fn store(database_url: &str, secret: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, database_url)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(secret)
            .context("Failed to store database secret in keychain")?;
        Ok(())
    }

    /// Retrieve the secret for a database from the OS keychain
    pub fn get(database_url: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, database_url)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve database secret from keychain")
    }

    /// Delete the stored secret for a database
    pub fn delete(database_url: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, database_url)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete database secret from keychain")?;
        Ok(())
    }

    /// Check if a secret exists for a database
    pub fn has_credentials(database_url: &str) -> bool {
        Entry::new(SERVICE_NAME, database_url)
            .map(|entry| entry.get_password().is_ok())
            .unwrap_or(false)
    }
}
