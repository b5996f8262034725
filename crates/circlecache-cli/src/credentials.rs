use anyhow::{Context, Result};
use keyring::Entry;

use crate::config::APP_NAME;

/// Provider passwords kept in the OS keychain, keyed by login identifier
pub struct CredentialStore;

impl CredentialStore {
    pub fn store(identifier: &str, secret: &str) -> Result<()> {
        let entry = Entry::new(APP_NAME, identifier)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(secret)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    pub fn get_password(identifier: &str) -> Result<String> {
        let entry = Entry::new(APP_NAME, identifier)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    pub fn delete(identifier: &str) -> Result<()> {
        let entry = Entry::new(APP_NAME, identifier)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }
}
