//! Static user fixtures loaded before a scenario runs

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::User;

/// The `users.json` fixture: one account expected to exist and one expected
/// to be absent from the remote API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersFixture {
    pub valid_user: User,
    pub invalid_user: User,
}

impl UsersFixture {
    /// Parse a fixture from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: Self = serde_json::from_str(json)?;
        fixture.validate()?;
        Ok(fixture)
    }

    /// Load a fixture from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading user fixture from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<()> {
        for (label, user) in [("validUser", &self.valid_user), ("invalidUser", &self.invalid_user)] {
            if user.email.trim().is_empty() {
                return Err(Error::InvalidFixture(format!("{} has an empty email", label)));
            }
            if user.password.is_empty() {
                return Err(Error::InvalidFixture(format!("{} has an empty password", label)));
            }
        }
        if self.valid_user.email == self.invalid_user.email {
            return Err(Error::InvalidFixture(
                "validUser and invalidUser share the same email".to_string(),
            ));
        }
        Ok(())
    }
}
