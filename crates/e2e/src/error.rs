//! Error types for E2E testing

use thiserror::Error;

use serverest_client::ClientError;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Invalid page transition: cannot {to} while {from}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("API error: {0}")]
    Client(#[from] ClientError),

    #[error("Setup error: {0}")]
    Setup(#[from] serverest_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Fail the current scenario with `AssertionFailed` unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> E2eResult<()> {
    if condition {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(message.into()))
    }
}
