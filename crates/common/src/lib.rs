//! ServeRest E2E Common Library
//!
//! Shared data model, fixtures and configuration for the ServeRest
//! end-to-end suite.

pub mod config;
pub mod error;
pub mod fixtures;
pub mod types;

// Re-export commonly used types
pub use config::{CliOverrides, SuiteConfig};
pub use error::{Error, Result};
pub use fixtures::UsersFixture;
pub use types::*;
