//! ServeRest E2E Test Framework
//!
//! This crate runs the ServeRest scenarios:
//! - API scenarios call the REST API through `serverest-client`
//! - UI scenarios drive the login page through Playwright
//! - Extra UI checks can be declared as YAML step specs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── entries() -> [Scenario | TestSpec]                   │
//! │    ├── run_entry(entry) -> TestResult                       │
//! │    └── write_results(suite) -> test-results.json            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario                                                   │
//! │    ├── UI:  LoginPage -> [TestStep] -> PlaywrightHandle     │
//! │    └── API: UserService -> ApiClient -> ServeRest           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML)                                            │
//! │    └── steps: navigate | clear | type | click |             │
//! │               assert_url | assert | screenshot | log        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod login_page;
pub mod playwright;
pub mod runner;
pub mod scenarios;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use login_page::{LoginPage, PageState};
pub use runner::{RunnerConfig, TestRunner};
pub use scenarios::Scenario;
pub use spec::{TestSpec, TestStep};
