//! ServeRest API client
//!
//! - [`ApiClient`]: verbs against one base URL, plus token-authenticated calls
//! - [`UserService`]: user operations, fixture setup and the CRUD flow
//! - [`generate`]: disposable user records

pub mod error;
pub mod flow;
pub mod generate;
pub mod http;
pub mod users;

pub use error::{ClientError, ClientResult};
pub use flow::{CrudFlowReport, CRUD_FLOW_SUCCESS};
pub use http::{ApiClient, ApiResponse, ClientConfig, RequestOptions};
pub use users::UserService;

pub use reqwest::Method;
