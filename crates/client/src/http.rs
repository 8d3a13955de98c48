//! HTTP client for the ServeRest API
//!
//! Every verb goes through [`ApiClient::request`], which never turns a
//! non-2xx status into an error. Scenarios assert on invalid-credential and
//! other 4xx flows, so the status must always come back as a value.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use serverest_common::{Credentials, LoginResponse, SuiteConfig};

use crate::error::{ClientError, ClientResult};

/// Connection settings injected into the client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every path is appended to
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://serverest.dev".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl From<&SuiteConfig> for ClientConfig {
    fn from(config: &SuiteConfig) -> Self {
        Self {
            base_url: config.api_url.clone(),
            timeout: config.request_timeout(),
        }
    }
}

/// Per-call extras: headers, query string and JSON body
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl ApiResponse {
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Decode the body into a typed payload
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    /// The `message` field most ServeRest responses carry
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// Fail with `UnexpectedStatus` unless the status matches
    pub fn expect_status(self, expected: u16, step: &str) -> ClientResult<Self> {
        if self.status.as_u16() == expected {
            Ok(self)
        } else {
            Err(ClientError::UnexpectedStatus {
                step: step.to_string(),
                expected,
                actual: self.status.as_u16(),
                body: self.body.to_string(),
            })
        }
    }
}

/// Thin wrapper over `reqwest` bound to one API base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl ApiClient {
    /// Create a client for the configured base URL
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    /// Credentials used by [`ApiClient::authenticated_request`]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request to `base_url + path`
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        let headers = build_headers(&options.headers)?;

        debug!("{} {}", method, url);

        let mut builder = self.http.request(method.clone(), &url).headers(headers);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;

        debug!("{} {} -> {}", method, url, status);

        Ok(ApiResponse {
            status,
            headers,
            body: parse_body(&text),
        })
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> ClientResult<ApiResponse> {
        self.request(Method::GET, path, options).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse> {
        let options = options.body(serde_json::to_value(body)?);
        self.request(Method::POST, path, options).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse> {
        let options = options.body(serde_json::to_value(body)?);
        self.request(Method::PUT, path, options).await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> ClientResult<ApiResponse> {
        self.request(Method::DELETE, path, options).await
    }

    /// Exchange credentials for a bearer token via `POST /login`
    pub async fn login(&self, credentials: &Credentials) -> ClientResult<String> {
        let response = self
            .post("/login", credentials, RequestOptions::new())
            .await?
            .expect_status(200, "login")?;

        let login: LoginResponse = response.json()?;
        login
            .authorization
            .filter(|token| !token.is_empty())
            .ok_or(ClientError::MissingAuthorization)
    }

    /// Log in with the configured credentials, then issue the request with
    /// the fresh token in the `Authorization` header
    pub async fn authenticated_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ClientResult<ApiResponse> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ClientError::MissingCredentials)?;

        let token = self.login(credentials).await?;
        info!("Authenticated as {} for {} {}", credentials.email, method, path);

        let mut options = options.header(AUTHORIZATION.as_str(), token);
        if let Some(body) = body {
            options = options.body(body);
        }
        self.request(method, path, options).await
    }
}

fn build_headers(extra: &[(String, String)]) -> ClientResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in extra {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ClientError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| ClientError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
