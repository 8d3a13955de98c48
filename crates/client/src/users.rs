//! User operations against `/usuarios`
//!
//! The API has no get-by-email endpoint. Resolving a user's id means
//! listing everyone and scanning for the email, so lookups are O(n).

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use serverest_common::{User, UserList};

use crate::error::{ClientError, ClientResult};
use crate::http::{ApiClient, ApiResponse, RequestOptions};

pub const USERS_PATH: &str = "/usuarios";

/// Stateless service over the users resource; every call re-fetches
#[derive(Debug, Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// `POST /usuarios`
    pub async fn create_user(&self, user: &User) -> ClientResult<ApiResponse> {
        debug!("Creating user {}", user.email);
        self.client.post(USERS_PATH, user, RequestOptions::new()).await
    }

    /// `GET /usuarios`
    pub async fn get_all_users(&self) -> ClientResult<ApiResponse> {
        self.client.get(USERS_PATH, RequestOptions::new()).await
    }

    /// Full listing decoded, failing unless the API answers 200
    pub async fn list_users(&self) -> ClientResult<UserList> {
        self.get_all_users()
            .await?
            .expect_status(200, "list users")?
            .json()
    }

    /// `GET /usuarios?email=...`; an empty `usuarios` array means absent
    pub async fn get_user_by_email(&self, email: &str) -> ClientResult<ApiResponse> {
        self.client
            .get(USERS_PATH, RequestOptions::new().query("email", email))
            .await
    }

    /// Authenticated `GET /usuarios/{id}`
    pub async fn get_user_by_id(&self, user_id: &str) -> ClientResult<ApiResponse> {
        self.client
            .authenticated_request(Method::GET, &user_path(user_id), None, RequestOptions::new())
            .await
    }

    /// Scan the full listing for an exact email match
    pub async fn lookup_user_id(&self, email: &str) -> ClientResult<Option<String>> {
        let list = self.list_users().await?;
        Ok(list.find_by_email(email).map(|u| u.id.clone()))
    }

    /// Like [`UserService::lookup_user_id`], but absence is `UserNotFound`
    pub async fn find_user_id_by_email(&self, email: &str) -> ClientResult<String> {
        self.lookup_user_id(email)
            .await?
            .ok_or_else(|| ClientError::UserNotFound {
                email: email.to_string(),
            })
    }

    /// True iff the filtered lookup answers 200 with at least one user
    pub async fn check_user_exists(&self, email: &str) -> ClientResult<bool> {
        let response = self.get_user_by_email(email).await?;
        let found = response
            .body
            .get("usuarios")
            .and_then(Value::as_array)
            .map_or(false, |users| !users.is_empty());
        Ok(response.status_code() == 200 && found)
    }

    /// Authenticated `PUT /usuarios/{id}`
    pub async fn update_user(&self, user_id: &str, user: &User) -> ClientResult<ApiResponse> {
        debug!("Updating user {}", user_id);
        self.client
            .authenticated_request(
                Method::PUT,
                &user_path(user_id),
                Some(serde_json::to_value(user)?),
                RequestOptions::new(),
            )
            .await
    }

    /// Authenticated `DELETE /usuarios/{id}`
    pub async fn delete_user(&self, user_id: &str) -> ClientResult<ApiResponse> {
        debug!("Deleting user {}", user_id);
        self.client
            .authenticated_request(Method::DELETE, &user_path(user_id), None, RequestOptions::new())
            .await
    }
}

pub fn user_path(user_id: &str) -> String {
    format!("{}/{}", USERS_PATH, user_id)
}
