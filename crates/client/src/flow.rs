//! Multi-step user flows and scenario setup
//!
//! Each step checks its expected status before the next one starts. A failed
//! step ends the flow with its error; nothing is retried or rolled back, the
//! user involved is a throwaway record.

use serde::Serialize;
use tracing::info;

use serverest_common::{MessageResponse, StoredUser, User};

use crate::error::{ClientError, ClientResult};
use crate::generate::{generate_updated_user, generate_user_for_crud_flow};
use crate::users::UserService;

pub const CRUD_FLOW_SUCCESS: &str = "Complete CRUD flow executed successfully";
pub const CRUD_UPDATED_NAME: &str = "User CRUD Updated";

/// Outcome of a completed CRUD flow
#[derive(Debug, Clone, Serialize)]
pub struct CrudFlowReport {
    pub message: String,
    pub email: String,
    pub user_id: String,
    pub updated_name: String,
}

impl UserService {
    /// Create, resolve, update, delete, then verify absence for a fresh user
    pub async fn perform_crud_flow(&self, prefix: &str) -> ClientResult<CrudFlowReport> {
        let user = generate_user_for_crud_flow(prefix);
        self.run_crud_flow(&user, false).await
    }

    /// [`UserService::perform_crud_flow`] plus a read-back of the updated
    /// name before the delete
    pub async fn perform_verified_crud_flow(&self, prefix: &str) -> ClientResult<CrudFlowReport> {
        let user = generate_user_for_crud_flow(prefix);
        self.run_crud_flow(&user, true).await
    }

    /// Run the CRUD pipeline for a caller-supplied user
    pub async fn run_crud_flow(&self, user: &User, verify_update: bool) -> ClientResult<CrudFlowReport> {
        info!("CRUD flow: create {}", user.email);
        self.create_user(user).await?.expect_status(201, "create user")?;

        let user_id = self.find_user_id_by_email(&user.email).await?;
        info!("CRUD flow: resolved {} -> {}", user.email, user_id);

        let updated = generate_updated_user(user, CRUD_UPDATED_NAME);
        self.update_user(&user_id, &updated)
            .await?
            .expect_status(200, "update user")?;

        if verify_update {
            let stored: StoredUser = self
                .get_user_by_id(&user_id)
                .await?
                .expect_status(200, "read back user")?
                .json()?;
            if stored.user.name != updated.name {
                return Err(ClientError::Assertion(format!(
                    "expected name '{}' after update, found '{}'",
                    updated.name, stored.user.name
                )));
            }
        }

        self.delete_user(&user_id)
            .await?
            .expect_status(200, "delete user")?;

        if self.check_user_exists(&user.email).await? {
            return Err(ClientError::Assertion(format!(
                "user {} still exists after delete",
                user.email
            )));
        }

        info!("CRUD flow: {} removed", user.email);
        Ok(CrudFlowReport {
            message: CRUD_FLOW_SUCCESS.to_string(),
            email: user.email.clone(),
            user_id,
            updated_name: updated.name,
        })
    }

    /// Create a user, expect 201 and return the API message
    pub async fn register_user(&self, user: &User) -> ClientResult<String> {
        let response: MessageResponse = self
            .create_user(user)
            .await?
            .expect_status(201, "register user")?
            .json()?;
        Ok(response.message)
    }

    /// Create the user unless it already exists. Returns true if created.
    pub async fn ensure_user_exists(&self, user: &User) -> ClientResult<bool> {
        if self.check_user_exists(&user.email).await? {
            return Ok(false);
        }
        info!("Seeding missing user {}", user.email);
        self.create_user(user)
            .await?
            .expect_status(201, "ensure user exists")?;
        Ok(true)
    }

    /// Delete the user if present. Returns true if a user was deleted.
    pub async fn ensure_user_absent(&self, email: &str) -> ClientResult<bool> {
        if !self.check_user_exists(email).await? {
            return Ok(false);
        }
        // The filtered lookup may match loosely; only delete an exact match.
        let Some(user_id) = self.lookup_user_id(email).await? else {
            return Ok(false);
        };
        info!("Removing user {} ({})", email, user_id);
        self.delete_user(&user_id)
            .await?
            .expect_status(200, "ensure user absent")?;
        Ok(true)
    }
}
