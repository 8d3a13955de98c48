//! Built-in scenarios
//!
//! Each scenario re-establishes its own preconditions against the remote
//! API. Nothing carries over from one scenario to the next except the
//! remote dataset itself.

use tracing::info;

use serverest_client::generate::{
    generate_unique_user, generate_updated_user, generate_user_for_deletion, CRUD_FLOW_PREFIX,
    DELETION_PREFIX,
};
use serverest_client::users::{user_path, USERS_PATH};
use serverest_client::{Method, RequestOptions, UserService, CRUD_FLOW_SUCCESS};
use serverest_common::{StoredUser, UserList, UsersFixture};

use crate::error::{ensure, E2eError, E2eResult};
use crate::login_page::{
    LoginPage, EMAIL_REQUIRED_MESSAGE, INVALID_CREDENTIALS_MESSAGE, PASSWORD_REQUIRED_MESSAGE,
};
use crate::playwright::{PlaywrightHandle, StepResult};
use crate::spec::TestStep;

pub const UPDATED_VALID_USER_NAME: &str = "Usuário Atualizado CRUD";

/// Everything a scenario may touch
pub struct ScenarioContext {
    pub service: UserService,
    pub fixture: UsersFixture,
    pub browser: Option<PlaywrightHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    LoginValidUser,
    LoginInvalidUser,
    LoginBlankEmail,
    LoginBlankPassword,
    RegisterUser,
    ListUsers,
    UpdateUser,
    DeleteUser,
    CrudFlow,
}

impl Scenario {
    pub const ALL: [Scenario; 9] = [
        Scenario::LoginValidUser,
        Scenario::LoginInvalidUser,
        Scenario::LoginBlankEmail,
        Scenario::LoginBlankPassword,
        Scenario::RegisterUser,
        Scenario::ListUsers,
        Scenario::UpdateUser,
        Scenario::DeleteUser,
        Scenario::CrudFlow,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::LoginValidUser => "login-valid-user",
            Scenario::LoginInvalidUser => "login-invalid-user",
            Scenario::LoginBlankEmail => "login-blank-email",
            Scenario::LoginBlankPassword => "login-blank-password",
            Scenario::RegisterUser => "register-user",
            Scenario::ListUsers => "list-users",
            Scenario::UpdateUser => "update-user",
            Scenario::DeleteUser => "delete-user",
            Scenario::CrudFlow => "crud-flow",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::LoginValidUser => "Logs in through the UI with valid credentials",
            Scenario::LoginInvalidUser => "Shows an error for credentials that do not exist",
            Scenario::LoginBlankEmail => "Shows an alert when the email is blank",
            Scenario::LoginBlankPassword => "Shows an alert when the password is blank",
            Scenario::RegisterUser => "Registers a new admin user",
            Scenario::ListUsers => "Lists all users with an authenticated request",
            Scenario::UpdateUser => "Updates the valid user and reads the change back",
            Scenario::DeleteUser => "Deletes a freshly created user",
            Scenario::CrudFlow => "Runs create, read, update and delete in sequence",
        }
    }

    pub fn is_ui(&self) -> bool {
        matches!(
            self,
            Scenario::LoginValidUser
                | Scenario::LoginInvalidUser
                | Scenario::LoginBlankEmail
                | Scenario::LoginBlankPassword
        )
    }

    pub fn tags(&self) -> &'static [&'static str] {
        if self.is_ui() {
            &["ui", "login"]
        } else {
            &["api", "crud"]
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Run the scenario; browser scenarios return their step results
    pub async fn run(&self, ctx: &ScenarioContext) -> E2eResult<Vec<StepResult>> {
        info!("Scenario {}: {}", self.name(), self.description());
        match self {
            Scenario::LoginValidUser => login_valid_user(ctx).await,
            Scenario::LoginInvalidUser => login_invalid_user(ctx).await,
            Scenario::LoginBlankEmail => {
                let mut page = visit_login_page(ctx)?;
                page.login_empty_email()?;
                page.check_login_error(EMAIL_REQUIRED_MESSAGE)?;
                run_page(ctx, self.name(), page.into_steps()).await
            }
            Scenario::LoginBlankPassword => {
                let mut page = visit_login_page(ctx)?;
                page.login_empty_password()?;
                page.check_login_error(PASSWORD_REQUIRED_MESSAGE)?;
                run_page(ctx, self.name(), page.into_steps()).await
            }
            Scenario::RegisterUser => {
                ensure_valid_user(ctx).await?;
                register_user(&ctx.service).await
            }
            Scenario::ListUsers => {
                ensure_valid_user(ctx).await?;
                list_users(ctx).await
            }
            Scenario::UpdateUser => {
                ensure_valid_user(ctx).await?;
                update_valid_user(ctx).await
            }
            Scenario::DeleteUser => {
                ensure_valid_user(ctx).await?;
                delete_user(&ctx.service).await
            }
            Scenario::CrudFlow => {
                ensure_valid_user(ctx).await?;
                let report = ctx
                    .service
                    .perform_verified_crud_flow(CRUD_FLOW_PREFIX)
                    .await?;
                ensure(
                    report.message.contains(CRUD_FLOW_SUCCESS),
                    format!("unexpected CRUD flow message: {}", report.message),
                )?;
                Ok(Vec::new())
            }
        }
    }
}

async fn ensure_valid_user(ctx: &ScenarioContext) -> E2eResult<()> {
    ctx.service.ensure_user_exists(&ctx.fixture.valid_user).await?;
    Ok(())
}

fn visit_login_page(ctx: &ScenarioContext) -> E2eResult<LoginPage> {
    let browser = ctx.browser.as_ref().ok_or(E2eError::PlaywrightNotFound)?;
    let mut page = LoginPage::new(ctx.fixture.clone())
        .with_page_load_timeout(browser.config().page_load_timeout_ms);
    page.visit()?;
    page.validate_page_loaded()?;
    Ok(page)
}

async fn run_page(
    ctx: &ScenarioContext,
    session: &str,
    steps: Vec<TestStep>,
) -> E2eResult<Vec<StepResult>> {
    let browser = ctx.browser.as_ref().ok_or(E2eError::PlaywrightNotFound)?;
    let run = browser.run_steps(session, &steps).await?;
    if run.success {
        Ok(run.steps)
    } else {
        let failed = run
            .steps
            .iter()
            .find(|s| !s.success)
            .map(|s| s.step_name.clone())
            .unwrap_or_else(|| session.to_string());
        Err(E2eError::StepFailed {
            step: failed,
            reason: run.error.unwrap_or_else(|| "browser session failed".to_string()),
        })
    }
}

async fn login_valid_user(ctx: &ScenarioContext) -> E2eResult<Vec<StepResult>> {
    ensure_valid_user(ctx).await?;

    // The API must accept the same credentials the UI is about to use.
    ctx.service
        .client()
        .login(&ctx.fixture.valid_user.credentials())
        .await?;

    let mut page = visit_login_page(ctx)?;
    page.login_valid_user()?;
    page.expect_redirected()?;
    run_page(ctx, Scenario::LoginValidUser.name(), page.into_steps()).await
}

async fn login_invalid_user(ctx: &ScenarioContext) -> E2eResult<Vec<StepResult>> {
    ctx.service
        .ensure_user_absent(&ctx.fixture.invalid_user.email)
        .await?;

    let mut page = visit_login_page(ctx)?;
    page.login_invalid_user()?;
    page.check_login_error(INVALID_CREDENTIALS_MESSAGE)?;
    run_page(ctx, Scenario::LoginInvalidUser.name(), page.into_steps()).await
}

async fn register_user(service: &UserService) -> E2eResult<Vec<StepResult>> {
    let user = generate_unique_user("crud", true);
    let message = service.register_user(&user).await?;
    ensure(
        message.contains("sucesso"),
        format!("unexpected register message: {}", message),
    )?;
    ensure(
        service.check_user_exists(&user.email).await?,
        format!("{} was not found after registering", user.email),
    )?;
    Ok(Vec::new())
}

async fn list_users(ctx: &ScenarioContext) -> E2eResult<Vec<StepResult>> {
    let list: UserList = ctx
        .service
        .client()
        .authenticated_request(Method::GET, USERS_PATH, None, RequestOptions::new())
        .await?
        .expect_status(200, "list users")?
        .json()?;

    ensure(!list.is_empty(), "user listing is empty")?;
    ensure(
        list.find_by_email(&ctx.fixture.valid_user.email).is_some(),
        format!("{} missing from listing", ctx.fixture.valid_user.email),
    )?;
    Ok(Vec::new())
}

async fn update_valid_user(ctx: &ScenarioContext) -> E2eResult<Vec<StepResult>> {
    let client = ctx.service.client();
    let user_id = ctx
        .service
        .find_user_id_by_email(&ctx.fixture.valid_user.email)
        .await?;
    let updated = generate_updated_user(&ctx.fixture.valid_user, UPDATED_VALID_USER_NAME);

    client
        .authenticated_request(
            Method::PUT,
            &user_path(&user_id),
            Some(serde_json::to_value(&updated)?),
            RequestOptions::new(),
        )
        .await?
        .expect_status(200, "update valid user")?;

    let stored: StoredUser = client
        .authenticated_request(Method::GET, &user_path(&user_id), None, RequestOptions::new())
        .await?
        .expect_status(200, "read back valid user")?
        .json()?;

    ensure(
        stored.user.name == updated.name,
        format!("expected name '{}', found '{}'", updated.name, stored.user.name),
    )?;
    Ok(Vec::new())
}

async fn delete_user(service: &UserService) -> E2eResult<Vec<StepResult>> {
    let client = service.client();
    let user = generate_user_for_deletion(DELETION_PREFIX);

    client
        .authenticated_request(
            Method::POST,
            USERS_PATH,
            Some(serde_json::to_value(&user)?),
            RequestOptions::new(),
        )
        .await?;

    let user_id = service.find_user_id_by_email(&user.email).await?;
    client
        .authenticated_request(Method::DELETE, &user_path(&user_id), None, RequestOptions::new())
        .await?
        .expect_status(200, "delete user")?;

    ensure(
        !service.check_user_exists(&user.email).await?,
        format!("{} still exists after delete", user.email),
    )?;
    Ok(Vec::new())
}
