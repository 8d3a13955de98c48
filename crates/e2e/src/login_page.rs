//! Login page driver
//!
//! Records the browser steps for one visit to `/login`. The page moves
//! `Unvisited -> Loaded -> Submitted`; calling an action out of order fails
//! with `InvalidStateTransition` before anything reaches the browser.

use std::fmt;

use serverest_common::UsersFixture;

use crate::error::{E2eError, E2eResult};
use crate::spec::TestStep;

pub const LOGIN_PATH: &str = "/login";
pub const EMAIL_INPUT: &str = r#"input[type="email"]"#;
pub const PASSWORD_INPUT: &str = r#"input[type="password"]"#;
pub const LOGIN_BUTTON: &str = r#"button[type="submit"]"#;
pub const ERROR_ALERT: &str = ".alert span";

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Email e/ou senha inválidos";
pub const EMAIL_REQUIRED_MESSAGE: &str = "Email é obrigatório";
pub const PASSWORD_REQUIRED_MESSAGE: &str = "Password é obrigatório";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Unvisited,
    Loaded,
    Submitted,
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PageState::Unvisited => "unvisited",
            PageState::Loaded => "loaded",
            PageState::Submitted => "submitted",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct LoginPage {
    fixture: UsersFixture,
    state: PageState,
    steps: Vec<TestStep>,
    page_load_timeout_ms: Option<u64>,
}

impl LoginPage {
    pub fn new(fixture: UsersFixture) -> Self {
        Self {
            fixture,
            state: PageState::Unvisited,
            steps: Vec::new(),
            page_load_timeout_ms: None,
        }
    }

    /// Override the navigation timeout for `visit`
    pub fn with_page_load_timeout(mut self, timeout_ms: u64) -> Self {
        self.page_load_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn steps(&self) -> &[TestStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<TestStep> {
        self.steps
    }

    /// Navigate to `/login` and wait for the form to render
    pub fn visit(&mut self) -> E2eResult<()> {
        // `None` uses the suite page-load timeout (60 s), not the 30 s
        // command timeout the other steps wait on.
        self.steps.push(TestStep::Navigate {
            url: LOGIN_PATH.to_string(),
            timeout_ms: self.page_load_timeout_ms,
        });
        self.steps.push(url_contains(LOGIN_PATH));
        for selector in [EMAIL_INPUT, PASSWORD_INPUT, LOGIN_BUTTON] {
            self.steps.push(TestStep::Assert {
                selector: selector.to_string(),
                visible: Some(true),
                enabled: None,
                text_contains: None,
            });
        }
        self.state = PageState::Loaded;
        Ok(())
    }

    /// Every form element is visible and enabled
    pub fn validate_page_loaded(&mut self) -> E2eResult<()> {
        self.require(PageState::Loaded, "validate the page")?;
        self.steps.push(url_contains(LOGIN_PATH));
        for selector in [EMAIL_INPUT, PASSWORD_INPUT, LOGIN_BUTTON] {
            self.steps.push(TestStep::Assert {
                selector: selector.to_string(),
                visible: Some(true),
                enabled: Some(true),
                text_contains: None,
            });
        }
        self.steps.push(TestStep::Log {
            message: "Login page loaded and elements validated".to_string(),
        });
        Ok(())
    }

    pub fn fill_email(&mut self, email: &str) -> E2eResult<()> {
        self.require(PageState::Loaded, "fill the email")?;
        self.fill(EMAIL_INPUT, email);
        Ok(())
    }

    pub fn fill_password(&mut self, password: &str) -> E2eResult<()> {
        self.require(PageState::Loaded, "fill the password")?;
        self.fill(PASSWORD_INPUT, password);
        Ok(())
    }

    pub fn click_login_button(&mut self) -> E2eResult<()> {
        self.require(PageState::Loaded, "submit the form")?;
        self.steps.push(TestStep::Click {
            selector: LOGIN_BUTTON.to_string(),
            timeout_ms: None,
        });
        self.state = PageState::Submitted;
        Ok(())
    }

    pub fn login(&mut self, email: &str, password: &str) -> E2eResult<()> {
        self.fill_email(email)?;
        self.fill_password(password)?;
        self.click_login_button()
    }

    pub fn login_valid_user(&mut self) -> E2eResult<()> {
        let user = self.fixture.valid_user.clone();
        self.login(&user.email, &user.password)
    }

    pub fn login_invalid_user(&mut self) -> E2eResult<()> {
        let user = self.fixture.invalid_user.clone();
        self.login(&user.email, &user.password)
    }

    pub fn login_empty_email(&mut self) -> E2eResult<()> {
        let password = self.fixture.valid_user.password.clone();
        self.login("", &password)
    }

    pub fn login_empty_password(&mut self) -> E2eResult<()> {
        let email = self.fixture.valid_user.email.clone();
        self.login(&email, "")
    }

    /// Still on `/login` with `message` shown in the alert
    pub fn check_login_error(&mut self, message: &str) -> E2eResult<()> {
        self.require(PageState::Submitted, "check the login error")?;
        self.steps.push(url_contains(LOGIN_PATH));
        self.steps.push(TestStep::Assert {
            selector: ERROR_ALERT.to_string(),
            visible: Some(true),
            enabled: None,
            text_contains: Some(message.to_string()),
        });
        Ok(())
    }

    /// Navigation left `/login`
    pub fn expect_redirected(&mut self) -> E2eResult<()> {
        self.require(PageState::Submitted, "check the redirect")?;
        self.steps.push(TestStep::AssertUrl {
            contains: None,
            not_contains: Some(LOGIN_PATH.to_string()),
        });
        Ok(())
    }

    /// Clear the field, then type only a non-empty value
    fn fill(&mut self, selector: &str, value: &str) {
        self.steps.push(TestStep::Clear {
            selector: selector.to_string(),
        });
        if !value.is_empty() {
            self.steps.push(TestStep::Type {
                selector: selector.to_string(),
                text: value.to_string(),
                delay_ms: None,
            });
        }
    }

    fn require(&self, expected: PageState, action: &str) -> E2eResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(E2eError::InvalidStateTransition {
                from: self.state.to_string(),
                to: action.to_string(),
            })
        }
    }
}

fn url_contains(fragment: &str) -> TestStep {
    TestStep::AssertUrl {
        contains: Some(fragment.to_string()),
        not_contains: None,
    }
}
