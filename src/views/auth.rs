//! Login and registration forms
//!
//! Login exchanges username/password for a server-issued credential and
//! role, then starts the session. Registration only creates the account;
//! the user logs in afterwards.

use crate::api::{ApiError, VitalsApi};
use crate::session::{Credential, Role, SessionError, SessionStore};

use super::{Notifier, Route};

pub const REGISTER_SUCCESS: &str = "User registered successfully! You can now log in.";
pub const REGISTER_FALLBACK: &str = "Registration failed";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Could not save session: {0}")]
    Session(#[from] SessionError),
}

fn require(value: &str, field: &'static str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Authenticate and start a session; returns the role and landing route
    pub async fn submit(
        &self,
        api: &dyn VitalsApi,
        session: &SessionStore,
    ) -> Result<(Role, Route), AuthError> {
        require(&self.username, "Username")?;
        require(&self.password, "Password")?;

        let resp = api
            .login(self.username.trim(), &self.password)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized => AuthError::InvalidCredentials,
                other => other.into(),
            })?;

        session.login(Credential::new(resp.access_token), resp.role)?;
        Ok((resp.role, Route::Dashboard))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    /// Inline error shown above the form
    pub error: Option<String>,
}

impl RegisterForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            error: None,
        }
    }

    /// Create the account; on success control returns to the login view
    pub async fn submit(&mut self, api: &dyn VitalsApi, notifier: &Notifier) -> Result<Route, AuthError> {
        require(&self.username, "Username")?;
        require(&self.password, "Password")?;

        match api.register(self.username.trim(), &self.password).await {
            Ok(()) => {
                self.error = None;
                notifier.success(REGISTER_SUCCESS);
                tracing::info!(username = %self.username.trim(), "Registered account");
                Ok(Route::Login)
            }
            Err(e) => {
                let message = e.server_message().unwrap_or(REGISTER_FALLBACK).to_string();
                self.error = Some(message.clone());
                Err(AuthError::Rejected(message))
            }
        }
    }
}
