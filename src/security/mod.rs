pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The signed-in dashboard user as reported by the auth service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthUser {
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}

/// Result of a password sign-in.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("too many attempts")]
    RateLimited,
    #[error("auth service unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Message shown on the login form.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::RateLimited => "Locked: wait 5 minutes.",
            _ => "Access denied.",
        }
    }
}

/// Password sign-in against the hosted auth service.
#[rocket::async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}
