//! Identity provider boundary.
//!
//! Token validation, refresh, and credential checks all happen at the hosted
//! identity provider. The application only ever sees opaque token strings and
//! the user record the provider hands back.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// User record returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Provider-assigned user ID
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A validated session: a user plus the token pair that currently proves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Fields to change on the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserUpdate {
    pub fn password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            ..Default::default()
        }
    }

    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }
}

/// Failure reported by (or while talking to) the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    Rejected { status: u16, message: String },
    /// The provider could not be reached or did not answer in time.
    Transport(String),
    /// The provider answered with a body we could not understand.
    Decode(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Rejected { status, message } => {
                write!(f, "identity provider rejected request ({status}): {message}")
            }
            ProviderError::Transport(msg) => write!(f, "identity provider unreachable: {msg}"),
            ProviderError::Decode(msg) => write!(f, "unexpected identity provider response: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// The provider refused the request itself (4xx), as opposed to failing
    /// to answer it.
    pub fn is_client_rejection(&self) -> bool {
        matches!(self, ProviderError::Rejected { status, .. } if (400..500).contains(status))
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Operations the application consumes from the identity provider.
///
/// Constructed once at startup and shared as `Arc<dyn IdentityProvider>`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Establish a session from an existing token pair.
    /// Fails when the access token is expired or otherwise invalid.
    async fn set_session(&self, access_token: &str, refresh_token: &str)
    -> ProviderResult<Session>;

    /// Mint a new token pair from a refresh token.
    async fn refresh_session(&self, refresh_token: &str) -> ProviderResult<Option<Session>>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> ProviderResult<Option<Session>>;

    /// Revoke the session the access token belongs to.
    async fn sign_out(&self, access_token: &str) -> ProviderResult<()>;

    /// Update the user the access token belongs to.
    async fn update_user(&self, access_token: &str, update: &UserUpdate) -> ProviderResult<User>;
}
