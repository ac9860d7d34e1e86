//! Session resolution from the cookie pair.
//!
//! One round-trip when the access token is still good, two when it has to be
//! refreshed. A successful refresh rotates both cookies; no other branch
//! touches them.

use std::fmt;

use tracing::debug;

use super::cookie::SessionCookies;
use super::provider::{IdentityProvider, ProviderError, Session};

/// A session that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// The cookie pair was accepted as-is.
    Current(Session),
    /// The access token was stale; the session was refreshed and the cookies
    /// rewritten.
    Refreshed(Session),
}

impl Resolved {
    pub fn session(&self) -> &Session {
        match self {
            Resolved::Current(session) | Resolved::Refreshed(session) => session,
        }
    }

    pub fn into_session(self) -> Session {
        match self {
            Resolved::Current(session) | Resolved::Refreshed(session) => session,
        }
    }

    pub fn was_refreshed(&self) -> bool {
        matches!(self, Resolved::Refreshed(_))
    }
}

/// Why no session could be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// One or both cookies are missing. No provider call was made.
    MissingCredentials,
    /// The access token was rejected and the refresh attempt failed.
    RefreshFailed(ProviderError),
    /// The refresh attempt succeeded but returned no session.
    NoSession,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::MissingCredentials => write!(f, "no session cookies"),
            ResolveError::RefreshFailed(e) => write!(f, "session refresh failed: {e}"),
            ResolveError::NoSession => write!(f, "session refresh returned no session"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Turn the request's cookie pair into a validated session.
///
/// Never clears cookies: on a terminal failure the stale pair is left in
/// place and the next request fails the same way until the user signs in or
/// out explicitly.
pub async fn resolve_session(
    provider: &dyn IdentityProvider,
    cookies: &mut SessionCookies,
) -> Result<Resolved, ResolveError> {
    let tokens = cookies
        .read_tokens()
        .ok_or(ResolveError::MissingCredentials)?;

    match provider.set_session(&tokens.access, &tokens.refresh).await {
        Ok(session) => return Ok(Resolved::Current(session)),
        Err(e) => debug!(error = %e, "Access token rejected, attempting refresh"),
    }

    let session = provider
        .refresh_session(&tokens.refresh)
        .await
        .map_err(|e| {
            debug!(error = %e, "Session refresh failed");
            ResolveError::RefreshFailed(e)
        })?
        .ok_or(ResolveError::NoSession)?;

    cookies.write_tokens(&session.access_token, &session.refresh_token);
    debug!(user_id = %session.user.id, "Session refreshed");

    Ok(Resolved::Refreshed(session))
}
