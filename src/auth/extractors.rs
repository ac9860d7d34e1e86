//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::LoginRedirect;
use super::state::HasAuthBackend;
use super::types::RequestContext;

/// Extractor for handlers behind the request gate.
///
/// Reads the `RequestContext` the gate attached. If it is missing (the route
/// was not classified as protected) the request is sent to the login page.
pub struct CurrentSession(pub RequestContext);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(|| LoginRedirect::new(state.login_path()))
    }
}
