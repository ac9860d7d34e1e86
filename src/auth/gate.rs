//! Request gate: authenticated unless public.
//!
//! Every request is classified before any session work happens. Public pages
//! and static assets pass straight through; everything else needs a session
//! or is redirected to the login page.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::cookie::{CookiePolicy, SessionCookies};
use super::errors::LoginRedirect;
use super::provider::IdentityProvider;
use super::resolver::resolve_session;
use super::types::RequestContext;

/// Login page path.
pub const LOGIN_PATH: &str = "/login";

/// Login form submission endpoint.
pub const LOGIN_SUBMIT_PATH: &str = "/api/auth/login";

/// Prefix under which built static assets are served.
pub const ASSET_PREFIX: &str = "/_assets";

/// How the gate treats a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    StaticAsset,
    Protected,
}

/// Route classification rules.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    /// Path prefixes reachable without a session
    pub public_prefixes: Vec<String>,
    /// Prefix of the static asset directory
    pub asset_prefix: String,
    /// Redirect target for requests without a session
    pub login_path: String,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            public_prefixes: vec![LOGIN_PATH.to_string(), LOGIN_SUBMIT_PATH.to_string()],
            asset_prefix: ASSET_PREFIX.to_string(),
            login_path: LOGIN_PATH.to_string(),
        }
    }
}

impl RoutePolicy {
    /// Classify a request path. Public prefixes win over the asset rules, and
    /// anything containing a `.` is treated as a file.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self
            .public_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return RouteClass::Public;
        }

        if path.starts_with(self.asset_prefix.as_str()) || path.contains('.') {
            return RouteClass::StaticAsset;
        }

        RouteClass::Protected
    }
}

/// State for the gate middleware.
#[derive(Clone)]
pub struct GateState {
    pub provider: Arc<dyn IdentityProvider>,
    pub cookie_policy: CookiePolicy,
    pub routes: Arc<RoutePolicy>,
}

/// Middleware enforcing the route policy.
///
/// On a protected route the resolved session is attached as a
/// `RequestContext` extension. Cookies rotated by a refresh are added to the
/// response unless the handler set those cookies itself.
pub async fn require_session(
    State(state): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    let class = state.routes.classify(request.uri().path());
    match class {
        RouteClass::Public | RouteClass::StaticAsset => return next.run(request).await,
        RouteClass::Protected => {}
    }

    let mut cookies = SessionCookies::from_headers(request.headers(), state.cookie_policy);
    let resolved = match resolve_session(state.provider.as_ref(), &mut cookies).await {
        Ok(resolved) => resolved,
        Err(e) => {
            debug!(path = %request.uri().path(), reason = %e, "No session, redirecting to login");
            return LoginRedirect::new(&state.routes.login_path).into_response();
        }
    };

    request
        .extensions_mut()
        .insert(RequestContext::from(resolved.into_session()));

    let mut response = next.run(request).await;
    cookies.merge_into(response.headers_mut());
    response
}
