//! Sign-in and sign-out endpoints.
//!
//! - POST `/login` - Password sign-in, writes the session cookies (public)
//! - POST `/logout` - Revoke the session at the provider and clear cookies

use std::sync::Arc;

use axum::{
    Form, Router,
    extract::State,
    http::HeaderMap,
    middleware,
    response::{IntoResponse, Redirect},
    routing::post,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::error::{FormError, non_empty};
use crate::auth::{CookiePolicy, CurrentSession, IdentityProvider, RoutePolicy, SessionCookies};
use crate::impl_has_auth_backend;
use crate::rate_limit::{RateLimitConfig, rate_limit_login};

/// Where a successful sign-in lands.
const HOME_PATH: &str = "/";

#[derive(Clone)]
pub struct AuthApiState {
    pub provider: Arc<dyn IdentityProvider>,
    pub cookie_policy: CookiePolicy,
    pub routes: Arc<RoutePolicy>,
}

impl_has_auth_backend!(AuthApiState);

pub fn router(state: AuthApiState, rate_limits: Arc<RateLimitConfig>) -> Router {
    Router::new()
        .route(
            "/login",
            post(login).route_layer(middleware::from_fn_with_state(
                rate_limits,
                rate_limit_login,
            )),
        )
        .route("/logout", post(logout))
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginForm {
    email: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<AuthApiState>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, FormError> {
    let login_page = state.routes.login_path.as_str();

    let (Some(email), Some(password)) = (non_empty(form.email), non_empty(form.password)) else {
        return Err(FormError::new(login_page, "missing_fields"));
    };

    let session = match state.provider.sign_in_with_password(&email, &password).await {
        Ok(session) => session,
        Err(e) if e.is_client_rejection() => {
            warn!(error = %e, "Sign-in rejected");
            None
        }
        Err(e) => {
            error!(error = %e, "Sign-in failed");
            None
        }
    }
    .ok_or_else(|| FormError::new(login_page, "invalid_credentials"))?;

    let mut cookies = SessionCookies::empty(state.cookie_policy);
    cookies.write_tokens(&session.access_token, &session.refresh_token);
    info!(user_id = %session.user.id, "Signed in");

    Ok((cookies, Redirect::to(HOME_PATH)))
}

/// Sign out. A provider failure is logged but never blocks clearing the
/// cookies locally.
async fn logout(
    State(state): State<AuthApiState>,
    CurrentSession(context): CurrentSession,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(e) = state.provider.sign_out(&context.session.access_token).await {
        warn!(user_id = %context.user.id, error = %e, "Provider sign-out failed");
    } else {
        info!(user_id = %context.user.id, "Signed out");
    }

    let mut cookies = SessionCookies::from_headers(&headers, state.cookie_policy);
    cookies.clear_tokens();

    (cookies, Redirect::to(&state.routes.login_path))
}
