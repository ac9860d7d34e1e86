//! Account settings form endpoints.
//!
//! - POST `/password` - Change the signed-in user's password
//! - POST `/email` - Change the signed-in user's email address

use std::sync::Arc;

use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect},
    routing::post,
};
use serde::Deserialize;
use tracing::info;

use super::error::{FormError, ResultExt, non_empty, success_redirect};
use crate::auth::{
    CookiePolicy, CurrentSession, IdentityProvider, RoutePolicy, UserUpdate,
};
use crate::impl_has_auth_backend;

/// Page the settings forms live on.
pub const SETTINGS_PATH: &str = "/settings";

/// Minimum accepted password length, in UTF-16 code units.
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Clone)]
pub struct SettingsState {
    pub provider: Arc<dyn IdentityProvider>,
    pub cookie_policy: CookiePolicy,
    pub routes: Arc<RoutePolicy>,
}

impl_has_auth_backend!(SettingsState);

pub fn router(state: SettingsState) -> Router {
    Router::new()
        .route("/password", post(update_password))
        .route("/email", post(update_email))
        .with_state(state)
}

#[derive(Deserialize)]
struct PasswordForm {
    new_password: Option<String>,
    confirm_password: Option<String>,
}

async fn update_password(
    State(state): State<SettingsState>,
    CurrentSession(context): CurrentSession,
    Form(form): Form<PasswordForm>,
) -> Result<Redirect, FormError> {
    let (Some(new_password), Some(confirm_password)) = (
        non_empty(form.new_password),
        non_empty(form.confirm_password),
    ) else {
        return Err(FormError::new(SETTINGS_PATH, "validation"));
    };

    if new_password != confirm_password {
        return Err(FormError::new(SETTINGS_PATH, "password_mismatch"));
    }

    // Counted in UTF-16 code units, as the browser's `minlength` does.
    if new_password.encode_utf16().count() < MIN_PASSWORD_LENGTH {
        return Err(FormError::new(SETTINGS_PATH, "password_short"));
    }

    state
        .provider
        .update_user(
            &context.session.access_token,
            &UserUpdate::password(new_password),
        )
        .await
        .or_redirect(
            "Password update failed",
            FormError::new(SETTINGS_PATH, "server"),
        )?;

    info!(user_id = %context.user.id, "Password updated");
    Ok(success_redirect(SETTINGS_PATH, "password"))
}

#[derive(Deserialize)]
struct EmailForm {
    email: Option<String>,
}

async fn update_email(
    State(state): State<SettingsState>,
    CurrentSession(context): CurrentSession,
    Form(form): Form<EmailForm>,
) -> Result<impl IntoResponse, FormError> {
    let email = non_empty(form.email.map(|e| e.trim().to_string()))
        .filter(|e| e.contains('@'))
        .ok_or_else(|| FormError::new(SETTINGS_PATH, "validation"))?;

    state
        .provider
        .update_user(&context.session.access_token, &UserUpdate::email(email))
        .await
        .or_redirect("Email update failed", FormError::new(SETTINGS_PATH, "server"))?;

    info!(user_id = %context.user.id, "Email change requested");
    Ok(success_redirect(SETTINGS_PATH, "email"))
}
