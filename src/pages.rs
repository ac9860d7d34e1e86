//! The few server-rendered pages the auth flow routes to.
//!
//! - GET `/login` - Sign-in form (public)
//! - GET `/` - Signed-in landing page
//! - GET `/settings` - Password and email forms

use std::sync::Arc;

use axum::{
    Router,
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;

use crate::api::{MIN_PASSWORD_LENGTH, SETTINGS_PATH};
use crate::auth::{CurrentSession, LOGIN_SUBMIT_PATH, RoutePolicy};
use crate::impl_has_auth_backend;

#[derive(Clone)]
pub struct PagesState {
    pub routes: Arc<RoutePolicy>,
}

impl_has_auth_backend!(PagesState);

pub fn router(state: PagesState) -> Router {
    let login_path = state.routes.login_path.clone();
    Router::new()
        .route("/", get(home))
        .route(&login_path, get(login_page))
        .route(SETTINGS_PATH, get(settings_page))
        .with_state(state)
}

/// Status codes carried back to a page in its query string.
#[derive(Deserialize)]
struct PageQuery {
    error: Option<String>,
    success: Option<String>,
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{} - Assetkeep</title></head>\n<body>\n{}\n</body>\n</html>\n",
        title, body
    ))
}

fn login_error_message(code: &str) -> Option<&'static str> {
    match code {
        "missing_fields" => Some("Please enter your email and password."),
        "invalid_credentials" => Some("Invalid email or password."),
        _ => None,
    }
}

fn settings_message(query: &PageQuery) -> Option<&'static str> {
    if let Some(code) = query.error.as_deref() {
        return match code {
            "validation" => Some("Please fill in all fields."),
            "password_mismatch" => Some("Passwords do not match."),
            "password_short" => Some("Password must be at least 6 characters."),
            "server" => Some("Something went wrong. Please try again."),
            _ => None,
        };
    }
    match query.success.as_deref() {
        Some("password") => Some("Password updated."),
        Some("email") => Some("Check your inbox to confirm the new email address."),
        _ => None,
    }
}

async fn login_page(Query(query): Query<PageQuery>) -> Html<String> {
    let message = query
        .error
        .as_deref()
        .and_then(login_error_message)
        .map(|m| format!("<p class=\"error\">{}</p>", m))
        .unwrap_or_default();

    layout(
        "Sign in",
        &format!(
            "<h1>Sign in</h1>\n{}\n<form method=\"post\" action=\"{}\">\n<input type=\"email\" name=\"email\" required>\n<input type=\"password\" name=\"password\" required>\n<button type=\"submit\">Sign in</button>\n</form>",
            message, LOGIN_SUBMIT_PATH
        ),
    )
}

async fn home(CurrentSession(context): CurrentSession) -> Html<String> {
    let who = context.user.email.as_deref().unwrap_or(&context.user.id);
    layout(
        "Home",
        &format!(
            "<h1>Signed in as {}</h1>\n<form method=\"post\" action=\"/api/auth/logout\"><button type=\"submit\">Sign out</button></form>",
            escape_html(who)
        ),
    )
}

async fn settings_page(
    CurrentSession(_context): CurrentSession,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let message = settings_message(&query)
        .map(|m| format!("<p>{}</p>", m))
        .unwrap_or_default();

    layout(
        "Settings",
        &format!(
            "<h1>Settings</h1>\n{}\n<form method=\"post\" action=\"/api/settings/password\">\n<input type=\"password\" name=\"new_password\" minlength=\"{}\" required>\n<input type=\"password\" name=\"confirm_password\" minlength=\"{}\" required>\n<button type=\"submit\">Change password</button>\n</form>\n<form method=\"post\" action=\"/api/settings/email\">\n<input type=\"email\" name=\"email\" required>\n<button type=\"submit\">Change email</button>\n</form>",
            message, MIN_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH
        ),
    )
}

/// Fallback for unknown paths. Runs behind the gate like any other route.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
