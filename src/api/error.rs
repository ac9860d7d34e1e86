//! Shared error handling for form endpoints.
//!
//! Form handlers never answer with an error body. Every failure becomes a
//! redirect back to the page the form lives on, with an `error` code the page
//! knows how to display.

use axum::response::{IntoResponse, Redirect, Response};
use tracing::error;

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    /// Log the error under `context` and turn it into `redirect`.
    fn or_redirect(self, context: &str, redirect: FormError) -> Result<T, FormError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn or_redirect(self, context: &str, redirect: FormError) -> Result<T, FormError> {
        self.map_err(|e| {
            error!(error = %e, "{}", context);
            redirect
        })
    }
}

/// Redirect back to a form page with an error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    location: String,
}

impl FormError {
    pub fn new(page: &str, code: &str) -> Self {
        Self {
            location: format!("{}?error={}", page, code),
        }
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        Redirect::to(&self.location).into_response()
    }
}

/// Redirect to a page with a success code.
pub fn success_redirect(page: &str, code: &str) -> Redirect {
    Redirect::to(&format!("{}?success={}", page, code))
}

/// Treat a missing or empty form field as absent.
pub fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}
