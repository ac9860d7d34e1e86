//! Authentication rejections.

use axum::response::{IntoResponse, Redirect, Response};

/// Redirect to the login page. Cookies are left untouched so an explicit
/// sign-in or sign-out decides what happens to them.
///
/// Answers 303 so a rejected form POST lands on the login page as a GET.
#[derive(Debug)]
pub struct LoginRedirect {
    pub login_path: String,
}

impl LoginRedirect {
    pub fn new(login_path: &str) -> Self {
        Self {
            login_path: login_path.to_string(),
        }
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.login_path).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, header};

    #[test]
    fn test_login_redirect_switches_to_get() {
        let response = LoginRedirect::new("/login").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }
}
