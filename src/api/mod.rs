mod auth;
mod error;
mod settings;

use axum::Router;
use std::sync::Arc;

use crate::auth::{CookiePolicy, IdentityProvider, RoutePolicy};
use crate::rate_limit::RateLimitConfig;

pub use error::FormError;
pub use settings::{MIN_PASSWORD_LENGTH, SETTINGS_PATH};

/// Create the API router.
pub fn create_api_router(
    provider: Arc<dyn IdentityProvider>,
    cookie_policy: CookiePolicy,
    routes: Arc<RoutePolicy>,
    rate_limits: Arc<RateLimitConfig>,
) -> Router {
    let auth_state = auth::AuthApiState {
        provider: provider.clone(),
        cookie_policy,
        routes: routes.clone(),
    };

    let settings_state = settings::SettingsState {
        provider,
        cookie_policy,
        routes,
    };

    Router::new()
        .nest("/auth", auth::router(auth_state, rate_limits))
        .nest("/settings", settings::router(settings_state))
}
