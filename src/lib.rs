pub mod api;
pub mod auth;
pub mod cli;
pub mod gotrue;
pub mod pages;
pub mod rate_limit;

use api::create_api_router;
use auth::{CookiePolicy, GateState, IdentityProvider, RoutePolicy, require_session};
use axum::{Router, middleware};
use cli::ClientIpHeader;
use pages::{PagesState, not_found};
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Identity provider client, shared by every request
    pub provider: Arc<dyn IdentityProvider>,
    /// Whether to set Secure flag on cookies (production deployments)
    pub secure_cookies: bool,
    /// Public/protected route classification
    pub routes: RoutePolicy,
    /// Header carrying the client IP (requires running behind a proxy)
    pub ip_header: Option<ClientIpHeader>,
}

/// Create the application router with the given configuration.
///
/// Every route, including the fallback, sits behind the request gate.
pub fn create_app(config: &ServerConfig) -> Router {
    let cookie_policy = CookiePolicy::new(config.secure_cookies);
    let routes = Arc::new(config.routes.clone());
    let rate_limits = Arc::new(RateLimitConfig::new(config.ip_header));

    let api_router = create_api_router(
        config.provider.clone(),
        cookie_policy,
        routes.clone(),
        rate_limits,
    );

    let pages_router = pages::router(PagesState { routes: routes.clone() });

    let gate = GateState {
        provider: config.provider.clone(),
        cookie_policy,
        routes,
    };

    Router::new()
        .nest("/api", api_router)
        .merge(pages_router)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(gate, require_session))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
