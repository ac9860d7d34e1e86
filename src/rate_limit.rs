//! Rate limiting for the sign-in endpoint.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password
//! guessing before it reaches the identity provider.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};
use tracing::warn;

use crate::auth::extract_client_ip;
use crate::cli::ClientIpHeader;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

const LOGIN_PER_SEC: NonZeroU32 = NonZeroU32::new(1).unwrap();
const LOGIN_BURST: NonZeroU32 = NonZeroU32::new(5).unwrap();

/// Rate limiting configuration for authentication endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter for sign-in submissions (5 requests, refilling 1 per second)
    pub login: Arc<IpLimiter>,
    /// How to find the client IP
    pub ip_header: Option<ClientIpHeader>,
}

impl RateLimitConfig {
    /// Create rate limiters with default configuration.
    pub fn new(ip_header: Option<ClientIpHeader>) -> Self {
        Self::with_login_quota(
            Quota::per_second(LOGIN_PER_SEC).allow_burst(LOGIN_BURST),
            ip_header,
        )
    }

    pub fn with_login_quota(quota: Quota, ip_header: Option<ClientIpHeader>) -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(quota)),
            ip_header,
        }
    }
}

/// Middleware for rate limiting sign-in submissions.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = match extract_client_ip(&request, config.ip_header) {
        Ok(ip) => ip,
        Err(reason) => {
            warn!(reason, "Rejecting sign-in without a client IP");
            return (StatusCode::FORBIDDEN, "Unable to determine client IP.").into_response();
        }
    };

    match config.login.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            warn!(ip = %ip, "Sign-in rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many sign-in attempts. Please wait before trying again.",
            )
                .into_response()
        }
    }
}
