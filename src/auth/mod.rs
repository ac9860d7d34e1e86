//! Cookie-based session authentication.
//!
//! The session is a pair of opaque provider tokens held in two cookies. The
//! request gate resolves it on every protected request, refreshing once
//! through the identity provider when the access token has gone stale.

mod cookie;
mod errors;
mod extractors;
mod gate;
mod ip;
mod provider;
mod resolver;
mod state;
mod types;

pub use cookie::{
    ACCESS_COOKIE_NAME, COOKIE_MAX_AGE_SECS, CookiePolicy, REFRESH_COOKIE_NAME, SessionCookies,
    TokenPair, get_cookie,
};
pub use errors::LoginRedirect;
pub use extractors::CurrentSession;
pub use gate::{
    ASSET_PREFIX, GateState, LOGIN_PATH, LOGIN_SUBMIT_PATH, RouteClass, RoutePolicy,
    require_session,
};
pub use ip::{HasHeadersAndExtensions, extract_client_ip};
pub use provider::{
    IdentityProvider, ProviderError, ProviderResult, Session, User, UserUpdate,
};
pub use resolver::{ResolveError, Resolved, resolve_session};
pub use state::HasAuthBackend;
pub use types::RequestContext;
