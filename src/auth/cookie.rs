//! Cookie codec for the two-cookie session representation.
//!
//! A session lives on the client as exactly two cookies. Both are written with
//! the same attributes and lifetime, and a request that carries only one of
//! them is treated as carrying no session at all.

use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponseParts, ResponseParts};
use tracing::warn;

/// Cookie name for the access token (short-lived bearer credential).
pub const ACCESS_COOKIE_NAME: &str = "access-token";

/// Cookie name for the refresh token (long-lived rotation credential).
pub const REFRESH_COOKIE_NAME: &str = "refresh-token";

/// Lifetime of both session cookies: 7 days.
pub const COOKIE_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = value.to_str() else {
            continue;
        };
        for part in cookie_header.split(';') {
            let part = part.trim();
            if let Some((key, value)) = part.split_once('=') {
                if key.trim() == name {
                    return Some(value.trim());
                }
            }
        }
    }
    None
}

/// Attributes shared by every session cookie we write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CookiePolicy {
    /// Add the `Secure` attribute (production deployments only).
    pub secure: bool,
}

impl CookiePolicy {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    fn secure_suffix(&self) -> &'static str {
        if self.secure { "; Secure" } else { "" }
    }

    /// `Set-Cookie` value that stores `value` under `name`.
    pub fn set_cookie(&self, name: &str, value: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
            name,
            value,
            COOKIE_MAX_AGE_SECS,
            self.secure_suffix()
        )
    }

    /// `Set-Cookie` value that deletes `name` under the root path.
    pub fn removal_cookie(&self, name: &str) -> String {
        format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{}",
            name,
            self.secure_suffix()
        )
    }
}

/// The access/refresh pair as read from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Per-request view of the session cookies.
///
/// Reads reflect the incoming `Cookie` header overlaid with any writes made
/// during the request. Writes are queued as `Set-Cookie` values, at most one
/// per cookie name, and only reach the client once the cookies are attached
/// to a response.
#[derive(Debug, Clone)]
pub struct SessionCookies {
    policy: CookiePolicy,
    access: Option<String>,
    refresh: Option<String>,
    pending: Vec<(&'static str, String)>,
}

impl SessionCookies {
    pub fn from_headers(headers: &HeaderMap, policy: CookiePolicy) -> Self {
        let read = |name: &str| {
            get_cookie(headers, name)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            policy,
            access: read(ACCESS_COOKIE_NAME),
            refresh: read(REFRESH_COOKIE_NAME),
            pending: Vec::new(),
        }
    }

    /// Empty cookie state, for handlers that only write.
    pub fn empty(policy: CookiePolicy) -> Self {
        Self {
            policy,
            access: None,
            refresh: None,
            pending: Vec::new(),
        }
    }

    /// Both tokens, or `None` if either cookie is missing.
    pub fn read_tokens(&self) -> Option<TokenPair> {
        match (&self.access, &self.refresh) {
            (Some(access), Some(refresh)) => Some(TokenPair {
                access: access.clone(),
                refresh: refresh.clone(),
            }),
            _ => None,
        }
    }

    pub fn write_tokens(&mut self, access: &str, refresh: &str) {
        let access_cookie = self.policy.set_cookie(ACCESS_COOKIE_NAME, access);
        let refresh_cookie = self.policy.set_cookie(REFRESH_COOKIE_NAME, refresh);
        self.queue(ACCESS_COOKIE_NAME, access_cookie);
        self.queue(REFRESH_COOKIE_NAME, refresh_cookie);
        self.access = Some(access.to_string());
        self.refresh = Some(refresh.to_string());
    }

    /// Delete both cookies. Clearing already-absent cookies is a no-op beyond
    /// re-queuing the same removal.
    pub fn clear_tokens(&mut self) {
        let access_cookie = self.policy.removal_cookie(ACCESS_COOKIE_NAME);
        let refresh_cookie = self.policy.removal_cookie(REFRESH_COOKIE_NAME);
        self.queue(ACCESS_COOKIE_NAME, access_cookie);
        self.queue(REFRESH_COOKIE_NAME, refresh_cookie);
        self.access = None;
        self.refresh = None;
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Queued `Set-Cookie` values, in write order.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(|(_, value)| value.as_str())
    }

    fn queue(&mut self, name: &'static str, value: String) {
        match self.pending.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.pending.push((name, value)),
        }
    }

    /// Append queued writes to a response, skipping any cookie the response
    /// already sets itself.
    pub fn merge_into(self, headers: &mut HeaderMap) {
        let already_set: Vec<String> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split_once('=').map(|(name, _)| name.trim().to_string()))
            .collect();

        for (name, value) in self.pending {
            if already_set.iter().any(|n| n == name) {
                continue;
            }
            append_set_cookie(headers, name, &value);
        }
    }
}

fn append_set_cookie(headers: &mut HeaderMap, name: &str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(_) => warn!(cookie = name, "Dropping cookie with invalid header characters"),
    }
}

impl IntoResponseParts for SessionCookies {
    type Error = std::convert::Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for (name, value) in &self.pending {
            append_set_cookie(res.headers_mut(), name, value);
        }
        Ok(res)
    }
}
