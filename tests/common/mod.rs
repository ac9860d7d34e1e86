#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use assetkeep::auth::{
    IdentityProvider, ProviderError, ProviderResult, RoutePolicy, Session, User, UserUpdate,
};
use assetkeep::{ServerConfig, create_app};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response, header},
};

pub const TEST_IP: [u8; 4] = [127, 0, 0, 1];

/// A call made against the mock provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetSession(String),
    Refresh(String),
    SignIn(String),
    SignOut(String),
    UpdateUser(String),
}

struct Rotation {
    access: String,
    refresh: String,
    user: User,
}

struct Account {
    password: String,
    access: String,
    refresh: String,
    user: User,
}

#[derive(Default)]
struct MockState {
    /// access token -> user
    sessions: HashMap<String, User>,
    /// refresh token -> pair minted on refresh
    rotations: HashMap<String, Rotation>,
    /// email -> account
    accounts: HashMap<String, Account>,
    /// refresh tokens that succeed but return no session
    empty_refresh: Vec<String>,
    fail_sign_in: bool,
    fail_sign_out: bool,
    fail_update: bool,
    calls: Vec<Call>,
    updates: Vec<UserUpdate>,
}

/// In-memory identity provider that records every call.
#[derive(Default)]
pub struct MockProvider {
    state: Mutex<MockState>,
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: Some(format!("{}@example.com", id)),
    }
}

fn rejected(message: &str) -> ProviderError {
    ProviderError::Rejected {
        status: 401,
        message: message.to_string(),
    }
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Accept `access` as a live access token for `user_id`.
    pub fn with_access(self: &Arc<Self>, access: &str, user_id: &str) -> Arc<Self> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .insert(access.to_string(), user(user_id));
        self.clone()
    }

    /// Accept `refresh`, minting `new_access`/`new_refresh` for `user_id`.
    pub fn with_refresh(
        self: &Arc<Self>,
        refresh: &str,
        new_access: &str,
        new_refresh: &str,
        user_id: &str,
    ) -> Arc<Self> {
        self.state.lock().unwrap().rotations.insert(
            refresh.to_string(),
            Rotation {
                access: new_access.to_string(),
                refresh: new_refresh.to_string(),
                user: user(user_id),
            },
        );
        self.clone()
    }

    /// Make `refresh` succeed without returning a session.
    pub fn with_empty_refresh(self: &Arc<Self>, refresh: &str) -> Arc<Self> {
        self.state
            .lock()
            .unwrap()
            .empty_refresh
            .push(refresh.to_string());
        self.clone()
    }

    pub fn with_account(
        self: &Arc<Self>,
        email: &str,
        password: &str,
        access: &str,
        refresh: &str,
    ) -> Arc<Self> {
        let account_user = User {
            id: format!("id-{}", email),
            email: Some(email.to_string()),
        };
        let mut state = self.state.lock().unwrap();
        state
            .sessions
            .insert(access.to_string(), account_user.clone());
        state.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                access: access.to_string(),
                refresh: refresh.to_string(),
                user: account_user,
            },
        );
        drop(state);
        self.clone()
    }

    /// Make password sign-in fail as if the provider were unreachable.
    pub fn failing_sign_in(self: &Arc<Self>) -> Arc<Self> {
        self.state.lock().unwrap().fail_sign_in = true;
        self.clone()
    }

    pub fn failing_sign_out(self: &Arc<Self>) -> Arc<Self> {
        self.state.lock().unwrap().fail_sign_out = true;
        self.clone()
    }

    pub fn failing_update(self: &Arc<Self>) -> Arc<Self> {
        self.state.lock().unwrap().fail_update = true;
        self.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn updates(&self) -> Vec<UserUpdate> {
        self.state.lock().unwrap().updates.clone()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> ProviderResult<Session> {
        self.record(Call::SetSession(access_token.to_string()));
        let state = self.state.lock().unwrap();
        match state.sessions.get(access_token) {
            Some(user) => Ok(Session {
                access_token: access_token.to_string(),
                refresh_token: refresh_token.to_string(),
                user: user.clone(),
            }),
            None => Err(rejected("invalid JWT")),
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> ProviderResult<Option<Session>> {
        self.record(Call::Refresh(refresh_token.to_string()));
        let mut state = self.state.lock().unwrap();
        if state.empty_refresh.iter().any(|t| t == refresh_token) {
            return Ok(None);
        }
        let Some(rotation) = state.rotations.remove(refresh_token) else {
            return Err(rejected("Invalid Refresh Token"));
        };
        state
            .sessions
            .insert(rotation.access.clone(), rotation.user.clone());
        Ok(Some(Session {
            access_token: rotation.access,
            refresh_token: rotation.refresh,
            user: rotation.user,
        }))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> ProviderResult<Option<Session>> {
        self.record(Call::SignIn(email.to_string()));
        let state = self.state.lock().unwrap();
        if state.fail_sign_in {
            return Err(ProviderError::Transport("connection refused".to_string()));
        }
        match state.accounts.get(email) {
            Some(account) if account.password == password => Ok(Some(Session {
                access_token: account.access.clone(),
                refresh_token: account.refresh.clone(),
                user: account.user.clone(),
            })),
            _ => Err(ProviderError::Rejected {
                status: 400,
                message: "Invalid login credentials".to_string(),
            }),
        }
    }

    async fn sign_out(&self, access_token: &str) -> ProviderResult<()> {
        self.record(Call::SignOut(access_token.to_string()));
        let mut state = self.state.lock().unwrap();
        if state.fail_sign_out {
            return Err(ProviderError::Transport("connection refused".to_string()));
        }
        state.sessions.remove(access_token);
        Ok(())
    }

    async fn update_user(&self, access_token: &str, update: &UserUpdate) -> ProviderResult<User> {
        self.record(Call::UpdateUser(access_token.to_string()));
        let mut state = self.state.lock().unwrap();
        if state.fail_update {
            return Err(ProviderError::Transport("timed out".to_string()));
        }
        state.updates.push(update.clone());
        state
            .sessions
            .get(access_token)
            .cloned()
            .ok_or_else(|| rejected("invalid JWT"))
    }
}

/// Create a test app around the given provider.
pub fn create_test_app(provider: Arc<MockProvider>) -> Router {
    create_app(&test_config(provider, false))
}

/// Create a test app configured as a production deployment (Secure cookies).
pub fn create_secure_test_app(provider: Arc<MockProvider>) -> Router {
    create_app(&test_config(provider, true))
}

fn test_config(provider: Arc<MockProvider>, secure_cookies: bool) -> ServerConfig {
    ServerConfig {
        provider,
        secure_cookies,
        routes: RoutePolicy::default(),
        ip_header: None,
    }
}

/// Build a request the way the server would see it, with connection info attached.
pub fn request(method: &str, uri: &str, cookie: Option<&str>, form: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match form {
        Some(form) => {
            builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            Body::from(form.to_string())
        }
        None => Body::empty(),
    };
    let mut request = builder.body(body).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((TEST_IP, 40000))));
    request
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    request("GET", uri, cookie, None)
}

pub fn post_form(uri: &str, cookie: Option<&str>, form: &str) -> Request<Body> {
    request("POST", uri, cookie, Some(form))
}

pub fn auth_cookies(access_token: &str, refresh_token: &str) -> String {
    format!(
        "access-token={}; refresh-token={}",
        access_token, refresh_token
    )
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Check if cookies contain a token being cleared (Max-Age=0)
pub fn has_cleared_cookie(cookies: &[String], cookie_name: &str) -> bool {
    cookies
        .iter()
        .any(|c| c.starts_with(&format!("{}=;", cookie_name)) && c.contains("Max-Age=0"))
}

/// Value written for a cookie, if the response sets it to a non-empty value.
pub fn written_cookie(cookies: &[String], cookie_name: &str) -> Option<String> {
    let prefix = format!("{}=", cookie_name);
    cookies
        .iter()
        .filter(|c| !c.contains("Max-Age=0"))
        .find_map(|c| c.strip_prefix(&prefix))
        .and_then(|rest| rest.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
