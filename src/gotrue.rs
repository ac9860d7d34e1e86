//! Identity provider client for a hosted GoTrue-compatible auth API.
//!
//! Endpoints live under `{base}/auth/v1`. Every request carries the project's
//! anon key in the `apikey` header; user-scoped calls add the access token as
//! a bearer credential.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::{IdentityProvider, ProviderError, ProviderResult, Session, User, UserUpdate};

/// Default total timeout for a single provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of a successful `/token` call.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

impl TokenResponse {
    /// A response without both tokens and a user carries no session.
    fn into_session(self) -> Option<Session> {
        let access_token = self.access_token.filter(|t| !t.is_empty())?;
        let refresh_token = self.refresh_token.filter(|t| !t.is_empty())?;
        Some(Session {
            access_token,
            refresh_token,
            user: self.user?,
        })
    }
}

/// Pull a human-readable message out of an error body. GoTrue has used
/// several shapes over time.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

/// HTTP client for the hosted identity provider.
#[derive(Clone)]
pub struct GoTrueClient {
    base: String,
    anon_key: String,
    http: reqwest::Client,
}

impl GoTrueClient {
    /// Create a client for the project at `base_url`. Each call is a single
    /// attempt bounded by `timeout`.
    pub fn new(base_url: &Url, anon_key: &str, timeout: Duration) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            base: format!("{}/auth/v1", base_url.as_str().trim_end_matches('/')),
            anon_key: anon_key.to_string(),
            http,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base, path))
            .header("apikey", &self.anon_key)
    }

    async fn send(&self, request: RequestBuilder) -> ProviderResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::Rejected {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ProviderResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> ProviderResult<Option<Session>> {
        let request = self
            .request(Method::POST, &format!("/token?grant_type={grant_type}"))
            .json(&body);
        let response = self.send(request).await?;
        let token: TokenResponse = Self::decode(response).await?;
        Ok(token.into_session())
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> ProviderResult<Session> {
        let request = self.request(Method::GET, "/user").bearer_auth(access_token);
        let response = self.send(request).await?;
        let user: User = Self::decode(response).await?;
        debug!(user_id = %user.id, "Access token accepted");

        Ok(Session {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            user,
        })
    }

    async fn refresh_session(&self, refresh_token: &str) -> ProviderResult<Option<Session>> {
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> ProviderResult<Option<Session>> {
        self.token_grant(
            "password",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn sign_out(&self, access_token: &str) -> ProviderResult<()> {
        let request = self.request(Method::POST, "/logout").bearer_auth(access_token);
        self.send(request).await?;
        Ok(())
    }

    async fn update_user(&self, access_token: &str, update: &UserUpdate) -> ProviderResult<User> {
        let request = self
            .request(Method::PUT, "/user")
            .bearer_auth(access_token)
            .json(update);
        let response = self.send(request).await?;
        Self::decode(response).await
    }
}
