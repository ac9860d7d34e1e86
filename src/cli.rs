//! CLI argument parsing, validation, and startup helpers.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use url::Url;

use crate::ServerConfig;
use crate::auth::{IdentityProvider, RoutePolicy};
use crate::gotrue::GoTrueClient;

/// Environment variable holding the provider's anon (public) API key.
pub const ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Header a reverse proxy uses to pass on the client IP.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientIpHeader {
    /// `X-Forwarded-For`, first hop
    XForwardedFor,
    /// `X-Real-IP`
    XRealIp,
}

impl ClientIpHeader {
    pub fn header_name(&self) -> &'static str {
        match self {
            ClientIpHeader::XForwardedFor => "x-forwarded-for",
            ClientIpHeader::XRealIp => "x-real-ip",
        }
    }

    /// Parse the header value into a normalized IP address string.
    pub fn parse(&self, value: &str) -> Result<String, &'static str> {
        let candidate = match self {
            ClientIpHeader::XForwardedFor => value.split(',').next().unwrap_or("").trim(),
            ClientIpHeader::XRealIp => value.trim(),
        };
        candidate
            .parse::<IpAddr>()
            .map(|ip| ip.to_string())
            .map_err(|_| "IP header does not contain a valid address")
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "assetkeep",
    about = "Personal asset register behind a hosted identity provider"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "4321")]
    pub port: u16,

    /// Base URL of the hosted backend project (e.g., "https://xyz.supabase.co")
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: String,

    /// Path to file containing the anon API key. Prefer the SUPABASE_ANON_KEY env var instead
    #[arg(long)]
    pub anon_key_file: Option<String>,

    /// Production deployment: session cookies get the Secure attribute
    #[arg(long, env = "PRODUCTION")]
    pub production: bool,

    /// Total timeout for a single identity provider call, in seconds
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub provider_timeout_secs: u64,

    /// Take the client IP from this header (only when running behind a proxy)
    #[arg(long, value_enum)]
    pub ip_header: Option<ClientIpHeader>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load the anon API key from environment variable or file.
/// Returns None and logs an error if the key cannot be loaded.
pub fn load_anon_key(anon_key_file: Option<&str>) -> Option<String> {
    let key = if let Ok(key) = std::env::var(ANON_KEY_ENV) {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(ANON_KEY_ENV) };
        key
    } else if let Some(path) = anon_key_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read anon key file");
                return None;
            }
        }
    } else {
        error!(
            "Anon key is required. Set {} environment variable (recommended) or use --anon-key-file",
            ANON_KEY_ENV
        );
        return None;
    };

    if key.trim().is_empty() {
        error!("Anon key is empty");
        return None;
    }

    Some(key.trim().to_string())
}

/// Parse and validate the backend URL.
/// Returns None and logs an error if validation fails.
pub fn validate_provider_url(provider_url: &str) -> Option<Url> {
    let url = match Url::parse(provider_url) {
        Ok(url) => url,
        Err(e) => {
            error!(url = %provider_url, error = %e, "Invalid backend URL");
            return None;
        }
    };

    let is_https = url.scheme() == "https";
    let is_local = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));

    if !is_https && !(is_local && url.scheme() == "http") {
        error!("Backend URL must use HTTPS unless it points at localhost");
        return None;
    }

    Some(url)
}

/// Build the identity provider client, logging errors if it fails.
pub fn build_provider(
    provider_url: &Url,
    anon_key: &str,
    timeout_secs: u64,
) -> Option<Arc<dyn IdentityProvider>> {
    match GoTrueClient::new(provider_url, anon_key, Duration::from_secs(timeout_secs)) {
        Ok(client) => {
            info!(url = %provider_url, timeout_secs, "Identity provider configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            error!(error = %e, "Failed to build identity provider client");
            None
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    provider: Arc<dyn IdentityProvider>,
    production: bool,
    ip_header: Option<ClientIpHeader>,
) -> ServerConfig {
    ServerConfig {
        provider,
        secure_cookies: production,
        routes: RoutePolicy::default(),
        ip_header,
    }
}
