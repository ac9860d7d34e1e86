use assetkeep::cli::{
    Args, build_config, build_provider, init_logging, load_anon_key, validate_provider_url,
};
use assetkeep::run_server;
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(anon_key) = load_anon_key(args.anon_key_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(provider_url) = validate_provider_url(&args.supabase_url) else {
        std::process::exit(1);
    };

    let Some(provider) = build_provider(&provider_url, &anon_key, args.provider_timeout_secs)
    else {
        std::process::exit(1);
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, "Failed to read listener address");
            std::process::exit(1);
        }
    };

    if !args.production {
        info!("Development mode: session cookies are sent without the Secure attribute");
    }

    let config = build_config(provider, args.production, args.ip_header);

    info!(address = %local_addr, "Listening");

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
