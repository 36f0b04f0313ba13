//! SolarDash - OTP login and real-time solar telemetry backend
//!
//! Serves the login API used by the dashboard web app and relays live
//! inverter data to clients holding a valid session token.

use anyhow::Result;
use clap::Parser;
use secrecy::SecretString;
use solardash_auth::{OtpFlow, SessionStore};
use solardash_core::{AllowedOrigins, Config, SolintegSettings, TwilioSettings};
use solardash_server::{cors_layer, create_router, spawn_session_sweeper, AppState, TwilioVerifier};
use solardash_telemetry::{DashboardProxy, SolintegClient, SolintegOptions};
use solardash_twilio::{TwilioOptions, TwilioService};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// SolarDash - OTP login and live inverter data
#[derive(Parser, Debug)]
#[command(name = "solardash")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(long, env = "SOLARDASH_BIND", default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Server port
    #[arg(short, long, env = "SOLARDASH_PORT", default_value = "5001")]
    port: u16,

    /// Comma separated CORS origins, or '*' for any
    #[arg(long, env = "SOLARDASH_ALLOWED_ORIGINS", default_value = "http://localhost:3000")]
    allowed_origins: AllowedOrigins,

    /// Session token lifetime in seconds
    #[arg(long, env = "SOLARDASH_SESSION_TTL_SECS", default_value = "60")]
    session_ttl: u64,

    /// Sweep expired sessions every N seconds (0 = only evict on lookup)
    #[arg(long, env = "SOLARDASH_SESSION_SWEEP_SECS", default_value = "0")]
    session_sweep_interval: u64,

    /// Timeout in seconds for Twilio and Solinteg requests
    #[arg(long, env = "SOLARDASH_UPSTREAM_TIMEOUT_SECS", default_value = "10")]
    upstream_timeout: u64,

    /// Twilio account SID
    #[arg(long, env = "TWILIO_ACCOUNT_SID", hide_env_values = true)]
    twilio_account_sid: String,

    /// Twilio auth token
    #[arg(long, env = "TWILIO_AUTH_TOKEN", hide_env_values = true)]
    twilio_auth_token: String,

    /// Twilio Verify service SID
    #[arg(long, env = "TWILIO_SERVICE_SID", hide_env_values = true)]
    twilio_service_sid: String,

    /// Solinteg cloud API base URL
    #[arg(long, env = "SOLINTEG_BASE_URL", default_value = solardash_core::DEFAULT_SOLINTEG_BASE_URL)]
    solinteg_base_url: String,

    /// Solinteg cloud account
    #[arg(long, env = "SOLINTEG_ACCOUNT", hide_env_values = true)]
    solinteg_account: String,

    /// Solinteg cloud password
    #[arg(long, env = "SOLINTEG_PASSWORD", hide_env_values = true)]
    solinteg_password: String,

    /// Serial number of the monitored device
    #[arg(long, env = "SOLINTEG_DEVICE_SN")]
    solinteg_device_sn: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Config {
        Config::new()
            .with_bind(self.bind)
            .with_port(self.port)
            .with_allowed_origins(self.allowed_origins)
            .with_session_ttl(Duration::from_secs(self.session_ttl))
            .with_session_sweep_interval(Duration::from_secs(self.session_sweep_interval))
            .with_upstream_timeout(Duration::from_secs(self.upstream_timeout))
            .with_twilio(TwilioSettings {
                account_sid: self.twilio_account_sid,
                auth_token: SecretString::from(self.twilio_auth_token),
                service_sid: self.twilio_service_sid,
            })
            .with_solinteg(SolintegSettings {
                base_url: self.solinteg_base_url,
                account: self.solinteg_account,
                password: SecretString::from(self.solinteg_password),
                device_sn: self.solinteg_device_sn,
            })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real deployments set the environment directly
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!("SolarDash v{}", env!("CARGO_PKG_VERSION"));

    let mut config = args.into_config();
    config.validate()?;

    let session_ttl = chrono::Duration::from_std(config.session_ttl)
        .map_err(|e| anyhow::anyhow!("Session TTL out of range: {}", e))?;

    // Upstream clients
    let twilio = config
        .twilio
        .take()
        .ok_or_else(|| anyhow::anyhow!("Twilio settings missing"))?;
    let twilio = TwilioService::new(
        TwilioOptions::new(twilio.account_sid, twilio.auth_token, twilio.service_sid)
            .with_timeout(config.upstream_timeout),
    )
    .map_err(|e| anyhow::anyhow!("Failed to create Twilio client: {}", e))?;

    let solinteg = config
        .solinteg
        .take()
        .ok_or_else(|| anyhow::anyhow!("Solinteg settings missing"))?;
    let solinteg = SolintegClient::new(SolintegOptions {
        base_url: solinteg.base_url,
        account: solinteg.account,
        password: solinteg.password,
        device_sn: solinteg.device_sn,
        timeout: config.upstream_timeout,
    })
    .map_err(|e| anyhow::anyhow!("Failed to create Solinteg client: {}", e))?;

    // Sessions and login flow
    let sessions = SessionStore::new();
    let otp = OtpFlow::new(Arc::new(TwilioVerifier(twilio)), sessions.clone(), session_ttl);
    let state = Arc::new(AppState::new(otp, DashboardProxy::new(Arc::new(solinteg))));

    info!("Session lifetime: {}s", config.session_ttl.as_secs());
    let sweeper = if config.sweep_enabled() {
        info!(
            "Sweeping expired sessions every {}s",
            config.session_sweep_interval.as_secs()
        );
        Some(spawn_session_sweeper(sessions, config.session_sweep_interval))
    } else {
        None
    };

    let router = create_router(state, cors_layer(&config.allowed_origins)?);

    // Start HTTP server
    let addr = SocketAddr::new(config.bind, config.port);
    info!("Starting server on {}...", addr);

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down...");
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }

    info!("Goodbye!");
    Ok(())
}
