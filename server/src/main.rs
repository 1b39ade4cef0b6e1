// Copyright (c) 2026 Centra Financial Technology. MIT License.
// See LICENSE for details.

//! # Centra API Server
//!
//! Entry point for the `centra-server` binary. Parses CLI arguments,
//! initializes logging and metrics, opens the account store, and serves the
//! customer/admin HTTP API.
//!
//! The binary supports four subcommands:
//!
//! - `run`     — start the API server
//! - `init`    — initialize the data directory and generate the admin token
//! - `status`  — query a running server's status endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use rand::RngCore;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;

use centra_core::auth::AuthService;
use centra_core::directory::Directory;
use centra_core::kyc::KycDesk;
use centra_core::ledger::Ledger;
use centra_core::notify::{HttpMailer, Mailer, NoopMailer};
use centra_core::store::BankDb;
use centra_core::support::SupportDesk;

use cli::{CentraCli, Commands};
use logging::LogFormat;
use metrics::BankMetrics;

/// Broadcast channel capacity for live event streaming. Large enough to
/// absorb short bursts without dropping events for connected WebSocket
/// clients.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Admin token file inside the data directory, created by `init`.
const ADMIN_TOKEN_FILE: &str = "admin.token";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CentraCli::parse();

    match cli.command {
        Commands::Run(args) => run_server(args).await,
        Commands::Init(args) => init_data_dir(args),
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full server: API listener, metrics listener, event fan-out.
async fn run_server(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "centra_server=info,centra_core=info,tower_http=debug",
        LogFormat::Pretty,
    );

    tracing::info!(
        http_port = args.http_port,
        metrics_port = args.metrics_port,
        data_dir = %args.data_dir.display(),
        "starting centra-server"
    );

    // --- Persistent storage ---
    let db_path = args.data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    let db = BankDb::open(&db_path)
        .with_context(|| format!("failed to open store at {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), accounts = db.account_count(), "store opened");

    // --- Admin token ---
    let admin_token = match args.admin_token {
        Some(token) => token,
        None => {
            let token_path = args.data_dir.join(ADMIN_TOKEN_FILE);
            std::fs::read_to_string(&token_path)
                .with_context(|| {
                    format!(
                        "failed to read admin token at {} (run `centra-server init` first)",
                        token_path.display()
                    )
                })?
                .trim()
                .to_string()
        }
    };

    // --- Outbound email ---
    let mailer: Arc<dyn Mailer> = match &args.email_endpoint {
        Some(endpoint) => {
            tracing::info!(endpoint = %endpoint, "email delivery enabled");
            Arc::new(HttpMailer::new(endpoint.clone()))
        }
        None => {
            tracing::info!("no email endpoint configured, outbound email suppressed");
            Arc::new(NoopMailer)
        }
    };

    // --- Metrics ---
    let bank_metrics = Arc::new(BankMetrics::new());
    bank_metrics.accounts_total.set(db.account_count() as i64);

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: chrono::Utc::now(),
        directory: Directory::new(db.clone()),
        auth: Arc::new(AuthService::new(db.clone())),
        ledger: Ledger::new(db.clone()),
        kyc: KycDesk::new(db.clone()),
        support: SupportDesk::new(db.clone()),
        mailer,
        admin_token,
        event_tx,
        metrics: Arc::clone(&bank_metrics),
        db: db.clone(),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.http_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&bank_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    db.flush().context("failed to flush store on shutdown")?;
    tracing::info!("centra-server stopped");
    Ok(())
}

/// Initializes the data directory and generates the admin API token.
fn init_data_dir(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("centra_server=info", LogFormat::Pretty);

    let data_dir = &args.data_dir;
    tracing::info!(data_dir = %data_dir.display(), "initializing data directory");

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    // Generate the admin API token.
    let mut token_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut token_bytes);
    let token = hex::encode(token_bytes);

    let token_path = data_dir.join(ADMIN_TOKEN_FILE);
    std::fs::write(&token_path, &token)
        .with_context(|| format!("failed to write admin token to {}", token_path.display()))?;

    // Restrict permissions on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&token_path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!(token_path = %token_path.display(), "admin token generated");

    println!("Data directory initialized.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Admin token    : {}", token_path.display());
    println!();
    println!("Pass the token in the `x-admin-token` header for admin endpoints.");

    Ok(())
}

/// Queries a running server's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.api_url.trim_end_matches('/'));
    let body = reqwest::get(&url)
        .await
        .with_context(|| format!("failed to reach {}", url))?
        .text()
        .await
        .context("failed to read status response")?;
    println!("{}", body);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("centra-server {}", env!("CARGO_PKG_VERSION"));
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
