//! # CLI Interface
//!
//! Command-line argument structure for `centra-server` using `clap` derive.
//! Supports four subcommands: `run`, `init`, `status`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Centra banking API server.
///
/// Serves the customer and admin HTTP API over an embedded account store,
/// and exposes Prometheus metrics on a separate port.
#[derive(Parser, Debug)]
#[command(
    name = "centra-server",
    about = "Centra banking API server",
    version,
    propagate_version = true
)]
pub struct CentraCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Centra server binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API server.
    Run(RunArgs),
    /// Initialize a new data directory and generate the admin API token.
    Init(InitArgs),
    /// Query the status of a running server via its HTTP endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the data directory holding the account store and the admin
    /// token. Created by `init`.
    #[arg(long, short = 'd', env = "CENTRA_DATA_DIR", default_value = "~/.centra")]
    pub data_dir: PathBuf,

    /// Port for the customer and admin HTTP API.
    #[arg(long, env = "CENTRA_HTTP_PORT", default_value_t = 8660)]
    pub http_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "CENTRA_METRICS_PORT", default_value_t = 8661)]
    pub metrics_port: u16,

    /// URL of the email delivery endpoint (`POST {to, subject, html}`).
    ///
    /// When omitted, outbound email is suppressed — signups and logins
    /// still succeed, delivery is fire-and-forget either way.
    #[arg(long, env = "CENTRA_EMAIL_ENDPOINT")]
    pub email_endpoint: Option<String>,

    /// Admin API token, overriding the one in the data directory.
    /// **Never pass this flag in production** — use the token file.
    #[arg(long, env = "CENTRA_ADMIN_TOKEN")]
    pub admin_token: Option<String>,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to the data directory to initialize.
    #[arg(long, short = 'd', env = "CENTRA_DATA_DIR", default_value = "~/.centra")]
    pub data_dir: PathBuf,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// HTTP endpoint of the running server.
    #[arg(long, default_value = "http://127.0.0.1:8660")]
    pub api_url: String,
}
