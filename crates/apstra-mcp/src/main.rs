//! apstra-mcp: MCP server for Apstra fabrics over stdio
//!
//!   apstra-mcp                                   # env vars / .env
//!   apstra-mcp --env-file /etc/apstra-mcp/env    # explicit environment file
//!   apstra-mcp --config apstra.toml              # TOML settings, env overrides
//!
//! Required settings: APSTRA_BASE_URL, APSTRA_API_TOKEN.
//! Optional: APSTRA_TIMEOUT_SECS (default 30), APSTRA_VERIFY_TLS (default false).

use anyhow::{Context, Result};
use apstra_api::ApstraClient;
use apstra_core::{ApstraConfig, ConfigSources};
use apstra_mcp::{
    tools,
    transport::{StdioTransport, Transport},
    McpServer, McpServerConfig, ToolRegistry,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apstra-mcp")]
#[command(about = "MCP server for Apstra fabric inspection and golden config remediation")]
#[command(version)]
struct Cli {
    /// TOML settings file (environment variables take precedence)
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Environment file with APSTRA_* assignments
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Log level, used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Server name override
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol, logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let sources = ConfigSources {
        config_file: cli.config,
        env_file: cli.env_file,
    };
    let config = ApstraConfig::load(&sources).context("failed to load Apstra configuration")?;
    let client = Arc::new(ApstraClient::new(&config).context("failed to create Apstra client")?);

    let registry = Arc::new(ToolRegistry::new());
    let count = tools::register_all(&registry, client).await?;

    let server = Arc::new(McpServer::new(
        McpServerConfig { name: cli.name },
        registry,
    ));
    info!(name = server.name(), tools = count, "Starting apstra-mcp");

    StdioTransport::new().serve(server).await
}
