//! `dropfour` binary: parses the command line and runs the server.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use dropfour::{DropfourServerBuilder, ServerConfig};
use tracing_subscriber::EnvFilter;

/// Real-time two-player drop-column game server.
#[derive(Debug, Parser)]
#[command(name = "dropfour", version, about)]
struct Cli {
    /// Interface to listen on.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Close connections that send nothing for this many seconds.
    #[arg(long, default_value_t = 30)]
    idle_timeout_secs: u64,

    /// Log filter, e.g. `debug` or `dropfour_lobby=trace`. Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: format!("{}:{}", self.host, self.port),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            ..ServerConfig::default()
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = cli.server_config();
    tracing::info!(bind = %config.bind_addr, idle_timeout = ?config.idle_timeout, "starting dropfour");

    let server = match DropfourServerBuilder::with_config(config).build().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "server stopped");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
