//! `origin-relay` binary: load configuration, start the proxy, wait for a
//! shutdown signal.

use std::path::PathBuf;

use clap::Parser;
use origin_relay::config::{load_config, ConfigOverrides, LogFormat};
use origin_relay::lifecycle::{wait_for_signal, Shutdown};
use origin_relay::observability::{logging, metrics};
use origin_relay::HttpServer;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "origin-relay", version)]
#[command(about = "Transparent reverse proxy for a single upstream origin", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Upstream base URL, e.g. https://origin.example
    #[arg(short, long, env = "UPSTREAM_URL")]
    upstream: Option<String>,

    /// Port to listen on [default: 8000]
    #[arg(short, long, env = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Host or IP to bind [default: 0.0.0.0]
    #[arg(long, env = "BIND_HOST")]
    bind_host: Option<String>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format (pretty or json)
    #[arg(long, env = "LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            upstream_url: self.upstream.clone(),
            port: self.port,
            bind_host: self.bind_host.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.overrides())?;

    logging::init(&config.observability);

    tracing::info!("origin-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        upstream = %config.upstream.url,
        response_timeout_secs = config.timeouts.response_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated during load.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let server = HttpServer::new(config.clone())?;

    // Bind last: traffic only once everything else is ready.
    let listener = TcpListener::bind((config.listener.bind_host.as_str(), config.listener.port)).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
