use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use relnotes_fn::config::{self, ConfigBuilder};
use relnotes_fn::observability::{init_observability, shutdown_observability};
use relnotes_fn::transport::{AppState, router, run_http};

#[derive(Parser, Debug)]
#[command(name = "relnotes-fn")]
#[command(about = "HTTP function serving Google Cloud release notes from BigQuery", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Billing project for query jobs
    #[arg(long)]
    project_id: Option<String>,

    /// HTTP bind host
    #[arg(long)]
    host: Option<IpAddr>,

    /// HTTP bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable JSON logging output
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// CLI values seed the builder; file and environment override them.
    fn seed(&self) -> ConfigBuilder {
        let mut builder = ConfigBuilder::new();

        if let Some(ref project) = self.project_id {
            builder = builder.project_id(project.clone());
        }
        if let Some(host) = self.host {
            builder = builder.http_host(host);
        }
        if let Some(port) = self.port {
            builder = builder.http_port(port);
        }
        if self.verbose {
            builder = builder.log_level("debug".to_string());
        }
        if self.json_logs {
            builder = builder.json_logs(true);
        }
        builder
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration with precedence: env > file > CLI > defaults
    let builder = config::load_config(args.seed(), args.config.as_deref())?;
    let config = builder.build()?;

    init_observability(&config.telemetry)?;

    tracing::info!("Starting release notes function");
    tracing::info!("BigQuery endpoint: {}", config.engine.endpoint);
    tracing::info!("Auth mode: {:?}", config.engine.auth);
    tracing::info!("Request timeout: {:?}", config.transport.request_timeout);
    tracing::info!("Null style: {}", config.response.null_style);
    match config.project_id() {
        Some(project) => tracing::info!("Project: {project}"),
        None => tracing::warn!("No project configured; lookups will fail until PROJECT_ID is set"),
    }

    let state = AppState::from_config(&config)?;
    let app = router(state, config.transport.request_timeout);

    let result = run_http(
        app,
        config.transport.http_host,
        config.transport.http_port,
        shutdown_signal(),
    )
    .await;

    shutdown_observability();

    result.map_err(Into::into)
}

/// Resolves on Ctrl+C, or SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
