//! Attempt API server binary.
//!
//! Wires the in-memory attempt handler into the route table, the operation
//! pipeline, and the HTTP server, then serves until Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use attempt_api_core::operation_ids;
use attempt_api_server::network::{NetworkConfig, NetworkModule, TlsConfig};
use attempt_api_server::service::{
    build_attempt_router, build_operation_pipeline, Availability, InMemoryAttemptHandler,
    ServerConfig,
};
use clap::{Parser, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AvailabilityArg {
    Removed,
    Pending,
}

impl From<AvailabilityArg> for Availability {
    fn from(arg: AvailabilityArg) -> Self {
        match arg {
            AvailabilityArg::Removed => Self::Removed,
            AvailabilityArg::Pending => Self::Pending,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "attempt-server", about = "Serves the attempt API")]
struct Args {
    #[arg(long, env = "ATTEMPT_API_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "ATTEMPT_API_PORT", default_value_t = 8001)]
    port: u16,

    #[arg(long, env = "ATTEMPT_API_NODE_ID", default_value = "attempt-api-0")]
    node_id: String,

    /// PEM certificate chain; enables TLS together with `--tls-key`.
    #[arg(long, env = "ATTEMPT_API_TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    #[arg(long, env = "ATTEMPT_API_TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Allowed CORS origin; repeat for several. Defaults to any origin.
    #[arg(long = "cors-origin")]
    cors_origins: Vec<String>,

    #[arg(long, env = "ATTEMPT_API_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    #[arg(long, env = "ATTEMPT_API_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Address for the Prometheus scrape endpoint. Disabled when unset.
    #[arg(long, env = "ATTEMPT_API_METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,

    /// Whether `save_stats` is retired for good or still to be built.
    #[arg(long, value_enum, default_value_t = AvailabilityArg::Removed)]
    save_stats_availability: AvailabilityArg,

    /// Attempt to preload into the in-memory handler, as `JOB_ID/ATTEMPT_NUMBER`.
    #[arg(long = "register-attempt", value_parser = parse_attempt_key)]
    register_attempts: Vec<(i64, i32)>,
}

fn parse_attempt_key(raw: &str) -> Result<(i64, i32), String> {
    let (job, attempt) = raw
        .split_once('/')
        .ok_or_else(|| format!("expected JOB_ID/ATTEMPT_NUMBER, got {raw:?}"))?;
    let job = job.parse().map_err(|e| format!("invalid job id {job:?}: {e}"))?;
    let attempt = attempt
        .parse()
        .map_err(|e| format!("invalid attempt number {attempt:?}: {e}"))?;
    Ok((job, attempt))
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("attempt_api_server=info,attempt_api_core=info,tower_http=info")
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().with_target(false).compact())
            .init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

fn network_config(args: &Args) -> NetworkConfig {
    let tls = match (&args.tls_cert, &args.tls_key) {
        (Some(cert_path), Some(key_path)) => Some(TlsConfig {
            cert_path: cert_path.clone(),
            key_path: key_path.clone(),
        }),
        _ => None,
    };
    let defaults = NetworkConfig::default();
    NetworkConfig {
        host: args.host.clone(),
        port: args.port,
        tls,
        cors_origins: if args.cors_origins.is_empty() {
            defaults.cors_origins
        } else {
            args.cors_origins.clone()
        },
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        drain_timeout: defaults.drain_timeout,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_format);

    if let Some(addr) = args.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!(%addr, "Prometheus exporter listening");
    }

    let handler = Arc::new(InMemoryAttemptHandler::new());
    for &(job_id, attempt_number) in &args.register_attempts {
        handler.register_attempt(job_id, attempt_number);
    }

    let mut server_config = ServerConfig {
        node_id: args.node_id.clone(),
        ..ServerConfig::default()
    };
    server_config
        .unsupported
        .insert(operation_ids::SAVE_STATS, args.save_stats_availability.into());

    let pipeline = build_operation_pipeline(build_attempt_router(handler));
    let mut module = NetworkModule::new(network_config(&args), server_config, pipeline);
    let port = module.start().await?;
    info!(node_id = %args.node_id, port, "attempt API starting");

    module.serve(shutdown_signal()).await
}
