//! fping-exporter - version 0.1.0
//!
//! Prometheus exporter for fping latency and packet-loss statistics.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod metrics;
mod startup_checks;
mod state;

use axum::{routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use std::fs::OpenOptions;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::{net::TcpListener, signal, sync::watch};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use fping_exporter::{FpingProber, HealthStats, MetricStore, Scheduler};

use cli::{Args, Commands};
use commands::{command_check_requirements, command_config, command_parse, command_test};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{config_handler, health_handler, metrics_handler, root_handler, snapshot_handler};
use state::{AppState, SharedState};

/// Maps a validated log level name to a filter.
fn level_filter(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" => LevelFilter::WARN,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}

/// Initializes tracing logging subsystem with configured log level.
/// Logs go to stderr and, when `log_file` is set, are appended to that file too.
fn setup_logging(config: &Config) {
    let level_name = config.log_level.as_deref().unwrap_or("info");
    let level = level_filter(level_name);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(level);

    let mut file_error = None;
    let file_layer = config.log_file.as_ref().and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(level),
            ),
            Err(e) => {
                file_error = Some(format!("{}: {}", path.display(), e));
                None
            }
        }
    });

    if let Err(e) = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if let Some(e) = file_error {
        warn!("Could not open log file {} - logging to stderr only", e);
    }

    info!("Logging initialized with level: {}", level_name);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves once SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        if let Commands::CheckRequirements = command {
            // Reports config problems itself instead of exiting early
            let config = resolve_config(&args)?;
            return command_check_requirements(&config);
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config);

        return match command {
            Commands::Test {
                iterations,
                verbose,
                format,
            } => command_test(*iterations, *verbose, format.clone(), &config).await,

            Commands::Parse { input, format } => {
                command_parse(input.as_deref(), format.clone(), &config)
            }

            Commands::Config { .. } => unreachable!("Config handled above"),
            Commands::CheckRequirements => unreachable!("CheckRequirements handled above"),
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;

    setup_logging(&config);

    info!("Starting fping-exporter");

    let scheduler_config = config.scheduler_config()?;

    // Missing fping is not fatal: cycles publish sentinel values until it appears
    if let Err(e) = startup_checks::validate_requirements(&scheduler_config.settings.binary) {
        error!("❌ Startup validation failed: {}", e);
        error!("   The exporter will start but every target will report 100% loss!");
    }

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let store = Arc::new(MetricStore::new(config.targets()));
    let health_stats = Arc::new(HealthStats::new());

    let state: SharedState = Arc::new(AppState::new(
        Arc::new(config.clone()),
        store.clone(),
        health_stats.clone(),
    )?);
    debug!("All metrics registered successfully");

    // Start the collection loop
    let watchdog = scheduler_config.watchdog;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(FpingProber, store, health_stats, scheduler_config);
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    // Configure HTTP server routes
    let addr = SocketAddr::new(bind_ip_str.parse::<IpAddr>()?, port);

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler));

    if config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    app = app
        .route("/config", get(config_handler))
        .route("/snapshot", get(snapshot_handler));

    let app = app.with_state(state.clone());

    // Check if TLS is enabled
    let enable_tls = config.enable_tls.unwrap_or(false);

    let served: Result<(), Box<dyn std::error::Error>> = if enable_tls {
        // Both paths are present after validate_effective_config()
        let (Some(cert_path), Some(key_path)) =
            (config.tls_cert_path.as_ref(), config.tls_key_path.as_ref())
        else {
            return Err("TLS enabled without certificate and key paths".into());
        };

        info!("Loading TLS certificate from: {}", cert_path);
        info!("Loading TLS private key from: {}", key_path);

        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .map_err(|e| {
                error!("Failed to load TLS configuration: {}", e);
                e
            })?;

        info!("fping-exporter listening on https://{}:{}", bind_ip_str, port);

        let server = axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service());

        tokio::select! {
            result = server => result.map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
            _ = shutdown_signal() => Ok(()),
        }
    } else {
        // TLS is disabled - use standard TCP listener
        let listener = TcpListener::bind(addr).await?;
        info!("fping-exporter listening on http://{}:{}", bind_ip_str, port);

        let server = axum::serve(listener, app);

        tokio::select! {
            result = server => result.map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
            _ = shutdown_signal() => Ok(()),
        }
    };

    if let Err(e) = &served {
        error!("Server error: {}", e);
    }

    // Let the running cycle finish, bounded by the watchdog
    shutdown_tx.send(true).ok();
    match tokio::time::timeout(watchdog, scheduler_handle).await {
        Ok(Ok(())) => debug!("Scheduler task joined"),
        Ok(Err(e)) => error!("Scheduler task failed: {}", e),
        Err(_) => warn!("Scheduler did not stop within {:?}, exiting anyway", watchdog),
    }

    info!("fping-exporter stopped gracefully");
    served
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter_mapping() {
        assert_eq!(level_filter("off"), LevelFilter::OFF);
        assert_eq!(level_filter("DEBUG"), LevelFilter::DEBUG);
        assert_eq!(level_filter("warn"), LevelFilter::WARN);
        assert_eq!(level_filter("unknown"), LevelFilter::INFO);
    }
}
