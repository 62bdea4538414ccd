use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relink_core::{load_config, validate_config, HttpGateway, ReleaseService, Restorer};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("RELINK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Short config hash to tell runs apart in logs
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));

    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Release service: {} (user {})", config.api.base_url, config.api.username);

    // Missing token is fatal: no request can be made without it
    let gateway: Arc<dyn ReleaseService> = Arc::new(
        HttpGateway::new(&config.api).context("Failed to create release service client")?,
    );

    let restorer = Arc::new(Restorer::new(config.restorer.clone(), gateway));
    let cycle_interval = Duration::from_secs(config.schedule.cycle_interval_secs);

    // A running cycle finishes its current sweep before it notices
    tokio::spawn({
        let restorer = Arc::clone(&restorer);
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            restorer.stop();
        }
    });

    loop {
        match restorer.run_cycle().await {
            Ok(report) if report.drained() => {
                info!(
                    initial = report.initial,
                    sweeps = report.sweeps.len(),
                    "All releases restored"
                );
            }
            Ok(report) => {
                info!(
                    initial = report.initial,
                    remaining = report.remaining,
                    sweeps = report.sweeps.len(),
                    "Releases left for next cycle"
                );
            }
            Err(e) if cycle_interval.is_zero() => {
                return Err(e).context("Restoration cycle failed");
            }
            Err(e) => {
                error!(error = %e, "Restoration cycle failed, retrying at next cycle");
            }
        }

        if cycle_interval.is_zero() || restorer.is_stopped() {
            break;
        }

        info!("Next cycle in {:?}", cycle_interval);
        if !restorer.wait(cycle_interval).await {
            break;
        }
    }

    info!("relink stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
