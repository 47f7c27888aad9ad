//! Sports Data Hub
//!
//! Aggregates team, game, and betting odds data from multiple upstream
//! providers into dashboard views.
//!
//! Architecture:
//! - Tokio async runtime for concurrent I/O
//! - Rate-limited, retrying REST executor shared by all provider adapters
//! - ESPN and NBA stats adapters plus an optional odds adapter
//! - Aggregation service with per-provider degradation and health checks

use std::time::Duration;

use tokio::signal;
use tracing::{error, info, warn};

use sports_data_hub::config::Settings;
use sports_data_hub::service::aggregator::DataService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration.
    let settings = Settings::from_env();

    // Initialize logging.
    init_logging(&settings);

    info!("=== Sports Data Hub ===");
    info!(
        refresh_interval_secs = settings.refresh_interval_secs,
        odds_configured = settings.odds_configured(),
        "Configuration loaded"
    );

    // Validate settings.
    if let Err(errors) = settings.validate() {
        for e in &errors {
            error!(error = %e, "Configuration error");
        }
        anyhow::bail!("Configuration validation failed");
    }

    let service = DataService::new(&settings)
        .map_err(|e| anyhow::anyhow!("Failed to build data service: {e}"))?;

    // Startup health check.
    let report = service.health_check().await;
    if !report.is_operational() {
        warn!("One or more providers are down, views will degrade");
    }

    refresh_views(&service).await;

    // Periodic refresh loop.
    let refresh_interval = Duration::from_secs(settings.refresh_interval_secs);
    info!(
        interval_secs = settings.refresh_interval_secs,
        "Starting refresh loop"
    );

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = tokio::time::sleep(refresh_interval) => {
                refresh_views(&service).await;
            }
        }
    }

    info!("Shutdown complete.");
    Ok(())
}

/// Fetch and log the dashboard views once.
async fn refresh_views(service: &DataService) {
    let teams = service.get_dashboard_teams().await;
    info!(count = teams.len(), "Teams view refreshed");

    let matches = service.get_dashboard_matches().await;
    for (i, m) in matches.iter().enumerate().take(10) {
        info!(
            "  [{}] {} vs {} ({}{})",
            i + 1,
            m.home_team,
            m.away_team,
            m.status,
            m.odds_display
                .as_deref()
                .map(|o| format!(", home {o}"))
                .unwrap_or_default()
        );
    }
    info!(count = matches.len(), "Matches view refreshed");
}

fn init_logging(settings: &Settings) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    if settings.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}
