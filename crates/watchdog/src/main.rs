//! Usage watchdog - compute-job low-usage scanner
//!
//! Runs one scan cycle against a replay fixture: flags in-progress jobs
//! under-utilizing their allocated capacity and jobs running past the
//! configured maximum age, then prints findings as JSON lines for the
//! notification layer to consume.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use watchdog_lib::{find_long_running, LongRunningFinding, Scanner};

mod config;
mod replay;

#[derive(Serialize)]
struct LongRunningReport<'a> {
    job: &'a str,
    resource_class: &'a str,
    running_for_secs: i64,
}

impl<'a> LongRunningReport<'a> {
    fn from_finding(finding: &'a LongRunningFinding) -> Self {
        Self {
            job: &finding.job.name,
            resource_class: &finding.job.resource_class,
            running_for_secs: finding.running_for.num_seconds(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting usage-watchdog");

    let config = config::WatchdogConfig::load()?;
    info!(
        lookback_hours = config.lookback_hours,
        ratio_threshold = config.ratio_threshold,
        fixture = %config.fixture_path,
        "Watchdog configured"
    );

    let backend = Arc::new(
        replay::ReplayBackend::load(&config.fixture_path)
            .with_context(|| format!("failed to load fixture {:?}", config.fixture_path))?,
    );
    info!(jobs = backend.job_count(), "Fixture loaded");

    // Anchor the window at the fixture's horizon so captured series line up
    let now = backend.latest_timestamp().unwrap_or_else(Utc::now);
    let scanner = Scanner::new(backend.clone(), backend.clone());

    let findings = scanner.scan_at(&config.scan_config(), now).await?;
    info!(flagged = findings.len(), "Low-usage scan complete");
    for finding in &findings {
        println!("{}", serde_json::to_string(finding)?);
    }

    let long_running = find_long_running(
        backend.as_ref(),
        chrono::Duration::hours(config.long_running_hours),
        now,
    )
    .await?;
    info!(flagged = long_running.len(), "Long-running check complete");
    for finding in &long_running {
        println!(
            "{}",
            serde_json::to_string(&LongRunningReport::from_finding(finding))?
        );
    }

    Ok(())
}
