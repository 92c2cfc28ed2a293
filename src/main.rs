// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;
use the_northbound::config::load_and_validate_config;
use the_northbound::engine::Platform;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_CONFIG: &str = "configs/demo.yaml";
const REPORT_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = load_and_validate_config(&path).map_err(|errors| {
        let problems: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow!("invalid config {}: {}", path, problems.join("; "))
    })?;

    let platform = Platform::builder(config).build();
    platform
        .start()
        .await
        .with_context(|| format!("failed to start platform from {}", path))?;

    let mut report = tokio::time::interval(REPORT_INTERVAL);
    report.tick().await;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                break;
            }
            _ = report.tick() => {
                let ping = platform.ping().await;
                tracing::info!(
                    uptime_secs = ping.uptime.as_secs(),
                    data_read = ping.data_read,
                    data_sent = ping.data_sent,
                    "Ping"
                );
                for (name, value) in platform.statistics() {
                    tracing::debug!(statistic = %name, value, "Statistic");
                }
            }
        }
    }

    platform.shutdown().await.context("failed to shut down cleanly")?;
    Ok(())
}
