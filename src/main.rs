use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkwatch::config::{Config, LoggingConfig};
use linkwatch::publish::MqttBroker;
use linkwatch::scheduler::Monitor;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    setup_tracing(&config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        broker = %format!("{}:{}", config.broker.host, config.broker.port),
        measurements_topic = %config.topics.measurements,
        alerts_topic = %config.topics.alerts,
        "linkwatch starting"
    );
    tracing::debug!(config = ?config, "Loaded configuration");

    let broker = Arc::new(MqttBroker::new(&config.broker));
    let mut monitor =
        Monitor::from_config(&config, broker).context("Failed to initialize monitor")?;

    monitor.run(tokio::signal::ctrl_c()).await;

    tracing::info!(
        pending = monitor.pending().len(),
        "linkwatch stopped"
    );
    Ok(())
}

fn setup_tracing(logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("linkwatch={},warn", logging.level))
    });

    match logging.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
