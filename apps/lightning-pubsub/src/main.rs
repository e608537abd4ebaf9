//! Lightning PubSub Binary
//!
//! Runs the event pipeline against a simulated node and prints every event
//! as one JSON object per line on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin lightning-pubsub
//! ```
//!
//! # Environment Variables
//!
//! - `PUBSUB_RECORD_QUEUE_CAPACITY`: Per-subscription record queue (default: 64)
//! - `PUBSUB_EVENT_BUFFER`: Outbound event buffer (default: 1024)
//! - `PUBSUB_TICKER_INTERVAL_MS`: Ticker poll interval (default: 3000)
//! - `PUBSUB_TICKER_INFO`: Poll node info (default: true)
//! - `PUBSUB_TICKER_CHANNELS_BALANCE`: Poll channel balance (default: true)
//! - `PUBSUB_TICKER_WALLET_BALANCE`: Poll wallet balance (default: false)
//! - `PUBSUB_METRICS_PORT`: Prometheus port, 0 disables (default: 0)
//! - `PUBSUB_SIMULATED_INTERVAL_MS`: Simulated record interval (default: 1000)
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `RUST_LOG`: Log filter (default: `lightning_pubsub=info,warn`)

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use lightning_pubsub::infrastructure::telemetry;
use lightning_pubsub::{
    Event, EventReceiver, MonitorConfig, PubSub, PubSubConfig, SimulatedNetwork, init_metrics,
};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Lightning PubSub");

    let config = MonitorConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    if init_metrics(config.server.metrics_port).context("failed to start metrics exporter")? {
        tracing::info!(port = config.server.metrics_port, "Metrics exporter listening");
    }

    let backend = Arc::new(SimulatedNetwork::new(&config.simulation));
    let pubsub = PubSub::new(
        backend,
        PubSubConfig::from_settings(config.pubsub.clone(), config.ticker.clone()),
    );

    let (sink, events) = mpsc::channel::<Event>(config.pubsub.event_buffer);
    let printer = tokio::spawn(print_events(events));

    let stop = pubsub.stop_handle();
    tokio::spawn(async move {
        await_shutdown().await;
        stop.stop();
    });

    pubsub
        .run(CancellationToken::new(), sink)
        .await
        .context("pubsub run failed")?;

    // Every sender is gone once run returns, so the printer drains and exits.
    let printed = printer.await.context("event printer panicked")?;
    tracing::info!(printed, "Lightning PubSub stopped");
    Ok(())
}

/// Write each event as a JSON line on stdout. Returns the number printed.
async fn print_events(mut events: EventReceiver) -> u64 {
    let mut printed = 0;
    while let Some(event) = events.recv().await {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, kind = %event.kind(), "Failed to encode event");
                continue;
            }
        };

        let written = writeln!(std::io::stdout().lock(), "{line}");
        if let Err(e) = written {
            tracing::warn!(error = %e, "Stdout closed, discarding remaining events");
            break;
        }
        printed += 1;
    }
    printed
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &MonitorConfig) {
    tracing::info!(
        record_queue_capacity = config.pubsub.record_queue_capacity,
        event_buffer = config.pubsub.event_buffer,
        ticker_interval = ?config.ticker.interval,
        ticker_info = config.ticker.info,
        ticker_channels_balance = config.ticker.channels_balance,
        ticker_wallet_balance = config.ticker.wallet_balance,
        metrics_port = config.server.metrics_port,
        "Configuration loaded"
    );
}

/// Wait for SIGTERM or SIGINT.
async fn await_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
