//! Prometheus Metrics Module
//!
//! Exposes pipeline metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Records**: Records received, suppressed and dropped per subscription
//! - **Events**: Events emitted per kind
//! - **Failures**: Subscription and ticker probe failures
//! - **Workers**: Outstanding pipeline tasks
//!
//! # Integration
//!
//! Metrics are served at `/metrics` on `PUBSUB_METRICS_PORT` when the port
//! is non-zero. Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::domain::events::EventKind;
use crate::domain::translation::SourceKind;

// =============================================================================
// Exporter
// =============================================================================

/// Install the Prometheus exporter with an HTTP listener on `port`.
///
/// Returns `Ok(false)` without installing anything when `port` is 0.
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or a recorder is
/// already installed.
pub fn init_metrics(port: u16) -> Result<bool, BuildError> {
    if port == 0 {
        return Ok(false);
    }

    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], port)))
        .install()?;

    register_metrics();
    Ok(true)
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "lightning_pubsub_records_received_total",
        "Records received from node subscriptions"
    );
    describe_counter!(
        "lightning_pubsub_records_suppressed_total",
        "Records that mapped to no event"
    );
    describe_counter!(
        "lightning_pubsub_records_dropped_total",
        "Buffered records discarded during shutdown"
    );
    describe_counter!(
        "lightning_pubsub_events_emitted_total",
        "Events delivered to the outbound stream"
    );
    describe_counter!(
        "lightning_pubsub_subscription_failures_total",
        "Node subscriptions that ended with an error"
    );
    describe_counter!(
        "lightning_pubsub_ticker_errors_total",
        "Ticker probes that failed"
    );
    describe_gauge!(
        "lightning_pubsub_outstanding_workers",
        "Pipeline tasks not yet finished"
    );

    // Export every per-source series from the first scrape.
    for source in SourceKind::ALL {
        for name in [
            "lightning_pubsub_records_received_total",
            "lightning_pubsub_subscription_failures_total",
        ] {
            counter!(name, "source" => source.as_str()).absolute(0);
        }
    }
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a record received from a subscription.
pub fn record_received(source: SourceKind) {
    counter!(
        "lightning_pubsub_records_received_total",
        "source" => source.as_str()
    )
    .increment(1);
}

/// Record a record that produced no event.
pub fn record_suppressed(source: SourceKind) {
    counter!(
        "lightning_pubsub_records_suppressed_total",
        "source" => source.as_str()
    )
    .increment(1);
}

/// Record buffered records discarded at shutdown.
pub fn records_dropped(source: SourceKind, count: u64) {
    counter!(
        "lightning_pubsub_records_dropped_total",
        "source" => source.as_str()
    )
    .increment(count);
}

/// Record an event delivered to the outbound stream.
pub fn event_emitted(kind: EventKind) {
    counter!(
        "lightning_pubsub_events_emitted_total",
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record a subscription that returned an error.
pub fn subscription_failed(source: SourceKind) {
    counter!(
        "lightning_pubsub_subscription_failures_total",
        "source" => source.as_str()
    )
    .increment(1);
}

/// Record a failed ticker probe.
pub fn ticker_error(probe: &'static str) {
    counter!(
        "lightning_pubsub_ticker_errors_total",
        "probe" => probe
    )
    .increment(1);
}

/// Update the outstanding worker gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_outstanding_workers(count: usize) {
    gauge!("lightning_pubsub_outstanding_workers").set(count as f64);
}

// =============================================================================
// Tests
// =============================================================================
