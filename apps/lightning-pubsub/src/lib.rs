#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Lightning PubSub - Node Event Fan-in
//!
//! Subscribes to every streaming feed a Lightning node exposes (invoices,
//! wallet transactions, HTLC routing, network graph, channel state), polls
//! the node's summary state on a fixed interval, and turns all of it into a
//! single ordered-per-source stream of typed [`Event`]s for a UI to consume.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Node records and the events derived from them
//!   - `records`: Data pushed or returned by the node
//!   - `events`: Event kinds and payloads emitted to consumers
//!   - `translation`: Per-source record → event mapping
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: The `NetworkBackend` interface to the node
//!   - `services`: Stream adapters, state ticker, lifecycle controller
//!
//! - **Infrastructure**: Adapters and process-wide concerns
//!   - `config`: Environment configuration
//!   - `metrics`: Prometheus instrumentation
//!   - `simulated`: In-process simulated node
//!   - `telemetry`: Tracing and OpenTelemetry setup
//!
//! # Data Flow
//!
//! ```text
//! subscribe_invoices ───► [queue] ─► translator ──┐
//! subscribe_transactions ► [queue] ─► translator ──┤
//! subscribe_routing ────► [queue] ─► translator ──┼──► event sink ──► consumer
//! subscribe_channels ───► [queue] ─► translator ──┤
//! subscribe_graph ──────► [queue] ─► translator ──┤
//! get_info / balances ──► ticker ─────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Records, events and translation rules.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::events::{Event, EventData, EventKind};
pub use domain::records::{
    ChannelEdgeUpdate, ChannelUpdate, ChannelUpdateKind, ChannelsBalance, Invoice, NodeInfo,
    RoutingDirection, RoutingEvent, RoutingPolicy, RoutingStatus, Transaction, WalletBalance,
};
pub use domain::translation::{SourceKind, SourceRecord};

// Ports
pub use application::ports::{BackendError, EventReceiver, EventSender, NetworkBackend};

// Services
pub use application::services::{
    LifecycleState, PubSub, PubSubConfig, PubSubError, StopHandle, Ticker, TickerConfig,
};

// Infrastructure config
pub use infrastructure::config::{
    ConfigError, MonitorConfig, PubSubSettings, ServerSettings, SimulationSettings,
    TickerSettings,
};

// Simulated node
pub use infrastructure::simulated::SimulatedNetwork;

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
