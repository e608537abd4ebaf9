//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer, plus process-wide concerns.

/// Configuration loaded from the environment.
pub mod config;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// In-process simulated Lightning node.
pub mod simulated;

/// Tracing and OpenTelemetry integration.
pub mod telemetry;
