//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with external systems.

/// Port interfaces for external systems (the Lightning node).
pub mod ports;

/// Application services: stream adapters, ticker and the pub/sub controller.
pub mod services;
