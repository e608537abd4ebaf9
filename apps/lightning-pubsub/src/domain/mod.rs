//! Domain Layer - Node records, outbound events and the mapping between them.
//!
//! Everything here is synchronous and free of I/O; the application layer
//! moves these values between tasks.

/// Outbound event model.
pub mod events;

/// Records and snapshots produced by the node.
pub mod records;

/// Pure record-to-event mapping.
pub mod translation;
