//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `NetworkBackend`: streaming subscriptions and point-in-time queries
//!   against the Lightning node
//!
//! ## Driver Ports (Inbound)
//!
//! - The outbound `EventSender` handed to `PubSub::run`

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::events::Event;
use crate::domain::records::{
    ChannelEdgeUpdate, ChannelUpdate, ChannelsBalance, Invoice, NodeInfo, RoutingEvent,
    Transaction, WalletBalance,
};

/// Sender half of the outbound event stream.
pub type EventSender = mpsc::Sender<Event>;

/// Receiver half of the outbound event stream.
pub type EventReceiver = mpsc::Receiver<Event>;

/// Errors reported by a [`NetworkBackend`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The node rejected or failed an RPC.
    #[error("{method} failed: {message}")]
    Rpc {
        /// RPC method name.
        method: &'static str,
        /// Error reported by the node.
        message: String,
    },

    /// The node could not be reached.
    #[error("node unavailable: {0}")]
    Unavailable(String),

    /// The node ended a subscription stream without being cancelled.
    #[error("subscription stream closed by node")]
    StreamClosed,
}

/// Lightning node operations the pub/sub core depends on.
///
/// Every `subscribe_*` call is long-running: it pushes records into `tx`
/// until `cancel` fires (returning `Ok(())`) or the stream breaks
/// (returning an error). Implementations must return promptly once
/// `cancel` is cancelled, and should also stop when `tx` reports the
/// receiver has gone away.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkBackend: Send + Sync + 'static {
    /// Stream invoice additions and settlements.
    async fn subscribe_invoices(
        &self,
        cancel: CancellationToken,
        tx: mpsc::Sender<Invoice>,
    ) -> Result<(), BackendError>;

    /// Stream wallet transactions.
    async fn subscribe_transactions(
        &self,
        cancel: CancellationToken,
        tx: mpsc::Sender<Transaction>,
    ) -> Result<(), BackendError>;

    /// Stream HTLC routing events.
    async fn subscribe_routing_events(
        &self,
        cancel: CancellationToken,
        tx: mpsc::Sender<RoutingEvent>,
    ) -> Result<(), BackendError>;

    /// Stream channel graph edge updates.
    async fn subscribe_graph_events(
        &self,
        cancel: CancellationToken,
        tx: mpsc::Sender<ChannelEdgeUpdate>,
    ) -> Result<(), BackendError>;

    /// Stream state changes of the node's own channels.
    async fn subscribe_channels(
        &self,
        cancel: CancellationToken,
        tx: mpsc::Sender<ChannelUpdate>,
    ) -> Result<(), BackendError>;

    /// Fetch general node information.
    async fn get_info(&self) -> Result<NodeInfo, BackendError>;

    /// Fetch the aggregate channel balance.
    async fn get_channels_balance(&self) -> Result<ChannelsBalance, BackendError>;

    /// Fetch the on-chain wallet balance.
    async fn get_wallet_balance(&self) -> Result<WalletBalance, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_error_names_method() {
        let err = BackendError::Rpc {
            method: "SubscribeInvoices",
            message: "permission denied".to_string(),
        };
        assert_eq!(err.to_string(), "SubscribeInvoices failed: permission denied");
    }
}
