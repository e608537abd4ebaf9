//! Node Record Models
//!
//! Records pushed by the node's streaming subscriptions and the snapshots
//! returned by its point-in-time queries. The pub/sub core treats them as
//! payloads: it reads `Invoice::settled`, `Transaction::tx_hash` and
//! `RoutingEvent::is_empty` and forwards everything else untouched.
//!
//! Amounts are expressed in satoshis unless the field name says `msat`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Streaming Records
// =============================================================================

/// An invoice added to or settled by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Add index assigned by the node.
    pub add_index: u64,
    /// Settle index (0 until settled).
    pub settle_index: u64,
    /// Payment hash, hex encoded.
    pub payment_hash: String,
    /// Free-form description.
    pub memo: String,
    /// Requested value in satoshis.
    pub value: i64,
    /// Value actually paid in millisatoshis.
    pub amount_paid_msat: i64,
    /// Whether the invoice has been settled.
    pub settled: bool,
    /// Creation time.
    pub creation_date: DateTime<Utc>,
    /// Settle time, if settled.
    pub settle_date: Option<DateTime<Utc>>,
    /// BOLT-11 payment request.
    pub payment_request: String,
}

/// An on-chain wallet transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id, hex encoded.
    pub tx_hash: String,
    /// Net amount for the wallet in satoshis.
    pub amount: i64,
    /// Number of confirmations.
    pub num_confirmations: i32,
    /// Hash of the including block (empty while unconfirmed).
    pub block_hash: String,
    /// Height of the including block (0 while unconfirmed).
    pub block_height: u32,
    /// Time the wallet first saw the transaction.
    pub time_stamp: DateTime<Utc>,
    /// Fees paid in satoshis.
    pub total_fees: i64,
    /// Output addresses.
    pub dest_addresses: Vec<String>,
}

/// Direction of an HTLC relative to this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingDirection {
    /// Direction not reported.
    #[default]
    Unknown,
    /// Payment originating from this node.
    Send,
    /// Payment terminating at this node.
    Receive,
    /// Payment forwarded through this node.
    Forward,
}

/// Lifecycle status of a routed HTLC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStatus {
    /// Status not reported.
    #[default]
    Unknown,
    /// HTLC in flight.
    Active,
    /// HTLC settled.
    Settled,
    /// HTLC failed downstream.
    Failed,
    /// HTLC failed at the link level on this node.
    LinkFailed,
}

/// An HTLC event observed by the router.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoutingEvent {
    /// Incoming short channel id (0 when not applicable).
    pub incoming_channel_id: u64,
    /// Outgoing short channel id (0 when not applicable).
    pub outgoing_channel_id: u64,
    /// Incoming HTLC index.
    pub incoming_htlc_id: u64,
    /// Outgoing HTLC index.
    pub outgoing_htlc_id: u64,
    /// Direction relative to this node.
    pub direction: RoutingDirection,
    /// HTLC status.
    pub status: RoutingStatus,
    /// Forwarded amount in millisatoshis.
    pub amount_msat: u64,
    /// Fee earned in millisatoshis.
    pub fee_msat: u64,
    /// Wire failure code, when failed.
    pub failure_code: Option<i32>,
    /// Human readable failure detail, when failed.
    pub failure_detail: Option<String>,
    /// Time of the last state change.
    pub last_update: Option<DateTime<Utc>>,
}

impl RoutingEvent {
    /// Whether the event carries no meaningful information.
    ///
    /// The router emits bare notifications (e.g. subscription acks and
    /// settle events for HTLCs it never reported); those are not worth
    /// surfacing to the front end.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.incoming_channel_id == 0
            && self.outgoing_channel_id == 0
            && self.amount_msat == 0
            && self.fee_msat == 0
            && self.failure_code.is_none()
            && self.failure_detail.is_none()
            && self.status == RoutingStatus::Unknown
    }
}

/// Fee policy advertised for one direction of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoutingPolicy {
    /// CLTV delta required by the advertising node.
    pub time_lock_delta: u32,
    /// Minimum HTLC in millisatoshis.
    pub min_htlc_msat: u64,
    /// Base fee in millisatoshis.
    pub fee_base_msat: u64,
    /// Proportional fee in parts per million.
    pub fee_rate_milli_msat: u64,
    /// Whether the direction is disabled.
    pub disabled: bool,
}

/// A channel policy update gossiped on the network graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEdgeUpdate {
    /// Short channel id.
    pub chan_id: u64,
    /// Funding outpoint (`txid:index`).
    pub chan_point: String,
    /// Channel capacity in satoshis.
    pub capacity: i64,
    /// Updated policy, if announced.
    pub routing_policy: Option<RoutingPolicy>,
    /// Public key of the node that advertised the update.
    pub advertising_node: String,
    /// Public key of the node on the other end.
    pub connecting_node: String,
}

/// What happened to a local channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelUpdateKind {
    /// Funding transaction broadcast, awaiting confirmation.
    Pending,
    /// Channel opened.
    Open,
    /// Channel closed.
    Closed,
    /// Channel became active.
    Active,
    /// Channel became inactive.
    Inactive,
}

/// A state change on one of the node's own channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelUpdate {
    /// Kind of change.
    pub kind: ChannelUpdateKind,
    /// Funding outpoint (`txid:index`).
    pub channel_point: String,
}

// =============================================================================
// Point-in-time Snapshots
// =============================================================================

/// General node information.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Node public key.
    pub pub_key: String,
    /// Node alias.
    pub alias: String,
    /// Channels awaiting confirmation.
    pub num_pending_channels: u32,
    /// Active channels.
    pub num_active_channels: u32,
    /// Inactive channels.
    pub num_inactive_channels: u32,
    /// Connected peers.
    pub num_peers: u32,
    /// Best known block height.
    pub block_height: u32,
    /// Best known block hash.
    pub block_hash: String,
    /// Whether the node is synced to the chain.
    pub synced_to_chain: bool,
}

/// Aggregate balance locked in channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelsBalance {
    /// Local balance across open channels.
    pub balance: i64,
    /// Balance in channels still pending open.
    pub pending_open_balance: i64,
}

/// On-chain wallet balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Confirmed plus unconfirmed.
    pub total_balance: i64,
    /// Confirmed outputs.
    pub confirmed_balance: i64,
    /// Unconfirmed outputs.
    pub unconfirmed_balance: i64,
}
