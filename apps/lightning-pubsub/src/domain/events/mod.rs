//! Outbound Event Model
//!
//! The single, uniformly typed value the pub/sub core hands to the
//! presentation layer. An event is a kind tag plus an optional payload;
//! only routing and graph updates carry one.
//!
//! # Wire Format (JSON)
//! ```json
//! {"kind": "invoice.settled", "data": null}
//! {"kind": "graph.updated", "data": {"chan_id": 1, "chan_point": "…", …}}
//! ```

use std::fmt;

use serde::Serialize;

use crate::domain::records::{ChannelEdgeUpdate, RoutingEvent};

// =============================================================================
// Event Kind
// =============================================================================

/// Everything the monitoring front end can be told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    /// A wallet transaction was seen.
    #[serde(rename = "transaction.created")]
    TransactionCreated,
    /// The node's best block changed.
    #[serde(rename = "block.received")]
    BlockReceived,
    /// An invoice was added.
    #[serde(rename = "invoice.created")]
    InvoiceCreated,
    /// An invoice was settled.
    #[serde(rename = "invoice.settled")]
    InvoiceSettled,
    /// The peer set changed.
    #[serde(rename = "peer.updated")]
    PeerUpdated,
    /// The pending channel count changed.
    #[serde(rename = "channel.pending")]
    ChannelPending,
    /// A channel changed state or the active channel count changed.
    #[serde(rename = "channel.active")]
    ChannelActive,
    /// The inactive channel count changed.
    #[serde(rename = "channel.inactive")]
    ChannelInactive,
    /// The aggregate channel balance changed.
    #[serde(rename = "channel.balance.updated")]
    ChannelBalanceUpdated,
    /// The on-chain wallet balance changed.
    #[serde(rename = "wallet.balance.updated")]
    WalletBalanceUpdated,
    /// An HTLC was routed, settled or failed.
    #[serde(rename = "routing.event.updated")]
    RoutingEventUpdated,
    /// A channel policy changed on the network graph.
    #[serde(rename = "graph.updated")]
    GraphUpdated,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::TransactionCreated,
        Self::BlockReceived,
        Self::InvoiceCreated,
        Self::InvoiceSettled,
        Self::PeerUpdated,
        Self::ChannelPending,
        Self::ChannelActive,
        Self::ChannelInactive,
        Self::ChannelBalanceUpdated,
        Self::WalletBalanceUpdated,
        Self::RoutingEventUpdated,
        Self::GraphUpdated,
    ];

    /// Stable dotted name, shared by logs, metric labels and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TransactionCreated => "transaction.created",
            Self::BlockReceived => "block.received",
            Self::InvoiceCreated => "invoice.created",
            Self::InvoiceSettled => "invoice.settled",
            Self::PeerUpdated => "peer.updated",
            Self::ChannelPending => "channel.pending",
            Self::ChannelActive => "channel.active",
            Self::ChannelInactive => "channel.inactive",
            Self::ChannelBalanceUpdated => "channel.balance.updated",
            Self::WalletBalanceUpdated => "wallet.balance.updated",
            Self::RoutingEventUpdated => "routing.event.updated",
            Self::GraphUpdated => "graph.updated",
        }
    }

    /// Whether events of this kind carry a payload.
    #[must_use]
    pub const fn carries_data(self) -> bool {
        matches!(self, Self::RoutingEventUpdated | Self::GraphUpdated)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Event
// =============================================================================

/// Payload attached to data-carrying events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    /// The routed HTLC.
    Routing(RoutingEvent),
    /// The graph edge update.
    Graph(ChannelEdgeUpdate),
}

/// An event delivered to the presentation layer.
///
/// `data` is present exactly when [`EventKind::carries_data`] is true for
/// `kind`. The constructors uphold that; consumers should still match on
/// `data` rather than infer a payload from the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    kind: EventKind,
    data: Option<EventData>,
}

impl Event {
    /// Create a payload-free event.
    ///
    /// Returns `None` for data-carrying kinds; those are built with
    /// [`Event::routing_updated`] or [`Event::graph_updated`].
    #[must_use]
    pub const fn new(kind: EventKind) -> Option<Self> {
        if kind.carries_data() {
            None
        } else {
            Some(Self { kind, data: None })
        }
    }

    /// A `RoutingEventUpdated` event carrying the routed HTLC.
    #[must_use]
    pub const fn routing_updated(record: RoutingEvent) -> Self {
        Self {
            kind: EventKind::RoutingEventUpdated,
            data: Some(EventData::Routing(record)),
        }
    }

    /// A `GraphUpdated` event carrying the edge update.
    #[must_use]
    pub const fn graph_updated(update: ChannelEdgeUpdate) -> Self {
        Self {
            kind: EventKind::GraphUpdated,
            data: Some(EventData::Graph(update)),
        }
    }

    /// The event kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// The payload, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&EventData> {
        self.data.as_ref()
    }

    /// Consume the event and return its payload.
    #[must_use]
    pub fn into_data(self) -> Option<EventData> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_update() -> ChannelEdgeUpdate {
        ChannelEdgeUpdate {
            chan_id: 812_345_678_901_234,
            chan_point: "9f2c…:1".to_string(),
            capacity: 2_000_000,
            routing_policy: None,
            advertising_node: "02aa".to_string(),
            connecting_node: "03bb".to_string(),
        }
    }

    #[test]
    fn only_routing_and_graph_carry_data() {
        let carrying: Vec<_> = EventKind::ALL
            .into_iter()
            .filter(|k| k.carries_data())
            .collect();
        assert_eq!(
            carrying,
            vec![EventKind::RoutingEventUpdated, EventKind::GraphUpdated]
        );
    }

    #[test]
    fn plain_event_has_no_data() {
        let event = Event::new(EventKind::InvoiceSettled).unwrap();
        assert_eq!(event.kind(), EventKind::InvoiceSettled);
        assert!(event.data().is_none());
    }

    #[test]
    fn graph_event_keeps_payload() {
        let event = Event::graph_updated(edge_update());
        assert_eq!(event.kind(), EventKind::GraphUpdated);
        assert_eq!(event.into_data(), Some(EventData::Graph(edge_update())));
    }

    #[test]
    fn display_matches_serialized_name() {
        for kind in EventKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn event_serializes_kind_and_data() {
        let json = serde_json::to_value(Event::new(EventKind::ChannelActive).unwrap()).unwrap();
        assert_eq!(json["kind"], "channel.active");
        assert!(json["data"].is_null());

        let json = serde_json::to_value(Event::graph_updated(edge_update())).unwrap();
        assert_eq!(json["kind"], "graph.updated");
        assert_eq!(json["data"]["capacity"], 2_000_000);
    }

    #[test]
    fn new_refuses_data_carrying_kinds() {
        for kind in EventKind::ALL {
            match Event::new(kind) {
                Some(event) => {
                    assert!(!kind.carries_data(), "{kind} built without a payload");
                    assert_eq!(event.kind(), kind);
                    assert!(event.data().is_none());
                }
                None => assert!(kind.carries_data(), "{kind} rejected"),
            }
        }
        assert_eq!(Event::new(EventKind::GraphUpdated), None);
        assert_eq!(Event::new(EventKind::RoutingEventUpdated), None);
    }
}
