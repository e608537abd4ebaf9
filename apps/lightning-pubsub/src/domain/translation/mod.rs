//! Record Translation
//!
//! Pure mapping from each streaming record type to the outbound event it
//! produces. Translation never fails; a record that is not worth surfacing
//! maps to `None`.
//!
//! | Record              | Event                                        |
//! |---------------------|----------------------------------------------|
//! | `Invoice`           | `InvoiceSettled` if settled, else `InvoiceCreated` |
//! | `Transaction`       | `TransactionCreated`                         |
//! | `RoutingEvent`      | `RoutingEventUpdated` + record, unless empty |
//! | `ChannelEdgeUpdate` | `GraphUpdated` + record                      |
//! | `ChannelUpdate`     | `ChannelActive` (record dropped)             |

use std::fmt;

use crate::domain::events::{Event, EventKind};
use crate::domain::records::{ChannelEdgeUpdate, ChannelUpdate, Invoice, RoutingEvent, Transaction};

/// The node subscription a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Invoice subscription.
    Invoices,
    /// Wallet transaction subscription.
    Transactions,
    /// HTLC event subscription.
    RoutingUpdates,
    /// Channel graph subscription.
    GraphUpdates,
    /// Local channel event subscription.
    Channels,
}

impl SourceKind {
    /// Every source, in the order the controller starts them.
    pub const ALL: [Self; 5] = [
        Self::Invoices,
        Self::Transactions,
        Self::RoutingUpdates,
        Self::Channels,
        Self::GraphUpdates,
    ];

    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoices => "invoices",
            Self::Transactions => "transactions",
            Self::RoutingUpdates => "routing_updates",
            Self::GraphUpdates => "graph_updates",
            Self::Channels => "channels",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record delivered by one of the node's subscriptions.
pub trait SourceRecord: Send + 'static {
    /// Subscription that produces this record type.
    const SOURCE: SourceKind;

    /// Map the record to the event it announces, if any.
    fn translate(self) -> Option<Event>;

    /// Emit a debug line for a freshly received record.
    fn trace_received(&self) {
        tracing::debug!(source = %Self::SOURCE, "Record received");
    }
}

impl SourceRecord for Invoice {
    const SOURCE: SourceKind = SourceKind::Invoices;

    fn translate(self) -> Option<Event> {
        if self.settled {
            Event::new(EventKind::InvoiceSettled)
        } else {
            Event::new(EventKind::InvoiceCreated)
        }
    }

    fn trace_received(&self) {
        tracing::debug!(
            source = %Self::SOURCE,
            add_index = self.add_index,
            payment_hash = %self.payment_hash,
            settled = self.settled,
            "Invoice received"
        );
    }
}

impl SourceRecord for Transaction {
    const SOURCE: SourceKind = SourceKind::Transactions;

    fn translate(self) -> Option<Event> {
        Event::new(EventKind::TransactionCreated)
    }

    fn trace_received(&self) {
        tracing::debug!(source = %Self::SOURCE, tx_hash = %self.tx_hash, "Transaction received");
    }
}

impl SourceRecord for RoutingEvent {
    const SOURCE: SourceKind = SourceKind::RoutingUpdates;

    fn translate(self) -> Option<Event> {
        if self.is_empty() {
            None
        } else {
            Some(Event::routing_updated(self))
        }
    }
}

impl SourceRecord for ChannelEdgeUpdate {
    const SOURCE: SourceKind = SourceKind::GraphUpdates;

    fn translate(self) -> Option<Event> {
        Some(Event::graph_updated(self))
    }
}

impl SourceRecord for ChannelUpdate {
    const SOURCE: SourceKind = SourceKind::Channels;

    fn translate(self) -> Option<Event> {
        Event::new(EventKind::ChannelActive)
    }

    fn trace_received(&self) {
        tracing::debug!(
            source = %Self::SOURCE,
            kind = ?self.kind,
            channel_point = %self.channel_point,
            "Channels updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;
    use crate::domain::events::EventData;
    use crate::domain::records::{ChannelUpdateKind, RoutingDirection, RoutingStatus};

    fn invoice(settled: bool) -> Invoice {
        Invoice {
            add_index: 42,
            settle_index: u64::from(settled),
            payment_hash: "7a1f".to_string(),
            memo: "coffee".to_string(),
            value: 2_100,
            amount_paid_msat: if settled { 2_100_000 } else { 0 },
            settled,
            creation_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            settle_date: None,
            payment_request: "lnbc21u1…".to_string(),
        }
    }

    fn transaction() -> Transaction {
        Transaction {
            tx_hash: "c0ffee".to_string(),
            amount: 50_000,
            num_confirmations: 0,
            block_hash: String::new(),
            block_height: 0,
            time_stamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            total_fees: 141,
            dest_addresses: vec!["bc1qexample".to_string()],
        }
    }

    fn forward() -> RoutingEvent {
        RoutingEvent {
            incoming_channel_id: 1,
            outgoing_channel_id: 2,
            direction: RoutingDirection::Forward,
            status: RoutingStatus::Settled,
            amount_msat: 1_000_000,
            fee_msat: 1_000,
            ..RoutingEvent::default()
        }
    }

    fn edge_update() -> ChannelEdgeUpdate {
        ChannelEdgeUpdate {
            chan_id: 7,
            chan_point: "ab:0".to_string(),
            capacity: 1_000_000,
            routing_policy: None,
            advertising_node: "02aa".to_string(),
            connecting_node: "03bb".to_string(),
        }
    }

    #[test_case(true, EventKind::InvoiceSettled ; "settled invoice")]
    #[test_case(false, EventKind::InvoiceCreated ; "open invoice")]
    fn invoice_maps_on_settled_flag(settled: bool, expected: EventKind) {
        let event = invoice(settled).translate().unwrap();
        assert_eq!(event.kind(), expected);
        assert!(event.data().is_none());
    }

    #[test]
    fn transaction_maps_to_created() {
        let event = transaction().translate().unwrap();
        assert_eq!(Some(event), Event::new(EventKind::TransactionCreated));
    }

    #[test]
    fn empty_routing_event_is_suppressed() {
        assert!(RoutingEvent::default().translate().is_none());
    }

    #[test]
    fn routing_event_carries_record() {
        let event = forward().translate().unwrap();
        assert_eq!(event.kind(), EventKind::RoutingEventUpdated);
        assert_eq!(event.data(), Some(&EventData::Routing(forward())));
    }

    #[test]
    fn edge_update_carries_record() {
        let event = edge_update().translate().unwrap();
        assert_eq!(event.kind(), EventKind::GraphUpdated);
        assert_eq!(event.data(), Some(&EventData::Graph(edge_update())));
    }

    #[test_case(ChannelUpdateKind::Pending ; "pending")]
    #[test_case(ChannelUpdateKind::Open ; "open")]
    #[test_case(ChannelUpdateKind::Closed ; "closed")]
    #[test_case(ChannelUpdateKind::Inactive ; "inactive")]
    fn channel_update_is_a_bare_trigger(kind: ChannelUpdateKind) {
        let update = ChannelUpdate {
            kind,
            channel_point: "ab:1".to_string(),
        };
        assert_eq!(update.translate(), Event::new(EventKind::ChannelActive));
    }

    #[test]
    fn source_labels_are_unique() {
        let mut labels: Vec<_> = SourceKind::ALL.iter().map(|s| s.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), SourceKind::ALL.len());
    }

    fn routing_event_strategy() -> impl Strategy<Value = RoutingEvent> {
        (
            0..3u64,
            0..3u64,
            0..2_000_000u64,
            0..2_000u64,
            proptest::option::of(0..30i32),
            prop_oneof![
                Just(RoutingStatus::Unknown),
                Just(RoutingStatus::Active),
                Just(RoutingStatus::Settled),
                Just(RoutingStatus::Failed),
                Just(RoutingStatus::LinkFailed),
            ],
        )
            .prop_map(|(incoming, outgoing, amount, fee, failure_code, status)| {
                RoutingEvent {
                    incoming_channel_id: incoming,
                    outgoing_channel_id: outgoing,
                    amount_msat: amount,
                    fee_msat: fee,
                    failure_code,
                    status,
                    ..RoutingEvent::default()
                }
            })
    }

    proptest! {
        #[test]
        fn routing_translation_is_deterministic(record in routing_event_strategy()) {
            let first = record.clone().translate();
            let second = record.clone().translate();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.is_none(), record.is_empty());
        }

        #[test]
        fn invoice_translation_is_deterministic(settled in any::<bool>(), value in 0..10_000_000i64) {
            let record = Invoice { value, ..invoice(settled) };
            prop_assert_eq!(record.clone().translate(), record.translate());
        }
    }
}
