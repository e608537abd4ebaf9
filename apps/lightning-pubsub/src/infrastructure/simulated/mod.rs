//! Simulated Lightning Node
//!
//! A [`NetworkBackend`] that fabricates plausible node activity so the
//! pub/sub pipeline can run without a real node. Each subscription emits a
//! record roughly every `record_interval` (with ±50% jitter) until
//! cancelled. Channel and invoice activity also mutates the node snapshot,
//! so the ticker observes consistent changes.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{BackendError, NetworkBackend};
use crate::domain::records::{
    ChannelEdgeUpdate, ChannelUpdate, ChannelUpdateKind, ChannelsBalance, Invoice, NodeInfo,
    RoutingDirection, RoutingEvent, RoutingPolicy, RoutingStatus, Transaction, WalletBalance,
};
use crate::infrastructure::config::SimulationSettings;

/// Mutable node state behind the simulation.
#[derive(Debug)]
struct NodeState {
    info: NodeInfo,
    channels_balance: ChannelsBalance,
    wallet_balance: WalletBalance,
    next_add_index: u64,
    next_settle_index: u64,
    next_htlc_id: u64,
}

impl NodeState {
    fn new() -> Self {
        Self {
            info: NodeInfo {
                pub_key: random_hex(33),
                alias: "simnet-node".to_string(),
                num_pending_channels: 0,
                num_active_channels: 3,
                num_inactive_channels: 1,
                num_peers: 4,
                block_height: 800_000,
                block_hash: random_hex(32),
                synced_to_chain: true,
            },
            channels_balance: ChannelsBalance {
                balance: 2_500_000,
                pending_open_balance: 0,
            },
            wallet_balance: WalletBalance {
                total_balance: 1_000_000,
                confirmed_balance: 1_000_000,
                unconfirmed_balance: 0,
            },
            next_add_index: 1,
            next_settle_index: 1,
            next_htlc_id: 1,
        }
    }

    fn invoice(&mut self) -> Invoice {
        let mut rng = rand::rng();
        let value = rng.random_range(1_000..250_000);
        let settled = rng.random_bool(0.5);
        let now = Utc::now();

        let add_index = self.next_add_index;
        self.next_add_index += 1;

        let settle_index = if settled {
            let index = self.next_settle_index;
            self.next_settle_index += 1;
            self.channels_balance.balance += value;
            index
        } else {
            0
        };

        Invoice {
            add_index,
            settle_index,
            payment_hash: random_hex(32),
            memo: format!("simulated invoice #{add_index}"),
            value,
            amount_paid_msat: if settled { value * 1000 } else { 0 },
            settled,
            creation_date: now,
            settle_date: settled.then_some(now),
            payment_request: format!("lnbcrt{value}n1{}", random_hex(20)),
        }
    }

    fn transaction(&mut self) -> Transaction {
        let mut rng = rand::rng();
        let amount = rng.random_range(-500_000..500_000);
        let fees = rng.random_range(150..2_000);
        let confirmations = rng.random_range(0..6);

        if confirmations == 0 {
            self.wallet_balance.unconfirmed_balance += amount;
        } else {
            self.wallet_balance.confirmed_balance += amount;
        }
        self.wallet_balance.total_balance += amount;

        Transaction {
            tx_hash: random_hex(32),
            amount,
            num_confirmations: confirmations,
            block_hash: if confirmations > 0 {
                self.info.block_hash.clone()
            } else {
                String::new()
            },
            block_height: if confirmations > 0 {
                self.info.block_height
            } else {
                0
            },
            time_stamp: Utc::now(),
            total_fees: fees,
            dest_addresses: vec![format!("bcrt1q{}", random_hex(20))],
        }
    }

    fn routing_event(&mut self) -> RoutingEvent {
        let mut rng = rand::rng();

        // Roughly one in five notifications is a bare ack with no content.
        if rng.random_bool(0.2) {
            return RoutingEvent::default();
        }

        let htlc_id = self.next_htlc_id;
        self.next_htlc_id += 1;

        let status = match rng.random_range(0..4) {
            0 => RoutingStatus::Active,
            1 => RoutingStatus::Settled,
            2 => RoutingStatus::Failed,
            _ => RoutingStatus::LinkFailed,
        };
        let failed = matches!(status, RoutingStatus::Failed | RoutingStatus::LinkFailed);

        RoutingEvent {
            incoming_channel_id: rng.random_range(1..u64::from(u32::MAX)),
            outgoing_channel_id: rng.random_range(1..u64::from(u32::MAX)),
            incoming_htlc_id: htlc_id,
            outgoing_htlc_id: htlc_id,
            direction: RoutingDirection::Forward,
            status,
            amount_msat: rng.random_range(1_000..10_000_000),
            fee_msat: rng.random_range(0..5_000),
            failure_code: failed.then_some(15),
            failure_detail: failed.then(|| "insufficient balance".to_string()),
            last_update: Some(Utc::now()),
        }
    }

    fn channel_update(&mut self) -> ChannelUpdate {
        let mut rng = rand::rng();
        let info = &mut self.info;

        let kind = match rng.random_range(0..5) {
            0 => {
                info.num_pending_channels += 1;
                self.channels_balance.pending_open_balance += 100_000;
                ChannelUpdateKind::Pending
            }
            1 if info.num_pending_channels > 0 => {
                info.num_pending_channels -= 1;
                info.num_active_channels += 1;
                info.num_peers += 1;
                self.channels_balance.pending_open_balance -= 100_000;
                self.channels_balance.balance += 100_000;
                ChannelUpdateKind::Open
            }
            2 if info.num_inactive_channels > 0 => {
                info.num_inactive_channels -= 1;
                info.num_peers = info.num_peers.saturating_sub(1);
                ChannelUpdateKind::Closed
            }
            3 if info.num_active_channels > 0 => {
                info.num_active_channels -= 1;
                info.num_inactive_channels += 1;
                ChannelUpdateKind::Inactive
            }
            _ if info.num_inactive_channels > 0 => {
                info.num_inactive_channels -= 1;
                info.num_active_channels += 1;
                ChannelUpdateKind::Active
            }
            _ => {
                info.num_pending_channels += 1;
                self.channels_balance.pending_open_balance += 100_000;
                ChannelUpdateKind::Pending
            }
        };

        ChannelUpdate {
            kind,
            channel_point: format!("{}:{}", random_hex(32), rng.random_range(0..4)),
        }
    }

    fn edge_update(&mut self) -> ChannelEdgeUpdate {
        let mut rng = rand::rng();
        let policy = rng.random_bool(0.8).then(|| RoutingPolicy {
            time_lock_delta: rng.random_range(18..144),
            min_htlc_msat: 1_000,
            fee_base_msat: rng.random_range(0..2_000),
            fee_rate_milli_msat: rng.random_range(1..2_500),
            disabled: rng.random_bool(0.1),
        });

        ChannelEdgeUpdate {
            chan_id: rng.random_range(1..u64::MAX),
            chan_point: format!("{}:{}", random_hex(32), rng.random_range(0..4)),
            capacity: rng.random_range(20_000..16_777_215),
            routing_policy: policy,
            advertising_node: random_hex(33),
            connecting_node: random_hex(33),
        }
    }

    fn tick_chain(&mut self) {
        let mut rng = rand::rng();
        if rng.random_bool(0.3) {
            self.info.block_height += 1;
            self.info.block_hash = random_hex(32);
            if self.wallet_balance.unconfirmed_balance != 0 {
                self.wallet_balance.confirmed_balance += self.wallet_balance.unconfirmed_balance;
                self.wallet_balance.unconfirmed_balance = 0;
            }
        }
    }
}

/// Random lowercase hex string of `bytes` bytes.
fn random_hex(bytes: usize) -> String {
    use std::fmt::Write;

    let mut rng = rand::rng();
    (0..bytes).fold(String::with_capacity(bytes * 2), |mut out, _| {
        let _ = write!(out, "{:02x}", rng.random::<u8>());
        out
    })
}

/// `interval` with ±50% jitter, never below 1ms.
fn jittered(interval: Duration) -> Duration {
    let base = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(2);
    let low = base / 2;
    let high = base.saturating_add(base / 2);
    Duration::from_millis(rand::rng().random_range(low..=high))
}

/// In-process stand-in for a Lightning node.
#[derive(Debug)]
pub struct SimulatedNetwork {
    record_interval: Duration,
    state: Mutex<NodeState>,
}

impl SimulatedNetwork {
    /// Create a simulated node.
    #[must_use]
    pub fn new(settings: &SimulationSettings) -> Self {
        Self {
            record_interval: settings.record_interval,
            state: Mutex::new(NodeState::new()),
        }
    }

    fn next_delay(&self) -> Duration {
        jittered(self.record_interval)
    }

    /// Push generated records into `tx` until cancelled or the receiver
    /// goes away.
    async fn stream<R, G>(
        &self,
        source: &'static str,
        cancel: CancellationToken,
        tx: mpsc::Sender<R>,
        mut generate: G,
    ) -> Result<(), BackendError>
    where
        R: Send,
        G: FnMut(&mut NodeState) -> R + Send,
    {
        tracing::debug!(source, "Simulated subscription started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.next_delay()) => {}
            }

            let record = generate(&mut *self.state.lock());

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                sent = tx.send(record) => {
                    if sent.is_err() {
                        tracing::debug!(source, "Record queue closed");
                        break;
                    }
                }
            }
        }

        tracing::debug!(source, "Simulated subscription finished");
        Ok(())
    }
}

#[async_trait]
impl NetworkBackend for SimulatedNetwork {
    async fn subscribe_invoices(
        &self,
        cancel: CancellationToken,
        tx: mpsc::Sender<Invoice>,
    ) -> Result<(), BackendError> {
        self.stream("invoices", cancel, tx, NodeState::invoice).await
    }

    async fn subscribe_transactions(
        &self,
        cancel: CancellationToken,
        tx: mpsc::Sender<Transaction>,
    ) -> Result<(), BackendError> {
        self.stream("transactions", cancel, tx, NodeState::transaction)
            .await
    }

    async fn subscribe_routing_events(
        &self,
        cancel: CancellationToken,
        tx: mpsc::Sender<RoutingEvent>,
    ) -> Result<(), BackendError> {
        self.stream("routing_updates", cancel, tx, NodeState::routing_event)
            .await
    }

    async fn subscribe_graph_events(
        &self,
        cancel: CancellationToken,
        tx: mpsc::Sender<ChannelEdgeUpdate>,
    ) -> Result<(), BackendError> {
        self.stream("graph_updates", cancel, tx, NodeState::edge_update)
            .await
    }

    async fn subscribe_channels(
        &self,
        cancel: CancellationToken,
        tx: mpsc::Sender<ChannelUpdate>,
    ) -> Result<(), BackendError> {
        self.stream("channels", cancel, tx, NodeState::channel_update)
            .await
    }

    async fn get_info(&self) -> Result<NodeInfo, BackendError> {
        let mut state = self.state.lock();
        state.tick_chain();
        Ok(state.info.clone())
    }

    async fn get_channels_balance(&self) -> Result<ChannelsBalance, BackendError> {
        Ok(self.state.lock().channels_balance)
    }

    async fn get_wallet_balance(&self) -> Result<WalletBalance, BackendError> {
        Ok(self.state.lock().wallet_balance)
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::timeout;

    use super::*;

    fn fast() -> SimulatedNetwork {
        SimulatedNetwork::new(&SimulationSettings {
            record_interval: Duration::from_millis(4),
        })
    }

    #[test]
    fn random_hex_has_requested_length() {
        let hex = random_hex(32);
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn jitter_stays_within_half_the_interval() {
        for _ in 0..100 {
            let delay = jittered(Duration::from_millis(1_000));
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1_500));
        }
        assert!(jittered(Duration::ZERO) >= Duration::from_millis(1));
    }

    #[test]
    fn jitter_saturates_on_huge_intervals() {
        let delay = jittered(Duration::from_millis(u64::MAX));
        assert!(delay >= Duration::from_millis(u64::MAX / 2));
    }

    #[tokio::test]
    async fn huge_interval_with_cancelled_token_returns() {
        let network = SimulatedNetwork::new(&SimulationSettings {
            record_interval: Duration::from_millis(u64::MAX),
        });
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (tx, _rx) = mpsc::channel(1);

        let result = timeout(
            Duration::from_secs(2),
            network.subscribe_invoices(cancel, tx),
        )
        .await
        .unwrap();
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn invoice_indexes_increase() {
        let mut state = NodeState::new();
        let first = state.invoice();
        let second = state.invoice();
        assert_eq!(first.add_index + 1, second.add_index);
        assert_eq!(first.settled, first.settle_date.is_some());
    }

    #[test]
    fn channel_updates_keep_counts_consistent() {
        let mut state = NodeState::new();
        for _ in 0..200 {
            let before = state.info.clone();
            let update = state.channel_update();
            let info = &state.info;
            match update.kind {
                ChannelUpdateKind::Pending => {
                    assert_eq!(info.num_pending_channels, before.num_pending_channels + 1);
                }
                ChannelUpdateKind::Open => {
                    assert_eq!(info.num_active_channels, before.num_active_channels + 1);
                }
                ChannelUpdateKind::Closed => {
                    assert_eq!(info.num_inactive_channels + 1, before.num_inactive_channels);
                }
                ChannelUpdateKind::Active => {
                    assert_eq!(info.num_active_channels, before.num_active_channels + 1);
                }
                ChannelUpdateKind::Inactive => {
                    assert_eq!(info.num_inactive_channels, before.num_inactive_channels + 1);
                }
            }
            assert_eq!(
                state.channels_balance.pending_open_balance,
                i64::from(info.num_pending_channels) * 100_000
            );
        }
    }

    #[tokio::test]
    async fn subscription_emits_until_cancelled() {
        let network = fast();
        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(16);

        let task = {
            let cancel = cancel.clone();
            async move { network.subscribe_invoices(cancel, tx).await }
        };
        let handle = tokio::spawn(task);

        let first = timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert!(first.is_some());

        cancel.cancel();
        let result = timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn subscription_ends_when_receiver_dropped() {
        let network = fast();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let result = timeout(
            Duration::from_secs(2),
            network.subscribe_channels(CancellationToken::new(), tx),
        )
        .await
        .unwrap();
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn balances_reflect_activity() {
        let network = fast();
        let before = network.get_wallet_balance().await.unwrap();
        let tx = network.state.lock().transaction();
        let after = network.get_wallet_balance().await.unwrap();
        assert_eq!(after.total_balance, before.total_balance + tx.amount);
    }
}
