//! State Ticker
//!
//! Polls point-in-time node state on a fixed interval and turns changes
//! into events on the shared stream. The first successful poll of each
//! probe only records a baseline.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{Forward, forward};
use crate::application::ports::{EventSender, NetworkBackend};
use crate::domain::events::{Event, EventKind};
use crate::domain::records::{ChannelsBalance, NodeInfo, WalletBalance};
use crate::infrastructure::config::TickerSettings;
use crate::infrastructure::metrics;

/// Which probes the ticker runs, and how often.
#[derive(Debug, Clone)]
pub struct TickerConfig {
    /// Polling interval.
    pub interval: Duration,
    /// Poll node info.
    pub info: bool,
    /// Poll the aggregate channel balance.
    pub channels_balance: bool,
    /// Poll the on-chain wallet balance.
    pub wallet_balance: bool,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self::from(TickerSettings::default())
    }
}

impl From<TickerSettings> for TickerConfig {
    fn from(settings: TickerSettings) -> Self {
        Self {
            interval: settings.interval,
            info: settings.info,
            channels_balance: settings.channels_balance,
            wallet_balance: settings.wallet_balance,
        }
    }
}

impl TickerConfig {
    /// Whether at least one probe is enabled.
    #[must_use]
    pub const fn any_enabled(&self) -> bool {
        self.info || self.channels_balance || self.wallet_balance
    }
}

/// Periodic poller feeding change events into the shared stream.
pub struct Ticker<B> {
    backend: Arc<B>,
    config: TickerConfig,
    sink: EventSender,
    stop: CancellationToken,
    info: Option<NodeInfo>,
    channels_balance: Option<ChannelsBalance>,
    wallet_balance: Option<WalletBalance>,
}

impl<B: NetworkBackend> Ticker<B> {
    /// Create a ticker that runs until `stop` fires.
    #[must_use]
    pub const fn new(
        backend: Arc<B>,
        config: TickerConfig,
        sink: EventSender,
        stop: CancellationToken,
    ) -> Self {
        Self {
            backend,
            config,
            sink,
            stop,
            info: None,
            channels_balance: None,
            wallet_balance: None,
        }
    }

    /// Run the polling loop until stopped or the consumer goes away.
    pub async fn run(mut self) {
        if !self.config.any_enabled() {
            tracing::debug!("No ticker probes enabled");
            return;
        }

        let stop = self.stop.clone();
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = stop.cancelled() => break,
                _ = interval.tick() => {}
            }

            let events = tokio::select! {
                biased;
                () = stop.cancelled() => break,
                events = self.poll() => events,
            };

            for event in events {
                match forward(&self.sink, event, &stop).await {
                    Forward::Sent => {}
                    Forward::Aborted => {
                        tracing::debug!("Ticker stopped");
                        return;
                    }
                    Forward::Disconnected => {
                        tracing::warn!("Event consumer went away, stopping ticker");
                        return;
                    }
                }
            }
        }

        tracing::debug!("Ticker stopped");
    }

    /// Run every enabled probe once and collect the resulting events.
    async fn poll(&mut self) -> Vec<Event> {
        let mut events = Vec::new();

        if self.config.info {
            match self.backend.get_info().await {
                Ok(info) => {
                    if let Some(previous) = &self.info {
                        events.extend(info_changes(previous, &info));
                    }
                    self.info = Some(info);
                }
                Err(e) => {
                    metrics::ticker_error("info");
                    tracing::warn!(probe = "info", error = %e, "Ticker probe failed");
                }
            }
        }

        if self.config.channels_balance {
            match self.backend.get_channels_balance().await {
                Ok(balance) => {
                    if self.channels_balance.is_some_and(|previous| previous != balance) {
                        events.extend(Event::new(EventKind::ChannelBalanceUpdated));
                    }
                    self.channels_balance = Some(balance);
                }
                Err(e) => {
                    metrics::ticker_error("channels_balance");
                    tracing::warn!(probe = "channels_balance", error = %e, "Ticker probe failed");
                }
            }
        }

        if self.config.wallet_balance {
            match self.backend.get_wallet_balance().await {
                Ok(balance) => {
                    if self.wallet_balance.is_some_and(|previous| previous != balance) {
                        events.extend(Event::new(EventKind::WalletBalanceUpdated));
                    }
                    self.wallet_balance = Some(balance);
                }
                Err(e) => {
                    metrics::ticker_error("wallet_balance");
                    tracing::warn!(probe = "wallet_balance", error = %e, "Ticker probe failed");
                }
            }
        }

        events
    }
}

/// Events implied by the difference between two node info snapshots.
#[must_use]
pub fn info_changes(previous: &NodeInfo, current: &NodeInfo) -> Vec<Event> {
    let mut events = Vec::new();

    if previous.block_height != current.block_height {
        events.extend(Event::new(EventKind::BlockReceived));
    }
    if previous.num_peers != current.num_peers {
        events.extend(Event::new(EventKind::PeerUpdated));
    }
    if previous.num_pending_channels != current.num_pending_channels {
        events.extend(Event::new(EventKind::ChannelPending));
    }
    if previous.num_active_channels != current.num_active_channels {
        events.extend(Event::new(EventKind::ChannelActive));
    }
    if previous.num_inactive_channels != current.num_inactive_channels {
        events.extend(Event::new(EventKind::ChannelInactive));
    }

    events
}
