//! PubSub Controller
//!
//! Starts one stream adapter per node subscription plus the state ticker,
//! all against a single outbound event stream, and tears them down
//! together.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──run()──► Running ──stop()──► Stopping ──all workers done──► Stopped
//! ```
//!
//! `run` returns only after every task it spawned has finished, so once it
//! returns nothing will send on the event stream again. A controller runs
//! once; it cannot be restarted after stopping.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::adapter::{AdapterContext, spawn_adapter};
use super::ticker::{Ticker, TickerConfig};
use crate::application::ports::{EventSender, NetworkBackend};
use crate::domain::records::{ChannelEdgeUpdate, ChannelUpdate, Invoice, RoutingEvent, Transaction};
use crate::infrastructure::config::{PubSubSettings, TickerSettings};
use crate::infrastructure::metrics;

// =============================================================================
// Configuration
// =============================================================================

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct PubSubConfig {
    /// Capacity of each per-subscription record queue.
    pub record_queue_capacity: usize,
    /// Ticker configuration.
    pub ticker: TickerConfig,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self::from_settings(PubSubSettings::default(), TickerSettings::default())
    }
}

impl PubSubConfig {
    /// Build from the loaded settings sections.
    #[must_use]
    pub fn from_settings(pubsub: PubSubSettings, ticker: TickerSettings) -> Self {
        Self {
            record_queue_capacity: pubsub.record_queue_capacity.max(1),
            ticker: TickerConfig::from(ticker),
        }
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Phase of a controller's single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, `run` not yet called.
    Idle,
    /// Workers spawned, waiting for stop.
    Running,
    /// Stop signalled, waiting for workers to finish.
    Stopping,
    /// Every worker finished; `run` has returned.
    Stopped,
}

/// Controller errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PubSubError {
    /// `run` was called on a controller that already ran.
    #[error("pubsub already started (state: {0:?})")]
    AlreadyStarted(LifecycleState),
}

/// State shared between the controller and its stop handles.
#[derive(Debug)]
struct Shared {
    stop: CancellationToken,
    stop_requested: AtomicBool,
    state: Mutex<LifecycleState>,
}

impl Shared {
    fn request_stop(&self) -> bool {
        if self.stop_requested.swap(true, Ordering::SeqCst) {
            tracing::debug!("Stop already requested, ignoring");
            return false;
        }

        {
            let mut state = self.state.lock();
            if *state == LifecycleState::Running {
                *state = LifecycleState::Stopping;
            }
        }

        self.stop.cancel();
        tracing::debug!("Received signal, gracefully stopping");
        true
    }
}

/// Cloneable trigger for [`PubSub::stop`].
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    /// Broadcast the stop signal.
    ///
    /// Returns `true` for the call that actually stopped the controller and
    /// `false` for every later call.
    pub fn stop(&self) -> bool {
        self.shared.request_stop()
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Fans every node subscription and the ticker into one event stream.
pub struct PubSub<B> {
    backend: Arc<B>,
    config: PubSubConfig,
    shared: Arc<Shared>,
    tracker: TaskTracker,
}

impl<B: NetworkBackend> PubSub<B> {
    /// Create a controller bound to `backend`.
    #[must_use]
    pub fn new(backend: Arc<B>, config: PubSubConfig) -> Self {
        Self {
            backend,
            config,
            shared: Arc::new(Shared {
                stop: CancellationToken::new(),
                stop_requested: AtomicBool::new(false),
                state: Mutex::new(LifecycleState::Idle),
            }),
            tracker: TaskTracker::new(),
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        *self.shared.state.lock()
    }

    /// Number of spawned workers that have not finished yet.
    #[must_use]
    pub fn outstanding_workers(&self) -> usize {
        self.tracker.len()
    }

    /// A handle that can stop this controller from another task.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Broadcast the stop signal to every adapter and the ticker.
    ///
    /// Safe to call from any task, any number of times; only the first call
    /// has an effect and returns `true`.
    pub fn stop(&self) -> bool {
        self.shared.request_stop()
    }

    /// Start every adapter and the ticker, then block until stopped.
    ///
    /// Each adapter's cancellation scope is a child of `parent`. Events are
    /// sent on `sink`. Returns once [`stop`](Self::stop) has been called and
    /// every spawned task has finished; subscription failures are logged,
    /// never returned.
    ///
    /// # Errors
    ///
    /// Returns [`PubSubError::AlreadyStarted`] if called more than once.
    pub async fn run(&self, parent: CancellationToken, sink: EventSender) -> Result<(), PubSubError> {
        {
            let mut state = self.shared.state.lock();
            if *state != LifecycleState::Idle {
                return Err(PubSubError::AlreadyStarted(*state));
            }
            *state = LifecycleState::Running;
        }

        tracing::debug!("Starting...");

        let ctx = AdapterContext {
            parent,
            stop: self.shared.stop.clone(),
            tracker: self.tracker.clone(),
            sink,
            queue_capacity: self.config.record_queue_capacity,
        };

        self.spawn_invoices(&ctx);
        self.spawn_transactions(&ctx);
        self.spawn_routing_updates(&ctx);
        self.spawn_channels(&ctx);
        self.spawn_graph_updates(&ctx);

        self.tracker.spawn(
            Ticker::new(
                Arc::clone(&self.backend),
                self.config.ticker.clone(),
                ctx.sink.clone(),
                self.shared.stop.clone(),
            )
            .run(),
        );
        drop(ctx);

        metrics::set_outstanding_workers(self.tracker.len());
        tracing::info!(workers = self.tracker.len(), "PubSub running");

        self.shared.stop.cancelled().await;
        {
            let mut state = self.shared.state.lock();
            if *state == LifecycleState::Running {
                *state = LifecycleState::Stopping;
            }
        }

        tracing::info!(
            outstanding = self.tracker.len(),
            "Stop received, waiting for workers"
        );
        self.tracker.close();
        self.tracker.wait().await;

        *self.shared.state.lock() = LifecycleState::Stopped;
        metrics::set_outstanding_workers(0);
        tracing::info!("PubSub stopped");
        Ok(())
    }

    fn spawn_invoices(&self, ctx: &AdapterContext) {
        let backend = Arc::clone(&self.backend);
        spawn_adapter(ctx, move |cancel, tx: mpsc::Sender<Invoice>| async move {
            backend.subscribe_invoices(cancel, tx).await
        });
    }

    fn spawn_transactions(&self, ctx: &AdapterContext) {
        let backend = Arc::clone(&self.backend);
        spawn_adapter(ctx, move |cancel, tx: mpsc::Sender<Transaction>| async move {
            backend.subscribe_transactions(cancel, tx).await
        });
    }

    fn spawn_routing_updates(&self, ctx: &AdapterContext) {
        let backend = Arc::clone(&self.backend);
        spawn_adapter(ctx, move |cancel, tx: mpsc::Sender<RoutingEvent>| async move {
            backend.subscribe_routing_events(cancel, tx).await
        });
    }

    fn spawn_channels(&self, ctx: &AdapterContext) {
        let backend = Arc::clone(&self.backend);
        spawn_adapter(ctx, move |cancel, tx: mpsc::Sender<ChannelUpdate>| async move {
            backend.subscribe_channels(cancel, tx).await
        });
    }

    fn spawn_graph_updates(&self, ctx: &AdapterContext) {
        let backend = Arc::clone(&self.backend);
        spawn_adapter(ctx, move |cancel, tx: mpsc::Sender<ChannelEdgeUpdate>| async move {
            backend.subscribe_graph_events(cancel, tx).await
        });
    }
}
