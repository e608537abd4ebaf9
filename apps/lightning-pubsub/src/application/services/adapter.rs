//! Stream Adapter
//!
//! Bridges one node subscription to the shared event stream. Every adapter
//! runs the same three tasks, all spawned on the controller's tracker:
//!
//! ```text
//!              ┌────────────┐   records   ┌────────────┐   events
//!  node ──────►│ subscriber │────────────►│ translator │──────────► sink
//!              └─────▲──────┘   (queue)   └─────▲──────┘
//!                    │ cancel scope             │ close queue
//!              ┌─────┴──────────────────────────┴─────┐
//!  stop ──────►│               watcher                │
//!              └──────────────────────────────────────┘
//! ```
//!
//! The subscriber owns the queue's sender and ends when its scope is
//! cancelled or the node fails the stream. The translator owns the
//! receiver and ends once the queue is closed and drained. Only the
//! watcher decides when the queue closes.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::{Forward, forward};
use crate::application::ports::{BackendError, EventSender};
use crate::domain::translation::SourceRecord;
use crate::infrastructure::metrics;

/// Everything an adapter needs from the controller for one run.
#[derive(Clone)]
pub struct AdapterContext {
    /// Cancellation token each adapter scope is derived from.
    pub parent: CancellationToken,
    /// Broadcast stop signal.
    pub stop: CancellationToken,
    /// Outstanding worker tracker.
    pub tracker: TaskTracker,
    /// Shared outbound event stream.
    pub sink: EventSender,
    /// Capacity of the per-adapter record queue.
    pub queue_capacity: usize,
}

/// Spawn the subscriber, translator and watcher for record type `R`.
///
/// `subscribe` is called once, synchronously, with the adapter's
/// cancellation scope and the record queue sender; the returned future is
/// the long-running subscription.
pub fn spawn_adapter<R, F, Fut>(ctx: &AdapterContext, subscribe: F)
where
    R: SourceRecord,
    F: FnOnce(CancellationToken, mpsc::Sender<R>) -> Fut,
    Fut: Future<Output = Result<(), BackendError>> + Send + 'static,
{
    let source = R::SOURCE;
    let scope = ctx.parent.child_token();
    let queue_closed = CancellationToken::new();
    let (record_tx, record_rx) = mpsc::channel::<R>(ctx.queue_capacity);

    ctx.tracker.spawn(translate_records(
        record_rx,
        queue_closed.clone(),
        ctx.sink.clone(),
    ));

    let subscription = subscribe(scope.clone(), record_tx);
    ctx.tracker.spawn(async move {
        match subscription.await {
            Ok(()) => tracing::debug!(%source, "Subscription ended"),
            Err(e) => {
                metrics::subscription_failed(source);
                tracing::error!(%source, error = %e, "Subscription returned an error");
            }
        }
    });

    let stop = ctx.stop.clone();
    ctx.tracker.spawn(async move {
        stop.cancelled().await;
        scope.cancel();
        queue_closed.cancel();
        tracing::debug!(%source, "Adapter shut down");
    });

    tracing::debug!(%source, "Adapter started");
}

/// Translator loop: map queued records and forward the resulting events.
async fn translate_records<R: SourceRecord>(
    mut records: mpsc::Receiver<R>,
    queue_closed: CancellationToken,
    sink: EventSender,
) {
    let source = R::SOURCE;

    loop {
        let record = tokio::select! {
            biased;
            () = queue_closed.cancelled() => break,
            record = records.recv() => match record {
                Some(record) => record,
                None => {
                    tracing::debug!(%source, "Record queue drained after subscription ended");
                    return;
                }
            },
        };

        record.trace_received();
        metrics::record_received(source);

        let Some(event) = record.translate() else {
            metrics::record_suppressed(source);
            continue;
        };

        match forward(&sink, event, &queue_closed).await {
            Forward::Sent => {}
            Forward::Aborted => {
                metrics::records_dropped(source, 1);
                tracing::debug!(%source, "Queue closed while waiting on the event sink");
                break;
            }
            Forward::Disconnected => {
                tracing::warn!(%source, "Event consumer went away, stopping translator");
                return;
            }
        }
    }

    drain_closed_queue(&mut records, &sink);
}

/// Flush whatever was buffered when the queue closed, without blocking.
fn drain_closed_queue<R: SourceRecord>(records: &mut mpsc::Receiver<R>, sink: &EventSender) {
    let source = R::SOURCE;
    records.close();

    let mut dropped = 0u64;
    while let Ok(record) = records.try_recv() {
        metrics::record_received(source);
        let Some(event) = record.translate() else {
            metrics::record_suppressed(source);
            continue;
        };
        let kind = event.kind();
        match sink.try_send(event) {
            Ok(()) => metrics::event_emitted(kind),
            Err(TrySendError::Full(_) | TrySendError::Closed(_)) => dropped += 1,
        }
    }

    if dropped > 0 {
        metrics::records_dropped(source, dropped);
        tracing::debug!(%source, dropped, "Dropped buffered records at shutdown");
    }
    tracing::debug!(%source, "Translator finished");
}
