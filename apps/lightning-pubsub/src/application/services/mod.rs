//! Application Services
//!
//! Services that move records from the node to the presentation layer.
//!
//! - `adapter`: generic per-subscription worker trio
//! - `ticker`: periodic state poller
//! - `pubsub`: the controller that starts and stops everything together

pub mod adapter;
pub mod pubsub;
pub mod ticker;

pub use adapter::{AdapterContext, spawn_adapter};
pub use pubsub::{LifecycleState, PubSub, PubSubConfig, PubSubError, StopHandle};
pub use ticker::{Ticker, TickerConfig, info_changes};

use tokio_util::sync::CancellationToken;

use crate::application::ports::EventSender;
use crate::domain::events::Event;
use crate::infrastructure::metrics;

/// Outcome of handing one event to the shared sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Forward {
    /// The consumer accepted the event.
    Sent,
    /// `abort` fired while the sink was full; the event was dropped.
    Aborted,
    /// The consumer dropped its receiver.
    Disconnected,
}

/// Send `event` to `sink`, giving up if `abort` fires first.
pub(crate) async fn forward(
    sink: &EventSender,
    event: Event,
    abort: &CancellationToken,
) -> Forward {
    let kind = event.kind();
    tokio::select! {
        biased;
        sent = sink.send(event) => match sent {
            Ok(()) => {
                metrics::event_emitted(kind);
                Forward::Sent
            }
            Err(_) => Forward::Disconnected,
        },
        () = abort.cancelled() => Forward::Aborted,
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::events::EventKind;

    fn block() -> Event {
        Event::new(EventKind::BlockReceived).unwrap()
    }

    #[tokio::test]
    async fn forward_delivers_when_there_is_room() {
        let (sink, mut events) = mpsc::channel(1);
        let abort = CancellationToken::new();

        let outcome = forward(&sink, block(), &abort).await;

        assert_eq!(outcome, Forward::Sent);
        assert_eq!(events.recv().await.unwrap().kind(), EventKind::BlockReceived);
    }

    #[tokio::test]
    async fn forward_gives_up_on_abort() {
        let (sink, _events) = mpsc::channel(1);
        sink.send(Event::new(EventKind::PeerUpdated).unwrap())
            .await
            .unwrap();
        let abort = CancellationToken::new();
        abort.cancel();

        let outcome = forward(&sink, block(), &abort).await;

        assert_eq!(outcome, Forward::Aborted);
    }

    #[tokio::test]
    async fn forward_reports_closed_consumer() {
        let (sink, events) = mpsc::channel(1);
        drop(events);

        let outcome = forward(&sink, block(), &CancellationToken::new()).await;

        assert_eq!(outcome, Forward::Disconnected);
    }
}
