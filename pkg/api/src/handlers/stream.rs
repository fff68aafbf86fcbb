//! Snapshot broadcaster: pushes the grouped service snapshot to one WebSocket viewer
//! on a fixed interval until the viewer goes away.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use pkg_metrics::Metrics;
use pkg_state::StatusStore;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite;
use tracing::{debug, error, info, warn};

use crate::AppState;

/// GET /ws: upgrade and stream snapshots until the viewer disconnects.
pub async fn stream_services(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let (sender, receiver) = socket.split();
        let broadcaster =
            SnapshotBroadcaster::new(state.store, state.metrics, state.snapshot_interval);
        let reason = broadcaster.run(sender, receiver).await;
        info!("Snapshot viewer finished: {:?}", reason);
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The viewer closed the connection or its read side failed.
    Disconnected,
    /// A push could not be delivered for a reason other than the viewer closing.
    PushFailed,
}

pub struct SnapshotBroadcaster {
    store: StatusStore,
    metrics: Arc<Metrics>,
    interval: Duration,
}

impl SnapshotBroadcaster {
    pub fn new(store: StatusStore, metrics: Arc<Metrics>, interval: Duration) -> Self {
        Self {
            store,
            metrics,
            interval,
        }
    }

    /// Push a snapshot every tick to `sink`. A separate task drains `source` only to
    /// notice the viewer going away. Slow pushes are not queued; missed ticks are skipped.
    pub async fn run<S, R>(&self, mut sink: S, source: R) -> StopReason
    where
        S: Sink<Message, Error = axum::Error> + Unpin,
        R: Stream<Item = Result<Message, axum::Error>> + Send + Unpin + 'static,
    {
        self.metrics.viewers.inc();
        let mut disconnected = tokio::spawn(wait_for_disconnect(source));
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let reason = loop {
            tokio::select! {
                biased;
                _ = &mut disconnected => break StopReason::Disconnected,
                _ = ticker.tick() => {
                    let groups = self.store.snapshot().await;
                    let payload = match serde_json::to_string(&groups) {
                        Ok(p) => p,
                        Err(e) => {
                            error!("Failed to encode snapshot: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(payload.into())).await {
                        // The read side may not have seen the close yet.
                        if is_close_error(&e) || disconnected.is_finished() {
                            debug!("Viewer closed during push: {}", e);
                            break StopReason::Disconnected;
                        }
                        warn!("WebSocket write failed: {}", e);
                        break StopReason::PushFailed;
                    }
                }
            }
        };

        disconnected.abort();
        self.metrics.viewers.dec();
        reason
    }
}

async fn wait_for_disconnect<R>(mut source: R)
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(msg) = source.next().await {
        match msg {
            Ok(Message::Close(_)) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

/// Normal or abnormal closure by the peer, as opposed to a real write failure.
fn is_close_error(err: &axum::Error) -> bool {
    use std::error::Error as _;
    use std::io::ErrorKind;

    match err
        .source()
        .and_then(|s| s.downcast_ref::<tungstenite::Error>())
    {
        Some(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => true,
        Some(tungstenite::Error::Protocol(
            tungstenite::error::ProtocolError::ResetWithoutClosingHandshake
            | tungstenite::error::ProtocolError::SendAfterClosing,
        )) => true,
        Some(tungstenite::Error::Io(e)) => matches!(
            e.kind(),
            ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
        ),
        _ => false,
    }
}
