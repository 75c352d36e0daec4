//! Single-owner event coordinator.
//!
//! The coordinator is the sole owner of the subscriber registry and both
//! history buffers. It multiplexes subscriber joins, plot samples, and
//! alert events into one serialized stream and handles exactly one event
//! fully per loop iteration — that serialization is what makes the shared
//! state safe without locking.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use loadwatch_core::alert::AlertEvent;
use loadwatch_core::history::HistoryQueue;
use loadwatch_core::load::Sample;
use loadwatch_core::message::OutboundMessage;

/// Capacity of the plot history (ten minutes at the 10-second cadence).
pub const PLOT_HISTORY_CAPACITY: usize = 60;

/// Capacity of the alert history. Alerts are rare, so this is a deep
/// buffer; the bound keeps a long-running process from growing without
/// limit.
pub const ALERT_HISTORY_CAPACITY: usize = 512;

/// Capacity of each subscriber's outbound queue. Sized to absorb a full
/// history replay plus bursts; a subscriber that cannot drain this many
/// messages counts as failed.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 1024;

/// Interval between heartbeat pings to subscribers (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// A registered push subscriber.
///
/// Identity is the remote socket address, assumed unique per live
/// connection. The outbound sender feeds the connection's forward task;
/// the coordinator never touches the socket directly.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub id: String,
    outbound: mpsc::Sender<Message>,
}

impl Subscriber {
    pub fn new(id: impl Into<String>, outbound: mpsc::Sender<Message>) -> Self {
        Self {
            id: id.into(),
            outbound,
        }
    }
}

/// Owner of subscriber state and history; the only writer-path to
/// subscriber connections.
pub struct Coordinator {
    subscribers: HashMap<String, Subscriber>,
    plot_history: HistoryQueue<OutboundMessage>,
    alert_history: HistoryQueue<OutboundMessage>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
            plot_history: HistoryQueue::new(),
            alert_history: HistoryQueue::new(),
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Number of buffered plot messages.
    pub fn plot_history_len(&self) -> usize {
        self.plot_history.len()
    }

    /// Number of buffered alert messages.
    pub fn alert_history_len(&self) -> usize {
        self.alert_history.len()
    }

    /// Run the coordinator loop until cancellation or until every input
    /// channel has closed.
    pub async fn run(
        mut self,
        mut joins: mpsc::Receiver<Subscriber>,
        mut samples: mpsc::Receiver<Sample>,
        mut alerts: mpsc::Receiver<AlertEvent>,
        cancel: CancellationToken,
    ) {
        let mut heartbeat = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Coordinator stopping");
                    break;
                }
                join = joins.recv() => match join {
                    Some(subscriber) => self.handle_join(subscriber),
                    None => break,
                },
                sample = samples.recv() => match sample {
                    Some(sample) => self.handle_sample(sample),
                    None => break,
                },
                alert = alerts.recv() => match alert {
                    Some(event) => self.handle_alert(event),
                    None => break,
                },
                _ = heartbeat.tick() => self.ping_all(),
            }
        }

        self.shutdown_all();
    }

    /// Register a subscriber and replay buffered history to it.
    ///
    /// An existing entry under the same identity is replaced: a reconnect
    /// from the same remote address supersedes the stale registration.
    /// Replay is two non-interleaved passes — every plot entry oldest to
    /// newest, then every alert entry oldest to newest — regardless of how
    /// the original timestamps interleave.
    pub fn handle_join(&mut self, subscriber: Subscriber) {
        let id = subscriber.id.clone();
        if self.subscribers.insert(id.clone(), subscriber).is_some() {
            tracing::warn!(
                subscriber = %id,
                "Duplicate subscriber identity, replacing previous registration"
            );
        }
        tracing::info!(
            subscriber = %id,
            total = self.subscribers.len(),
            "Subscriber joined"
        );
        self.replay_history(&id);
    }

    /// Broadcast a plot sample, then admit it to the plot history,
    /// evicting the oldest entry first when at capacity.
    pub fn handle_sample(&mut self, sample: Sample) {
        let msg = OutboundMessage::plot(&sample);
        self.broadcast(&msg);

        if self.plot_history.len() >= PLOT_HISTORY_CAPACITY {
            self.plot_history.pop_oldest();
        }
        self.plot_history.push(msg);
    }

    /// Broadcast an alert event, then append it to the alert history.
    pub fn handle_alert(&mut self, event: AlertEvent) {
        let msg = OutboundMessage::alert(&event);
        self.broadcast(&msg);

        if self.alert_history.len() >= ALERT_HISTORY_CAPACITY {
            self.alert_history.pop_oldest();
        }
        self.alert_history.push(msg);
    }

    /// Send a message to every registered subscriber.
    ///
    /// A delivery failure deregisters that subscriber only; the remaining
    /// deliveries in the same round are unaffected. A failure is not
    /// distinguished from a clean disconnect — both remove the entry.
    fn broadcast(&mut self, msg: &OutboundMessage) {
        let Some(frame) = encode(msg) else { return };

        let mut failed: Vec<String> = Vec::new();
        for (id, subscriber) in &self.subscribers {
            if subscriber.outbound.try_send(frame.clone()).is_err() {
                failed.push(id.clone());
            }
        }
        for id in failed {
            tracing::info!(subscriber = %id, "Could not deliver message, removing subscriber");
            self.subscribers.remove(&id);
        }
    }

    /// Replay both history buffers to a single subscriber, plots first.
    fn replay_history(&mut self, id: &str) {
        let Some(subscriber) = self.subscribers.get(id) else {
            return;
        };
        let outbound = subscriber.outbound.clone();

        for msg in self.plot_history.iter().chain(self.alert_history.iter()) {
            let Some(frame) = encode(msg) else { continue };
            if outbound.try_send(frame).is_err() {
                tracing::info!(subscriber = %id, "Replay delivery failed, removing subscriber");
                self.subscribers.remove(id);
                return;
            }
        }
        tracing::debug!(
            subscriber = %id,
            plots = self.plot_history.len(),
            alerts = self.alert_history.len(),
            "History replayed"
        );
    }

    /// Send a Ping frame to every subscriber to keep connections alive and
    /// surface stale ones.
    fn ping_all(&mut self) {
        let mut failed: Vec<String> = Vec::new();
        for (id, subscriber) in &self.subscribers {
            if subscriber
                .outbound
                .try_send(Message::Ping(Bytes::new()))
                .is_err()
            {
                failed.push(id.clone());
            }
        }
        for id in failed {
            tracing::info!(subscriber = %id, "Heartbeat failed, removing subscriber");
            self.subscribers.remove(&id);
        }
        tracing::debug!(count = self.subscribers.len(), "Heartbeat ping");
    }

    /// Send a Close frame to every subscriber, then clear the registry.
    fn shutdown_all(&mut self) {
        let count = self.subscribers.len();
        for subscriber in self.subscribers.values() {
            let _ = subscriber.outbound.try_send(Message::Close(None));
        }
        self.subscribers.clear();
        tracing::info!(count, "Closed all subscriber connections");
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode an outbound message as a JSON text frame.
fn encode(msg: &OutboundMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode outbound message");
            None
        }
    }
}
