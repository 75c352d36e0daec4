//! Load monitoring tasks: sampler, alert detector pump, and the event
//! coordinator.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn`. All tasks observe a [`CancellationToken`]
//! for graceful shutdown. Cross-task communication is exclusively through
//! bounded channels:
//!
//! ```text
//! sampler ──samples──▶ detector pump ──alerts──▶ coordinator ──▶ subscribers
//!    └──────samples────────────────────────────▶      ▲
//!                              ws handler ──joins─────┘
//! ```

pub mod coordinator;
pub mod provider;
pub mod sampler;

pub use coordinator::{
    Coordinator, Subscriber, ALERT_HISTORY_CAPACITY, OUTBOUND_QUEUE_CAPACITY,
    PLOT_HISTORY_CAPACITY,
};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use loadwatch_core::alert::{AlertDetector, AlertEvent};
use loadwatch_core::error::CoreError;
use loadwatch_core::load::{LoadProvider, Sample};

/// Capacity of the channels feeding the coordinator. Producers block when
/// the coordinator falls behind; an intentional throttle, not an error.
pub const EVENT_CHANNEL_CAPACITY: usize = 10;

/// Join handles for the three monitor tasks.
pub struct MonitorHandles {
    pub sampler: tokio::task::JoinHandle<Result<(), CoreError>>,
    pub detector: tokio::task::JoinHandle<()>,
    pub coordinator: tokio::task::JoinHandle<()>,
}

/// Wire up and spawn the monitor tasks.
///
/// Returns the join channel sender (handed to the WebSocket handler via
/// `AppState`) and the task handles for shutdown draining.
pub fn start(
    provider: Arc<dyn LoadProvider + Send + Sync>,
    sample_interval: Duration,
    cancel: CancellationToken,
) -> (mpsc::Sender<Subscriber>, MonitorHandles) {
    let (join_tx, join_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (plot_tx, plot_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (detect_tx, detect_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (alert_tx, alert_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let sampler = tokio::spawn(sampler::run(
        provider,
        sample_interval,
        plot_tx,
        detect_tx,
        cancel.clone(),
    ));
    let detector = tokio::spawn(run_detector(detect_rx, alert_tx, cancel.clone()));
    let coordinator = tokio::spawn(Coordinator::new().run(join_rx, plot_rx, alert_rx, cancel));

    (
        join_tx,
        MonitorHandles {
            sampler,
            detector,
            coordinator,
        },
    )
}

/// Pump samples through the hysteresis detector and emit alert events.
///
/// Owns the [`AlertDetector`] exclusively. Samples are processed one at a
/// time in arrival order, so detection stays deterministic.
async fn run_detector(
    mut samples: mpsc::Receiver<Sample>,
    alerts: mpsc::Sender<AlertEvent>,
    cancel: CancellationToken,
) {
    let mut detector = AlertDetector::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Alert detector stopping");
                break;
            }
            sample = samples.recv() => {
                let Some(sample) = sample else { break };
                if let Some(message) = detector.detect(sample.value) {
                    tracing::warn!(load = sample.value, %message, "Alert transition");
                    if alerts.send(AlertEvent::now(message)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}
