//! Fixed-cadence load sampling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use loadwatch_core::error::CoreError;
use loadwatch_core::load::{normalize_load, LoadProvider, Sample};

/// Sample the provider at a fixed cadence and fan each reading out to the
/// broadcast path and the alert path.
///
/// The core count is queried once before the loop; each tick then takes
/// one reading, normalizes it, and sends the identical [`Sample`] to both
/// consumers, so alert decisions and displayed values never disagree.
///
/// A provider failure or unparsable reading is fatal: the cancellation
/// token is triggered so the whole service shuts down, and the error is
/// returned for the exit code. There is no retry and no substituted value.
pub async fn run(
    provider: Arc<dyn LoadProvider + Send + Sync>,
    sample_interval: Duration,
    plots: mpsc::Sender<Sample>,
    detections: mpsc::Sender<Sample>,
    cancel: CancellationToken,
) -> Result<(), CoreError> {
    let num_cores = match provider.num_cores().await {
        Ok(n) => n,
        Err(e) => {
            tracing::error!(error = %e, "Could not determine core count, shutting down");
            cancel.cancel();
            return Err(e);
        }
    };

    tracing::info!(
        num_cores,
        interval_secs = sample_interval.as_secs(),
        "Sampler started"
    );

    let mut interval = tokio::time::interval(sample_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Sampler stopping");
                return Ok(());
            }
            _ = interval.tick() => {
                let raw = match provider.load_average().await {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::error!(error = %e, "Metric provider failed, shutting down");
                        cancel.cancel();
                        return Err(e);
                    }
                };

                let sample = Sample::now(normalize_load(raw, num_cores));
                tracing::debug!(load = sample.value, "Load sampled");

                // Bounded channels: block here when the coordinator or the
                // detector falls behind. Intentional throttle, not an error.
                if plots.send(sample).await.is_err() || detections.send(sample).await.is_err() {
                    tracing::info!("Sample consumers gone, sampler stopping");
                    return Ok(());
                }
            }
        }
    }
}
