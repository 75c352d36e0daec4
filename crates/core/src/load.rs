//! Normalized load samples and the metric provider seam.
//!
//! Pure logic — no system access. The OS-specific provider lives in the
//! API crate and is injected through [`LoadProvider`].

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::{now_millis, EpochMillis};

/// Normalized load readings are capped at this ceiling.
pub const LOAD_CEILING: f64 = 2.0;

/// Decimal places kept on a normalized reading.
const LOAD_PRECISION: u32 = 3;

/// One normalized load reading. Immutable once produced; the same sample
/// is delivered to both the broadcast path and the alert path so the two
/// can never disagree on the value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Normalized load, in `[0, LOAD_CEILING]`.
    pub value: f64,
    /// When the reading was taken (UTC epoch milliseconds).
    pub observed_at: EpochMillis,
}

impl Sample {
    /// Build a sample stamped with the current time.
    pub fn now(value: f64) -> Self {
        Self {
            value,
            observed_at: now_millis(),
        }
    }
}

/// Source of raw load figures, injected into the sampler.
///
/// `num_cores` is queried once at startup; `load_average` once per
/// sampling tick. Both calls failing is fatal to the service.
#[async_trait]
pub trait LoadProvider {
    /// The host's 1-minute load average, unnormalized.
    async fn load_average(&self) -> Result<f64, CoreError>;

    /// Number of available processing units.
    async fn num_cores(&self) -> Result<usize, CoreError>;
}

/// Normalize a raw load average: divide by the core count, cap at
/// [`LOAD_CEILING`], round half-up to three decimal places.
pub fn normalize_load(raw: f64, num_cores: usize) -> f64 {
    let normalized = (raw / num_cores as f64).min(LOAD_CEILING);
    round_half_up(normalized, LOAD_PRECISION)
}

/// Round a non-negative value half-up to `places` decimal places.
pub fn round_half_up(value: f64, places: u32) -> f64 {
    let pow = 10f64.powi(places as i32);
    let digit = value * pow;
    let rounded = if digit.fract() >= 0.5 {
        digit.ceil()
    } else {
        digit.floor()
    };
    rounded / pow
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
