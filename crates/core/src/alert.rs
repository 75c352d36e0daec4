//! Debounced hysteresis alerting over the sample stream.
//!
//! [`AlertDetector`] converts a noisy sequence of load readings into
//! discrete transitions: an alert fires only after twelve consecutive
//! qualifying samples, and recovery is symmetric. Detection is a pure
//! function of the input sequence, which keeps scenario tests exact.

use crate::types::{now_millis, EpochMillis};

/// Normalized load above this threshold counts toward a high-load alert.
pub const LOAD_THRESHOLD: f64 = 1.0;

/// Consecutive qualifying samples required before a transition fires
/// (two minutes at the 10-second cadence).
pub const DEBOUNCE_TICKS: u32 = 12;

/// Detector phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    /// Initial state, also re-entered after recovery.
    Normal,
    /// A high-load alert has fired and not yet recovered.
    HighLoad,
}

/// An alert transition, produced only on a state change.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub message: String,
    /// When the transition was detected (UTC epoch milliseconds).
    pub observed_at: EpochMillis,
}

impl AlertEvent {
    /// Build an event stamped with the current time.
    pub fn now(message: String) -> Self {
        Self {
            message,
            observed_at: now_millis(),
        }
    }
}

/// Two-phase hysteresis state machine with a single debounce counter.
///
/// The counter is shared across both directions: a sequence that
/// alternates around the threshold without twelve consecutive qualifying
/// samples never transitions.
#[derive(Debug)]
pub struct AlertDetector {
    state: AlertState,
    counter: u32,
}

impl AlertDetector {
    pub fn new() -> Self {
        Self {
            state: AlertState::Normal,
            counter: DEBOUNCE_TICKS,
        }
    }

    /// Current detector phase.
    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Feed one sample through the state machine.
    ///
    /// Returns the alert message on a full transition, `None` otherwise.
    pub fn detect(&mut self, value: f64) -> Option<String> {
        match self.state {
            AlertState::Normal => {
                if value > LOAD_THRESHOLD {
                    self.counter -= 1;
                } else {
                    self.counter = DEBOUNCE_TICKS;
                }

                if self.counter == 0 {
                    self.counter = DEBOUNCE_TICKS;
                    self.state = AlertState::HighLoad;
                    return Some(format!("High load alert: load={value},"));
                }
                None
            }
            AlertState::HighLoad => {
                if value <= LOAD_THRESHOLD {
                    self.counter -= 1;
                } else {
                    self.counter = DEBOUNCE_TICKS;
                }

                if self.counter == 0 {
                    self.counter = DEBOUNCE_TICKS;
                    self.state = AlertState::Normal;
                    return Some("Alert recovered:".to_string());
                }
                None
            }
        }
    }
}

impl Default for AlertDetector {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Run a sequence through a fresh detector and collect the outcomes.
    fn run_sequence(values: &[f64]) -> Vec<Option<String>> {
        let mut detector = AlertDetector::new();
        values.iter().map(|&v| detector.detect(v)).collect()
    }

    #[test]
    fn fires_after_twelve_consecutive_high_samples() {
        let values = [
            0.1, 0.2, 0.3, 0.1, 0.8, 1.01, 1.01, 1.01, 1.01, 1.01, 1.02, 1.09, 1.11, 1.16, 1.18,
            1.17, 1.11,
        ];
        let outcomes = run_sequence(&values);

        for outcome in &outcomes[..16] {
            assert_eq!(*outcome, None);
        }
        assert_eq!(
            outcomes[16].as_deref(),
            Some("High load alert: load=1.11,")
        );
    }

    #[test]
    fn never_fires_below_threshold() {
        let values = [
            0.1, 0.2, 0.3, 0.1, 0.8, 0.91, 0.91, 0.91, 0.91, 0.91, 0.92, 0.99, 1.00, 0.90, 0.98,
            0.97, 0.91,
        ];
        assert!(run_sequence(&values).iter().all(Option::is_none));
    }

    #[test]
    fn full_alert_and_recovery_cycle() {
        let values = [
            0.1, 0.2, 0.3, 0.1, 0.8, 1.11, 1.31, 1.45, 1.50, 1.47, 1.44, 1.39, 1.20, 1.13, 1.18,
            1.17, 1.21, 0.1, 0.1, 0.2, 0.4, 0.5, 0.6, 0.7, 0.8, 0.8, 0.2, 0.1, 0.3,
        ];
        let outcomes = run_sequence(&values);

        assert_eq!(
            outcomes[16].as_deref(),
            Some("High load alert: load=1.21,")
        );
        assert_eq!(outcomes[28].as_deref(), Some("Alert recovered:"));
        for (i, outcome) in outcomes.iter().enumerate() {
            if i != 16 && i != 28 {
                assert_eq!(*outcome, None, "unexpected event at index {i}");
            }
        }
    }

    #[test]
    fn eleven_high_samples_do_not_fire() {
        let mut detector = AlertDetector::new();
        for _ in 0..11 {
            assert_eq!(detector.detect(1.5), None);
        }
        assert_eq!(detector.state(), AlertState::Normal);
    }

    #[test]
    fn twelfth_high_sample_fires() {
        let mut detector = AlertDetector::new();
        for _ in 0..11 {
            assert_eq!(detector.detect(1.5), None);
        }
        let fired = detector.detect(1.5);
        assert_eq!(fired.as_deref(), Some("High load alert: load=1.5,"));
        assert_eq!(detector.state(), AlertState::HighLoad);
    }

    #[test]
    fn recovery_requires_twelve_low_samples() {
        let mut detector = AlertDetector::new();
        for _ in 0..12 {
            detector.detect(1.5);
        }
        assert_eq!(detector.state(), AlertState::HighLoad);

        for _ in 0..11 {
            assert_eq!(detector.detect(0.5), None);
        }
        assert_eq!(detector.detect(0.5).as_deref(), Some("Alert recovered:"));
        assert_eq!(detector.state(), AlertState::Normal);
    }

    #[test]
    fn dip_below_threshold_resets_the_counter() {
        let mut detector = AlertDetector::new();
        for _ in 0..11 {
            detector.detect(1.5);
        }
        // One sample at the threshold resets the debounce entirely.
        assert_eq!(detector.detect(1.0), None);
        for _ in 0..11 {
            assert_eq!(detector.detect(1.5), None);
        }
        assert_eq!(detector.state(), AlertState::Normal);
    }

    #[test]
    fn alternating_around_threshold_never_fires() {
        let mut detector = AlertDetector::new();
        for i in 0..100 {
            let value = if i % 2 == 0 { 1.2 } else { 0.9 };
            assert_eq!(detector.detect(value), None);
        }
        assert_eq!(detector.state(), AlertState::Normal);
    }

    #[test]
    fn detection_is_deterministic() {
        let values = [0.3, 1.4, 1.2, 0.9, 1.8, 1.1, 1.1, 1.1, 1.1, 1.1, 1.1, 1.1, 1.1, 1.1];
        assert_eq!(run_sequence(&values), run_sequence(&values));
    }
}
