//! Outbound wire envelope.
//!
//! [`OutboundMessage`] is the unit placed in history and pushed to
//! subscribers. The serialized field names (`MessageId`, `Content`,
//! `TimeStamp`) are the wire contract consumed by the browser page; do
//! not rename them.

use serde::{Deserialize, Serialize};

use crate::alert::AlertEvent;
use crate::load::Sample;
use crate::types::EpochMillis;

/// Discriminant of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Plot,
    Alert,
}

/// One message as pushed to subscribers: a plot point or an alert line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(rename = "MessageId")]
    pub kind: MessageKind,
    /// Stringified load value for `Plot`, free text for `Alert`.
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "TimeStamp")]
    pub timestamp: EpochMillis,
}

impl OutboundMessage {
    /// Wrap a load sample as a plot message. The payload is the shortest
    /// decimal representation of the value; the timestamp is the sample's
    /// own observation time.
    pub fn plot(sample: &Sample) -> Self {
        Self {
            kind: MessageKind::Plot,
            content: sample.value.to_string(),
            timestamp: sample.observed_at,
        }
    }

    /// Wrap an alert event as an alert message.
    pub fn alert(event: &AlertEvent) -> Self {
        Self {
            kind: MessageKind::Alert,
            content: event.message.clone(),
            timestamp: event.observed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_message_wire_shape() {
        let sample = Sample {
            value: 1.01,
            observed_at: 1_700_000_000_000,
        };
        let json = serde_json::to_value(OutboundMessage::plot(&sample)).unwrap();

        assert_eq!(json["MessageId"], "Plot");
        assert_eq!(json["Content"], "1.01");
        assert_eq!(json["TimeStamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn alert_message_wire_shape() {
        let event = AlertEvent {
            message: "High load alert: load=1.11,".to_string(),
            observed_at: 1_700_000_000_123,
        };
        let json = serde_json::to_value(OutboundMessage::alert(&event)).unwrap();

        assert_eq!(json["MessageId"], "Alert");
        assert_eq!(json["Content"], "High load alert: load=1.11,");
        assert_eq!(json["TimeStamp"], 1_700_000_000_123i64);
    }

    #[test]
    fn plot_content_uses_shortest_representation() {
        let sample = Sample {
            value: 0.5,
            observed_at: 0,
        };
        assert_eq!(OutboundMessage::plot(&sample).content, "0.5");

        let whole = Sample {
            value: 2.0,
            observed_at: 0,
        };
        assert_eq!(OutboundMessage::plot(&whole).content, "2");
    }

    #[test]
    fn roundtrips_through_json() {
        let msg = OutboundMessage {
            kind: MessageKind::Alert,
            content: "Alert recovered:".to_string(),
            timestamp: 42,
        };
        let text = serde_json::to_string(&msg).unwrap();
        let parsed: OutboundMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, msg);
    }
}
