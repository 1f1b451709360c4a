//! Decoded events crossing the external-decoder boundary.

use serde::{Deserialize, Serialize};

/// One decoded message from a recording.
///
/// The upstream reader owns file access and wire decoding; the core only
/// sees `(topic, timestamp, message)` triples, delivered as a lazy, finite
/// sequence in non-decreasing timestamp order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Fully-qualified topic name, e.g. `/localization/kinematic_state`.
    pub topic: String,
    /// Log time in integer nanoseconds.
    pub log_time: i64,
    /// The decoded message content.
    pub message: serde_json::Value,
}

impl LogEvent {
    /// Log time as floating seconds, the unit used throughout tag documents.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time_secs(&self) -> f64 {
        self.log_time as f64 / 1e9
    }
}
