//! Per-event rules that fold a decoded stream into a tag container.
//!
//! One left-to-right pass, no look-ahead, no re-ordering. Topics may
//! interleave arbitrarily; timestamps are trusted to arrive non-decreasing
//! from the reader. The rule tables are replaceable policy, not fixed
//! business logic.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::error::TagError;
use crate::event::LogEvent;
use crate::tags::TagContainer;
use crate::value::{TagValue, TimeRange};

/// Topic carrying perception object lists.
pub const OBJECTS_TOPIC: &str = "/perception/object_recognition/objects";
/// Topic carrying the ego kinematic state.
pub const KINEMATIC_TOPIC: &str = "/localization/kinematic_state";

/// Where a classification label lands in the tag tree.
#[derive(Debug, Clone)]
pub struct LabelTarget {
    pub category: String,
    pub subgroup: String,
    pub value: String,
}

impl LabelTarget {
    fn dynamic_object(subgroup: &str, value: &str) -> Self {
        Self {
            category: "dynamic_object".to_string(),
            subgroup: subgroup.to_string(),
            value: value.to_string(),
        }
    }
}

/// Discrete label codes mapped to tag targets. Labels are data: extending
/// the taxonomy means editing this table, not the engine.
#[derive(Debug, Clone)]
pub struct ClassificationTable {
    targets: HashMap<i64, LabelTarget>,
}

impl ClassificationTable {
    #[must_use]
    pub fn get(&self, label: i64) -> Option<&LabelTarget> {
        self.targets.get(&label)
    }
}

impl Default for ClassificationTable {
    /// The perception object taxonomy used by the default template.
    fn default() -> Self {
        let entries = [
            (0, "unknown", "unknown"),
            (1, "vehicle", "car"),
            (2, "vehicle", "truck"),
            (3, "vehicle", "bus"),
            (4, "vehicle", "trailer"),
            (5, "two_wheeler", "motorcycle"),
            (6, "two_wheeler", "bicycle"),
            (7, "pedestrian", "pedestrian"),
            (8, "pedestrian", "animal"),
            (9, "unknown", "hazard"),
            (10, "unknown", "over_drivable"),
            (11, "unknown", "under_drivable"),
        ];
        Self {
            targets: entries
                .into_iter()
                .map(|(label, subgroup, value)| {
                    (label, LabelTarget::dynamic_object(subgroup, value))
                })
                .collect(),
        }
    }
}

/// A flag-style tag set the first time a topic is observed.
#[derive(Debug, Clone)]
pub struct PresenceRule {
    pub topic: String,
    pub category: String,
    pub value: String,
}

fn default_presence_rules() -> Vec<PresenceRule> {
    vec![
        PresenceRule {
            topic: "/vehicle/status/turn_indicators_report".to_string(),
            category: "vehicle_status".to_string(),
            value: "turn_signal".to_string(),
        },
        PresenceRule {
            topic: "/vehicle/status/hazard_lights_report".to_string(),
            category: "vehicle_status".to_string(),
            value: "hazard_lights".to_string(),
        },
    ]
}

/// Policy knobs for one tagging pass.
#[derive(Debug, Clone)]
pub struct RuleConfig {
    /// Stop consuming events once `timestamp - first_timestamp` exceeds
    /// this window. `None` consumes the whole stream.
    pub horizon_secs: Option<f64>,

    /// Speeds below this bound (m/s) count as stopped for the
    /// interval-tracking rule.
    pub stop_speed_mps: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            horizon_secs: None,
            stop_speed_mps: 0.1,
        }
    }
}

/// What one pass saw, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassSummary {
    /// Events consumed (including skipped ones).
    pub events_seen: usize,
    /// Malformed messages skipped with a warning.
    pub events_skipped: usize,
    /// First observed timestamp, seconds.
    pub start_time: Option<f64>,
    /// Last observed timestamp, seconds.
    pub end_time: Option<f64>,
}

/// Folds decoded events into a [`TagContainer`], one at a time.
#[derive(Debug)]
pub struct RuleEngine {
    config: RuleConfig,
    labels: ClassificationTable,
    presence: Vec<PresenceRule>,
    velocity: Option<(f64, f64)>,
    stopped_since: Option<f64>,
    seen_presence: HashSet<String>,
    summary: PassSummary,
}

impl RuleEngine {
    #[must_use]
    pub fn new(config: RuleConfig) -> Self {
        Self {
            config,
            labels: ClassificationTable::default(),
            presence: default_presence_rules(),
            velocity: None,
            stopped_since: None,
            seen_presence: HashSet::new(),
            summary: PassSummary::default(),
        }
    }

    /// Replaces the classification table.
    #[must_use]
    pub fn with_labels(mut self, labels: ClassificationTable) -> Self {
        self.labels = labels;
        self
    }

    /// Replaces the presence rule table.
    #[must_use]
    pub fn with_presence(mut self, presence: Vec<PresenceRule>) -> Self {
        self.presence = presence;
        self
    }

    /// Runs the single forward pass, mutating `tags` in place.
    ///
    /// A malformed message is skipped with a warning and never aborts the
    /// pass. Errors surface only for rule-table/category mismatches, which
    /// are configuration bugs.
    pub fn fold(
        mut self,
        events: impl IntoIterator<Item = LogEvent>,
        tags: &mut TagContainer,
    ) -> Result<PassSummary, TagError> {
        for event in events {
            let time = event.time_secs();
            let first = *self.summary.start_time.get_or_insert(time);

            if let Some(horizon) = self.config.horizon_secs {
                if time - first > horizon {
                    tracing::debug!(horizon, "horizon reached, stopping pass early");
                    break;
                }
            }

            self.summary.events_seen += 1;
            self.summary.end_time = Some(time);
            self.apply(&event, time, tags)?;
        }

        self.finish(tags)?;
        Ok(self.summary)
    }

    fn apply(&mut self, event: &LogEvent, time: f64, tags: &mut TagContainer) -> Result<(), TagError> {
        match event.topic.as_str() {
            OBJECTS_TOPIC => self.classify_objects(&event.message, tags)?,
            KINEMATIC_TOPIC => self.track_kinematics(&event.message, time, tags)?,
            _ => {}
        }

        if let Some(rule) = self
            .presence
            .iter()
            .find(|rule| rule.topic == event.topic)
        {
            if self.seen_presence.insert(rule.topic.clone()) {
                tags.add(&rule.category, [TagValue::from(rule.value.as_str())])?;
            }
        }

        Ok(())
    }

    /// Maps each detected object's leading classification label through the
    /// label table. Unknown label ids are ignored without failing the pass.
    fn classify_objects(&mut self, message: &Value, tags: &mut TagContainer) -> Result<(), TagError> {
        let Some(objects) = message.get("objects").and_then(Value::as_array) else {
            self.skip_malformed(OBJECTS_TOPIC, "missing 'objects' array");
            return Ok(());
        };

        for object in objects {
            let Some(label) = object
                .get("classification")
                .and_then(Value::as_array)
                .and_then(|c| c.first())
                .and_then(|c| c.get("label"))
                .and_then(Value::as_i64)
            else {
                self.skip_malformed(OBJECTS_TOPIC, "object without classification label");
                continue;
            };

            if let Some(target) = self.labels.get(label) {
                let value = TagValue::from(target.value.as_str());
                tags.add_grouped(&target.category, &target.subgroup, [value])?;
            }
        }

        Ok(())
    }

    /// Updates the velocity extremum accumulator and the stopped-interval
    /// state machine from one kinematic sample.
    fn track_kinematics(
        &mut self,
        message: &Value,
        time: f64,
        tags: &mut TagContainer,
    ) -> Result<(), TagError> {
        let Some(speed) = message
            .pointer("/twist/twist/linear/x")
            .and_then(Value::as_f64)
        else {
            self.skip_malformed(KINEMATIC_TOPIC, "missing twist.twist.linear.x");
            return Ok(());
        };

        self.velocity = Some(match self.velocity {
            None => (speed, speed),
            Some((min, max)) => (min.min(speed), max.max(speed)),
        });

        if speed < self.config.stop_speed_mps {
            self.stopped_since.get_or_insert(time);
        } else if let Some(since) = self.stopped_since.take() {
            tags.push_interval("ego_vehicle_movement", "stopped", TimeRange::new(since, time))?;
        }

        Ok(())
    }

    /// Flushes accumulators once the stream is exhausted: closes a
    /// still-open stopped interval, writes the velocity extremum, stamps
    /// the recording bounds.
    fn finish(&mut self, tags: &mut TagContainer) -> Result<(), TagError> {
        if let (Some(since), Some(end)) = (self.stopped_since.take(), self.summary.end_time) {
            tags.push_interval("ego_vehicle_movement", "stopped", TimeRange::new(since, end))?;
        }

        if let Some((min, max)) = self.velocity {
            tags.set("velocity", [TagValue::from(min), TagValue::from(max)])?;
        }

        if let (Some(start), Some(end)) = (self.summary.start_time, self.summary.end_time) {
            tags.set_time(start, end);
        }

        Ok(())
    }

    fn skip_malformed(&mut self, topic: &str, reason: &str) {
        self.summary.events_skipped += 1;
        tracing::warn!(topic, reason, "skipping malformed message");
    }
}
