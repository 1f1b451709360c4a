//! The mutable in-memory tag tree accumulated for one recording.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SchemaViolation, TagError};
use crate::schema::TagSchema;
use crate::value::{TagValue, TimeRange};

/// One node of the tag tree.
///
/// The tree's exact shape is only known at schema-load time, so traversal
/// dispatches on this closed variant instead of probing untyped maps.
#[derive(Debug, Clone, PartialEq)]
pub enum TagNode {
    /// A sorted, deduplicated list of scalar values.
    Scalars(Vec<TagValue>),
    /// Named child nodes, in declaration order.
    Group(Vec<(String, TagNode)>),
    /// A list of `[start, end]` intervals.
    Intervals(Vec<TimeRange>),
}

impl TagNode {
    fn to_json(&self) -> Value {
        match self {
            Self::Scalars(values) => Value::Array(values.iter().map(TagValue::to_json).collect()),
            Self::Group(children) => Value::Object(
                children
                    .iter()
                    .map(|(name, node)| (name.clone(), node.to_json()))
                    .collect(),
            ),
            Self::Intervals(ranges) => Value::Array(
                ranges
                    .iter()
                    .map(|range| {
                        serde_json::to_value(range).unwrap_or(Value::Null)
                    })
                    .collect(),
            ),
        }
    }
}

/// Start/end of the source recording, in seconds. Lives alongside the tag
/// tree but outside the schema-validated categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
}

/// Accumulated tags for one recording.
///
/// Created empty via [`TagSchema::empty_container`], mutated by category name
/// during a single pass over the event stream, then serialized once. All
/// mutators are in-place and perform no I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct TagContainer {
    nodes: Vec<(String, TagNode)>,
    time: TimeMeta,
}

impl TagContainer {
    pub(crate) fn from_nodes(nodes: Vec<(String, TagNode)>) -> Self {
        Self {
            nodes,
            time: TimeMeta::default(),
        }
    }

    /// Replaces the scalar leaf at `category` wholesale.
    pub fn set(
        &mut self,
        category: &str,
        values: impl IntoIterator<Item = TagValue>,
    ) -> Result<(), TagError> {
        let leaf = self.scalar_leaf_mut(category)?;
        *leaf = values.into_iter().collect();
        Ok(())
    }

    /// Set-union into the scalar leaf at `category`; the leaf stays sorted
    /// and deduplicated, so adds are idempotent.
    pub fn add(
        &mut self,
        category: &str,
        values: impl IntoIterator<Item = TagValue>,
    ) -> Result<(), TagError> {
        let leaf = self.scalar_leaf_mut(category)?;
        leaf.extend(values);
        leaf.sort();
        leaf.dedup();
        Ok(())
    }

    /// Set-difference from the scalar leaf at `category`.
    pub fn remove(
        &mut self,
        category: &str,
        values: impl IntoIterator<Item = TagValue>,
    ) -> Result<(), TagError> {
        let removing: Vec<TagValue> = values.into_iter().collect();
        let leaf = self.scalar_leaf_mut(category)?;
        leaf.retain(|value| !removing.contains(value));
        Ok(())
    }

    /// Set-union into the nested leaf at `category.subgroup`. Used for
    /// classification-style tagging, e.g. placing a detected object under
    /// `dynamic_object.vehicle`.
    pub fn add_grouped(
        &mut self,
        category: &str,
        subgroup: &str,
        values: impl IntoIterator<Item = TagValue>,
    ) -> Result<(), TagError> {
        let leaf = self.grouped_scalar_leaf_mut(category, subgroup)?;
        leaf.extend(values);
        leaf.sort();
        leaf.dedup();
        Ok(())
    }

    /// Set-difference from the nested leaf at `category.subgroup`.
    pub fn remove_grouped(
        &mut self,
        category: &str,
        subgroup: &str,
        values: impl IntoIterator<Item = TagValue>,
    ) -> Result<(), TagError> {
        let removing: Vec<TagValue> = values.into_iter().collect();
        let leaf = self.grouped_scalar_leaf_mut(category, subgroup)?;
        leaf.retain(|value| !removing.contains(value));
        Ok(())
    }

    /// Appends an interval to the interval-array leaf at `category.subgroup`.
    pub fn push_interval(
        &mut self,
        category: &str,
        subgroup: &str,
        range: TimeRange,
    ) -> Result<(), TagError> {
        match self.child_mut(category, subgroup)? {
            TagNode::Intervals(ranges) => {
                ranges.push(range);
                Ok(())
            }
            TagNode::Scalars(_) | TagNode::Group(_) => Err(TagError::ShapeMismatch {
                path: format!("{category}.{subgroup}"),
                expected: "an interval array",
            }),
        }
    }

    /// Attaches the recording's start/end timestamps.
    pub const fn set_time(&mut self, start: f64, end: f64) {
        self.time.start_time = Some(start);
        self.time.end_time = Some(end);
    }

    #[must_use]
    pub const fn time(&self) -> &TimeMeta {
        &self.time
    }

    /// Read access to a scalar leaf, for reporting and tests.
    pub fn scalar_values(&self, category: &str) -> Result<&[TagValue], TagError> {
        match self.node(category)? {
            TagNode::Scalars(values) => Ok(values),
            TagNode::Group(_) | TagNode::Intervals(_) => Err(TagError::ShapeMismatch {
                path: category.to_string(),
                expected: "a scalar list",
            }),
        }
    }

    /// Read access to a nested scalar leaf.
    pub fn grouped_values(&self, category: &str, subgroup: &str) -> Result<&[TagValue], TagError> {
        match self.child(category, subgroup)? {
            TagNode::Scalars(values) => Ok(values),
            TagNode::Group(_) | TagNode::Intervals(_) => Err(TagError::ShapeMismatch {
                path: format!("{category}.{subgroup}"),
                expected: "a scalar list",
            }),
        }
    }

    /// A serialization-ready deep-copy snapshot: one member per category in
    /// schema order, plus a trailing `time` object once timestamps are set.
    /// Later mutation of the container cannot alter an emitted document.
    #[must_use]
    pub fn to_document(&self) -> Map<String, Value> {
        let mut document: Map<String, Value> = self
            .nodes
            .iter()
            .map(|(name, node)| (name.clone(), node.to_json()))
            .collect();

        if self.time.start_time.is_some() || self.time.end_time.is_some() {
            if let Ok(time) = serde_json::to_value(self.time) {
                document.insert("time".to_string(), time);
            }
        }

        document
    }

    /// Structural conformance of the current snapshot against `schema`.
    #[must_use]
    pub fn validate(&self, schema: &TagSchema) -> Vec<SchemaViolation> {
        schema.validate(&Value::Object(self.to_document()))
    }

    fn node(&self, category: &str) -> Result<&TagNode, TagError> {
        self.nodes
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, node)| node)
            .ok_or_else(|| TagError::UnknownCategory {
                name: category.to_string(),
                known: self.known_categories(),
            })
    }

    fn node_mut(&mut self, category: &str) -> Result<&mut TagNode, TagError> {
        let known = self.known_categories();
        self.nodes
            .iter_mut()
            .find(|(name, _)| name == category)
            .map(|(_, node)| node)
            .ok_or(TagError::UnknownCategory {
                name: category.to_string(),
                known,
            })
    }

    fn child(&self, category: &str, subgroup: &str) -> Result<&TagNode, TagError> {
        match self.node(category)? {
            TagNode::Group(children) => children
                .iter()
                .find(|(name, _)| name == subgroup)
                .map(|(_, node)| node)
                .ok_or_else(|| TagError::UnknownSubcategory {
                    category: category.to_string(),
                    name: subgroup.to_string(),
                }),
            TagNode::Scalars(_) | TagNode::Intervals(_) => Err(TagError::ShapeMismatch {
                path: category.to_string(),
                expected: "a grouped category",
            }),
        }
    }

    fn child_mut(&mut self, category: &str, subgroup: &str) -> Result<&mut TagNode, TagError> {
        let category_name = category.to_string();
        match self.node_mut(category)? {
            TagNode::Group(children) => children
                .iter_mut()
                .find(|(name, _)| name == subgroup)
                .map(|(_, node)| node)
                .ok_or(TagError::UnknownSubcategory {
                    category: category_name,
                    name: subgroup.to_string(),
                }),
            TagNode::Scalars(_) | TagNode::Intervals(_) => Err(TagError::ShapeMismatch {
                path: category_name,
                expected: "a grouped category",
            }),
        }
    }

    fn scalar_leaf_mut(&mut self, category: &str) -> Result<&mut Vec<TagValue>, TagError> {
        match self.node_mut(category)? {
            TagNode::Scalars(values) => Ok(values),
            TagNode::Group(_) | TagNode::Intervals(_) => Err(TagError::ShapeMismatch {
                path: category.to_string(),
                expected: "a scalar list",
            }),
        }
    }

    fn grouped_scalar_leaf_mut(
        &mut self,
        category: &str,
        subgroup: &str,
    ) -> Result<&mut Vec<TagValue>, TagError> {
        let path = format!("{category}.{subgroup}");
        match self.child_mut(category, subgroup)? {
            TagNode::Scalars(values) => Ok(values),
            TagNode::Group(_) | TagNode::Intervals(_) => Err(TagError::ShapeMismatch {
                path,
                expected: "a scalar list",
            }),
        }
    }

    fn known_categories(&self) -> String {
        self.nodes
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
