//! Schema-driven shape knowledge for tag documents.
//!
//! All shape questions ("is this category a list or an object?") are answered
//! here, once, at load time. Every other component treats [`TagSchema`] as the
//! single source of truth and dispatches on the closed [`Shape`] variant
//! instead of re-inspecting documents ad hoc.

use serde_json::Value;
use thiserror::Error;

use crate::error::{SchemaViolation, TagError};
use crate::tags::{TagContainer, TagNode};

/// The shape of one category (or subcategory) subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A flat, sorted, deduplicated list of scalar values.
    ScalarList,
    /// Named subcategories, each with its own shape. Declared children are
    /// required in documents; extra children are tolerated (hand-edited
    /// documents may refine the grouping).
    GroupedList(Vec<(String, Shape)>),
    /// Zero or more `[start, end]` intervals, possibly grouped one level
    /// deeper as arrays of interval arrays.
    IntervalArray,
}

impl Shape {
    fn zero_node(&self) -> TagNode {
        match self {
            Self::ScalarList => TagNode::Scalars(Vec::new()),
            Self::GroupedList(children) => TagNode::Group(
                children
                    .iter()
                    .map(|(name, shape)| (name.clone(), shape.zero_node()))
                    .collect(),
            ),
            Self::IntervalArray => TagNode::Intervals(Vec::new()),
        }
    }
}

/// Errors raised while deriving a schema from a JSON Schema document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaLoadError {
    #[error("schema root must be an object with a 'properties' member")]
    MissingProperties,

    #[error("category '{name}': {reason}")]
    UnsupportedShape { name: String, reason: String },
}

/// An ordered mapping from category name to shape descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSchema {
    categories: Vec<(String, Shape)>,
}

impl TagSchema {
    /// The built-in vehicle-log template.
    #[must_use]
    pub fn default_template() -> Self {
        let scalar_group = |names: &[&str]| {
            names
                .iter()
                .map(|n| ((*n).to_string(), Shape::ScalarList))
                .collect()
        };
        let interval_group = |names: &[&str]| {
            names
                .iter()
                .map(|n| ((*n).to_string(), Shape::IntervalArray))
                .collect()
        };

        Self {
            categories: vec![
                (
                    "dynamic_object".to_string(),
                    Shape::GroupedList(scalar_group(&[
                        "vehicle",
                        "two_wheeler",
                        "pedestrian",
                        "unknown",
                    ])),
                ),
                (
                    "ego_vehicle_movement".to_string(),
                    Shape::GroupedList(interval_group(&[
                        "lane_keep",
                        "left_turn",
                        "right_turn",
                        "lane_change",
                        "obstacle_avoidance",
                        "stopped",
                        "parked",
                        "pull_out",
                        "pull_over",
                    ])),
                ),
                ("location".to_string(), Shape::ScalarList),
                ("road_shape".to_string(), Shape::ScalarList),
                ("time_of_day".to_string(), Shape::ScalarList),
                ("vehicle_status".to_string(), Shape::ScalarList),
                ("velocity".to_string(), Shape::ScalarList),
            ],
        }
    }

    /// Derives a schema from a JSON Schema document.
    ///
    /// Each top-level property becomes a category: `object` with `properties`
    /// maps to a grouped list, `array` with scalar or enumerated items maps
    /// to a scalar list, `array` with array-typed items maps to an interval
    /// array.
    pub fn from_json_schema(document: &Value) -> Result<Self, SchemaLoadError> {
        let properties = document
            .get("properties")
            .and_then(Value::as_object)
            .ok_or(SchemaLoadError::MissingProperties)?;

        let mut categories = Vec::with_capacity(properties.len());
        for (name, spec) in properties {
            categories.push((name.clone(), Self::shape_from_property(name, spec)?));
        }
        Ok(Self { categories })
    }

    fn shape_from_property(name: &str, spec: &Value) -> Result<Shape, SchemaLoadError> {
        let kind = spec.get("type").and_then(Value::as_str).unwrap_or("array");
        match kind {
            "object" => {
                let children = spec
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| {
                        props
                            .iter()
                            .map(|(child, child_spec)| {
                                Self::shape_from_property(child, child_spec)
                                    .map(|shape| (child.clone(), shape))
                            })
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .transpose()?
                    .unwrap_or_default();
                Ok(Shape::GroupedList(children))
            }
            "array" => {
                // Enumerated items carry no "type"; treat them as scalars.
                let item_type = spec
                    .get("items")
                    .and_then(|items| items.get("type"))
                    .and_then(Value::as_str);
                match item_type {
                    Some("array") => Ok(Shape::IntervalArray),
                    Some("string" | "number" | "integer") | None => Ok(Shape::ScalarList),
                    Some(other) => Err(SchemaLoadError::UnsupportedShape {
                        name: name.to_string(),
                        reason: format!("unsupported item type '{other}'"),
                    }),
                }
            }
            other => Err(SchemaLoadError::UnsupportedShape {
                name: name.to_string(),
                reason: format!("unsupported type '{other}'"),
            }),
        }
    }

    /// Ordered category names.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    /// The shape declared for `category`.
    pub fn shape(&self, category: &str) -> Result<&Shape, TagError> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, shape)| shape)
            .ok_or_else(|| TagError::UnknownCategory {
                name: category.to_string(),
                known: self.known_categories(),
            })
    }

    /// Subcategory names declared under `category`. Empty for scalar and
    /// interval categories.
    pub fn subcategories(&self, category: &str) -> Result<Vec<&str>, TagError> {
        match self.shape(category)? {
            Shape::GroupedList(children) => {
                Ok(children.iter().map(|(name, _)| name.as_str()).collect())
            }
            Shape::ScalarList | Shape::IntervalArray => Ok(Vec::new()),
        }
    }

    /// A fresh container in which every declared path exists, populated with
    /// its shape's zero value. Downstream code never needs to check for
    /// missing keys.
    #[must_use]
    pub fn empty_container(&self) -> TagContainer {
        TagContainer::from_nodes(
            self.categories
                .iter()
                .map(|(name, shape)| (name.clone(), shape.zero_node()))
                .collect(),
        )
    }

    /// Checks a document's structural conformance against the declared
    /// shapes. Returns every violation found; an empty list means the
    /// document is valid.
    ///
    /// The `time`/`meta` members live outside the schema-validated tree and
    /// are skipped. Semantic interval checks are a separate concern, see
    /// [`crate::interval`].
    #[must_use]
    pub fn validate(&self, document: &Value) -> Vec<SchemaViolation> {
        let mut violations = Vec::new();

        let Some(root) = document.as_object() else {
            violations.push(SchemaViolation::new("$", "document must be a JSON object"));
            return violations;
        };

        for (name, shape) in &self.categories {
            match root.get(name) {
                Some(value) => Self::validate_node(name, shape, value, &mut violations),
                None => violations.push(SchemaViolation::new(
                    name.clone(),
                    "missing required category",
                )),
            }
        }

        for key in root.keys() {
            if key == "time" || key == "meta" {
                continue;
            }
            if !self.categories.iter().any(|(name, _)| name == key) {
                violations.push(SchemaViolation::new(key.clone(), "unknown category"));
            }
        }

        violations
    }

    fn validate_node(path: &str, shape: &Shape, value: &Value, out: &mut Vec<SchemaViolation>) {
        match shape {
            Shape::ScalarList => match value.as_array() {
                Some(items) => {
                    for (index, item) in items.iter().enumerate() {
                        if !item.is_string() && !item.is_number() {
                            out.push(SchemaViolation::new(
                                format!("{path}[{index}]"),
                                "expected a string or number",
                            ));
                        }
                    }
                }
                None => out.push(SchemaViolation::new(path, "expected an array of scalars")),
            },
            Shape::GroupedList(children) => match value.as_object() {
                Some(members) => {
                    for (child, child_shape) in children {
                        let child_path = format!("{path}.{child}");
                        match members.get(child) {
                            Some(child_value) => {
                                Self::validate_node(&child_path, child_shape, child_value, out);
                            }
                            None => out.push(SchemaViolation::new(
                                child_path,
                                "missing required subcategory",
                            )),
                        }
                    }
                }
                None => out.push(SchemaViolation::new(
                    path,
                    "expected an object of subcategories",
                )),
            },
            Shape::IntervalArray => match value.as_array() {
                Some(items) => {
                    for (index, item) in items.iter().enumerate() {
                        if !item.is_array() {
                            out.push(SchemaViolation::new(
                                format!("{path}[{index}]"),
                                "expected an interval (a list)",
                            ));
                        }
                    }
                }
                None => out.push(SchemaViolation::new(path, "expected an array of intervals")),
            },
        }
    }

    fn known_categories(&self) -> String {
        self.categories
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for TagSchema {
    fn default() -> Self {
        Self::default_template()
    }
}
