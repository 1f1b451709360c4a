//! Tag model and validation core for vehicle-log recordings.
//!
//! This crate contains the fundamental types and logic for:
//! - Schema: shape knowledge for tag categories, loaded once and shared
//! - Tags: the mutable container accumulated per recording
//! - Rules: folding a decoded event stream into a container
//! - Interval validation: semantic checks over arbitrary interval trees
//! - Duration aggregation: per-leaf sums, branch totals, percentage reports

pub mod duration;
pub mod error;
pub mod event;
pub mod interval;
pub mod rules;
pub mod schema;
pub mod tags;
pub mod value;

pub use duration::DurationAggregator;
pub use error::{SchemaViolation, TagError};
pub use event::LogEvent;
pub use interval::{Violation, ViolationKind, validate_category, validate_tree};
pub use rules::{ClassificationTable, PassSummary, RuleConfig, RuleEngine};
pub use schema::{SchemaLoadError, Shape, TagSchema};
pub use tags::{TagContainer, TagNode, TimeMeta};
pub use value::{TagValue, TimeRange};
