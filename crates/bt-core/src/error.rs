//! Error taxonomy for the tag model.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors raised when mutating or building tag containers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The category name is not part of the schema. Mutating an unknown
    /// category is a programming or configuration error, not recoverable
    /// by retry.
    #[error("unknown category '{name}'. Known categories: {known}")]
    UnknownCategory { name: String, known: String },

    /// The subcategory name is not declared under the given category.
    #[error("unknown subcategory '{name}' under category '{category}'")]
    UnknownSubcategory { category: String, name: String },

    /// The leaf at the given path does not hold what the operation expects
    /// (e.g. adding scalar values to an interval-array leaf).
    #[error("'{path}' does not hold {expected}")]
    ShapeMismatch {
        path: String,
        expected: &'static str,
    },
}

/// A structural mismatch between a document and the declared schema.
///
/// Violations are collected exhaustively and reported together, never one
/// at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    /// Dotted path to the offending node.
    pub path: String,
    /// Human-readable description of the mismatch.
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
