//! Recursive semantic validation of interval-bearing tag trees.
//!
//! The tree's shape is only known at runtime, so list nodes are classified
//! structurally by inspecting their first element; the tie-break order below
//! is the contract:
//!
//! 1. first element is a list that is empty or all-numeric → the node is a
//!    `TimeRangeArray`; every element must be a `[start, end]` pair.
//! 2. otherwise, first element is a list whose own first element is a list →
//!    the node is a list of `TimeRangeArray`s (one extra grouping level);
//!    every `[outer][inner]` entry must be a `[start, end]` pair.
//! 3. anything else is opaque and skipped; schema-level type checking owns
//!    that case.
//!
//! Every violation in the sub-tree is collected in a single pass. Nothing
//! short-circuits, so callers can report all problems at once.

use std::fmt;

use serde_json::Value;

/// The kind of per-interval check that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ViolationKind {
    /// Not exactly two items.
    Arity,
    /// An entry that is not numeric, or not a list where one was required.
    Type,
    /// `start > end`.
    Order,
}

/// One semantic violation, with the exact dotted/indexed path to the
/// offending entry (e.g. `ego_vehicle_movement.turn.left_turn[0][1]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    fn new(path: String, kind: ViolationKind, message: String) -> Self {
        Self {
            path,
            kind,
            message,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validates the sub-tree anchored at `category` in `document`. A missing
/// category yields no violations; its presence is the schema's concern.
#[must_use]
pub fn validate_category(document: &Value, category: &str) -> Vec<Violation> {
    document
        .get(category)
        .map_or_else(Vec::new, |subtree| validate_tree(subtree, category))
}

/// Walks an arbitrary tag tree, validating every interval-shaped node.
#[must_use]
pub fn validate_tree(value: &Value, path: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    visit(value, path, &mut violations);
    violations
}

fn visit(value: &Value, path: &str, out: &mut Vec<Violation>) {
    match value {
        Value::Object(members) => {
            for (key, child) in members {
                visit(child, &format!("{path}.{key}"), out);
            }
        }
        Value::Array(items) => visit_list(items, path, out),
        _ => {}
    }
}

fn visit_list(items: &[Value], path: &str, out: &mut Vec<Violation>) {
    let Some(first) = items.first() else {
        return;
    };

    if is_time_range_like(first) {
        // TimeRangeArray: every element must be a [start, end] pair.
        for (index, item) in items.iter().enumerate() {
            let item_path = format!("{path}[{index}]");
            match item.as_array() {
                Some(pair) => check_time_range(pair, &item_path, out),
                None => out.push(Violation::new(
                    item_path,
                    ViolationKind::Type,
                    format!("expected a TimeRange (a list), found {}", type_name(item)),
                )),
            }
        }
    } else if is_nested_array(first) {
        // One extra grouping level: a list of TimeRangeArrays.
        for (outer, group) in items.iter().enumerate() {
            let group_path = format!("{path}[{outer}]");
            match group.as_array() {
                Some(entries) => {
                    for (inner, entry) in entries.iter().enumerate() {
                        let entry_path = format!("{group_path}[{inner}]");
                        match entry.as_array() {
                            Some(pair) => check_time_range(pair, &entry_path, out),
                            None => out.push(Violation::new(
                                entry_path,
                                ViolationKind::Type,
                                format!(
                                    "expected a TimeRange (a list), found {}",
                                    type_name(entry)
                                ),
                            )),
                        }
                    }
                }
                None => out.push(Violation::new(
                    group_path,
                    ViolationKind::Type,
                    format!("expected a TimeRangeArray, found {}", type_name(group)),
                )),
            }
        }
    }
    // Anything else is opaque here.
}

/// A list that is empty or holds only numbers, i.e. a plausible
/// `[start, end]` pair.
fn is_time_range_like(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().all(Value::is_number))
}

/// A list whose own first element is a list.
fn is_nested_array(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.first().is_some_and(Value::is_array))
}

/// The three per-interval checks, in order. A type failure stops further
/// checks for that entry; all violations across entries are still collected.
fn check_time_range(pair: &[Value], path: &str, out: &mut Vec<Violation>) {
    if pair.len() != 2 {
        out.push(Violation::new(
            path.to_string(),
            ViolationKind::Arity,
            format!("must have exactly two items, found {}", pair.len()),
        ));
        return;
    }

    let (Some(start), Some(end)) = (pair[0].as_f64(), pair[1].as_f64()) else {
        out.push(Violation::new(
            path.to_string(),
            ViolationKind::Type,
            format!("items must be numbers, found [{}, {}]", pair[0], pair[1]),
        ));
        return;
    };

    if start > end {
        out.push(Violation::new(
            path.to_string(),
            ViolationKind::Order,
            format!("items must be in ascending order, found [{start}, {end}]"),
        ));
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movement(value: Value) -> Value {
        json!({"ego_vehicle_movement": value})
    }

    #[test]
    fn empty_or_missing_category_is_valid() {
        assert!(validate_category(&movement(json!({})), "ego_vehicle_movement").is_empty());
        assert!(validate_category(&json!({}), "ego_vehicle_movement").is_empty());
    }

    #[test]
    fn well_formed_structures_pass() {
        let document = movement(json!({
            "lane_keep": {"normal": [[[1, 2], [3, 4]]]},
            "turn": {"left_turn": [[10, 11], [12, 13]]},
            "lane_change": {"right": [[20, 20]]},
            "parked": [[200, 201]],
            "pull_out": {"from_right_side": [[300, 301]]},
        }));
        assert!(validate_category(&document, "ego_vehicle_movement").is_empty());
    }

    #[test]
    fn floats_and_negative_numbers_pass() {
        let document = movement(json!({
            "lane_change": {"left": [[-1.5, 0.5], [1.0, 2.5]]},
        }));
        assert!(validate_category(&document, "ego_vehicle_movement").is_empty());
    }

    #[test]
    fn empty_leaf_lists_pass() {
        let document = movement(json!({
            "lane_keep": {"normal": []},
            "parked": [],
        }));
        assert!(validate_category(&document, "ego_vehicle_movement").is_empty());
    }

    #[test]
    fn short_entry_is_exactly_one_arity_violation() {
        let document = movement(json!({"parked": [[1]]}));
        let violations = validate_category(&document, "ego_vehicle_movement");

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Arity);
        assert_eq!(violations[0].path, "ego_vehicle_movement.parked[0]");
    }

    #[test]
    fn long_entry_reports_arity_but_never_order() {
        // [3, 2, 1] is both too long and descending; only the arity check runs.
        let document = movement(json!({"lane_keep": {"normal": [[3, 2, 1]]}}));
        let violations = validate_category(&document, "ego_vehicle_movement");

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Arity);
        assert_eq!(violations[0].path, "ego_vehicle_movement.lane_keep.normal[0]");
    }

    #[test]
    fn descending_entry_is_exactly_one_order_violation() {
        let document = movement(json!({"turn": {"right_turn": [[[2, 1]]]}}));
        let violations = validate_category(&document, "ego_vehicle_movement");

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Order);
        assert_eq!(violations[0].path, "ego_vehicle_movement.turn.right_turn[0][0]");
    }

    #[test]
    fn non_numeric_entry_is_a_type_violation_and_stops_there() {
        let document = movement(json!({"stopped": {"at_crosswalk": [[["a", 2]]]}}));
        let violations = validate_category(&document, "ego_vehicle_movement");

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Type);
        assert_eq!(
            violations[0].path,
            "ego_vehicle_movement.stopped.at_crosswalk[0][0]"
        );
    }

    #[test]
    fn zero_duration_is_valid() {
        let document = movement(json!({"parked": [[7, 7]]}));
        assert!(validate_category(&document, "ego_vehicle_movement").is_empty());
    }

    #[test]
    fn mixed_valid_and_invalid_arrays_report_every_problem() {
        let document = movement(json!({
            "lane_keep": {"normal": [[[1, 2], [5, 4]]]},
            "parked": [[10, 11], [120, 100], [1, 2, 3]],
        }));

        let mut paths: Vec<_> = validate_category(&document, "ego_vehicle_movement")
            .into_iter()
            .map(|v| (v.path, v.kind))
            .collect();
        paths.sort();

        assert_eq!(
            paths,
            vec![
                (
                    "ego_vehicle_movement.lane_keep.normal[0][1]".to_string(),
                    ViolationKind::Order
                ),
                (
                    "ego_vehicle_movement.parked[1]".to_string(),
                    ViolationKind::Order
                ),
                (
                    "ego_vehicle_movement.parked[2]".to_string(),
                    ViolationKind::Arity
                ),
            ]
        );
    }

    #[test]
    fn flat_number_lists_are_opaque() {
        // Schema validation owns these; the interval walk skips them.
        let direct = movement(json!({"parked": [1, 2]}));
        assert!(validate_category(&direct, "ego_vehicle_movement").is_empty());

        let nested = movement(json!({"lane_keep": {"normal": [1, 2]}}));
        assert!(validate_category(&nested, "ego_vehicle_movement").is_empty());
    }

    #[test]
    fn non_list_item_inside_a_time_range_array() {
        let document = movement(json!({
            "lane_keep": {"normal": [[1, 2], "not_a_range"]},
        }));
        let violations = validate_category(&document, "ego_vehicle_movement");

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Type);
        assert_eq!(violations[0].path, "ego_vehicle_movement.lane_keep.normal[1]");
        assert!(violations[0].message.contains("found a string"));
    }

    #[test]
    fn non_list_item_two_levels_deep_reports_both_indices() {
        let document = movement(json!({
            "lane_keep": {"normal": [[[1, 2], "not_a_range", [3, 4]]]},
        }));
        let violations = validate_category(&document, "ego_vehicle_movement");

        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].path,
            "ego_vehicle_movement.lane_keep.normal[0][1]"
        );
    }

    #[test]
    fn deeply_nested_groups_are_traversed() {
        let document = movement(json!({
            "level1": {
                "level2": {
                    "level3_list": [[1, 2], [3, 4, 5], [6, 7], [9, 8]],
                },
            },
        }));
        let violations = validate_category(&document, "ego_vehicle_movement");

        assert_eq!(violations.len(), 2);
        assert_eq!(
            violations[0].path,
            "ego_vehicle_movement.level1.level2.level3_list[1]"
        );
        assert_eq!(violations[0].kind, ViolationKind::Arity);
        assert_eq!(
            violations[1].path,
            "ego_vehicle_movement.level1.level2.level3_list[3]"
        );
        assert_eq!(violations[1].kind, ViolationKind::Order);
    }

    #[test]
    fn violations_order_follows_document_order() {
        let document = movement(json!({
            "a": [[2, 1]],
            "b": [[4, 3]],
        }));
        let violations = validate_category(&document, "ego_vehicle_movement");

        let paths: Vec<_> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["ego_vehicle_movement.a[0]", "ego_vehicle_movement.b[0]"]
        );
    }
}
