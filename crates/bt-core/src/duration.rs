//! Duration aggregation and percentage rollup over interval trees.
//!
//! Walks the same tree shape as the interval validator, reduces every
//! interval-array leaf to a summed duration keyed by its dotted path, merges
//! contributions from many documents pointwise, then rebuilds the nesting
//! with a `total` at every branch and renders everything as a
//! percentage-of-grand-total report.

use serde_json::{Map, Value};

/// Accumulates leaf durations across one or more tag documents.
///
/// Paths are dotted and relative to the aggregated category
/// (`lane_keep.normal`, `parked`). Merge order is first-encounter order, so
/// reports follow the layout of the source documents.
#[derive(Debug, Clone, Default)]
pub struct DurationAggregator {
    flat: Vec<(String, f64)>,
}

impl DurationAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything has been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// Reduces the sub-tree at `category` in `document` and merges its leaf
    /// durations into the accumulator. Documents without the category
    /// contribute nothing.
    pub fn add_document(&mut self, document: &Value, category: &str) {
        if let Some(subtree) = document.get(category) {
            let mut flat = Vec::new();
            flatten(subtree, "", &mut flat);
            for (path, duration) in flat {
                self.merge_leaf(&path, duration);
            }
        }
    }

    /// Pointwise-sums one leaf contribution.
    pub fn merge_leaf(&mut self, path: &str, duration: f64) {
        match self.flat.iter_mut().find(|(key, _)| key == path) {
            Some((_, total)) => *total += duration,
            None => self.flat.push((path.to_string(), duration)),
        }
    }

    /// Sum of all leaf durations, the percentage denominator.
    #[must_use]
    pub fn grand_total(&self) -> f64 {
        self.flat.iter().map(|(_, duration)| duration).sum()
    }

    /// Rebuilds the nested tree with a `total` inserted at every branch
    /// node, bottom-up. Leaves and totals are seconds rounded to three
    /// decimals.
    #[must_use]
    pub fn rollup(&self) -> Value {
        let mut root = Map::new();
        for (path, duration) in &self.flat {
            let parts: Vec<&str> = path.split('.').collect();
            insert_path(&mut root, &parts, *duration);
        }
        let grand_total = insert_totals(&mut root);
        root.insert("total".to_string(), number(grand_total));
        Value::Object(root)
    }

    /// The rollup with every leaf and every `total` rendered as
    /// `"<seconds> (<percent>%)"` relative to the grand total.
    #[must_use]
    pub fn report(&self) -> Value {
        let grand_total = self.grand_total();
        let mut tree = self.rollup();
        render(&mut tree, grand_total);
        tree
    }
}

/// `Σ (end - start)` over the well-formed intervals of one leaf list.
/// Entries that are not ascending two-element numeric pairs contribute 0;
/// flagging them is the interval validator's job. One extra grouping level
/// (arrays of interval arrays) reduces the same way.
fn sum_durations(items: &[Value]) -> f64 {
    items
        .iter()
        .map(|entry| match entry.as_array() {
            Some(pair) => duration_of(pair).unwrap_or_else(|| {
                // A nested group: reduce its own pairs.
                pair.iter()
                    .filter_map(|inner| inner.as_array().and_then(|p| duration_of(p)))
                    .sum()
            }),
            None => 0.0,
        })
        .sum()
}

fn duration_of(pair: &[Value]) -> Option<f64> {
    if pair.len() != 2 {
        return None;
    }
    let (start, end) = (pair[0].as_f64()?, pair[1].as_f64()?);
    (start <= end).then(|| end - start)
}

fn flatten(value: &Value, prefix: &str, out: &mut Vec<(String, f64)>) {
    match value {
        Value::Object(members) => {
            for (key, child) in members {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(child, &path, out);
            }
        }
        Value::Array(items) => out.push((prefix.to_string(), sum_durations(items))),
        _ => {}
    }
}

fn insert_path(node: &mut Map<String, Value>, parts: &[&str], duration: f64) {
    match parts {
        [] => {}
        [leaf] => {
            node.insert((*leaf).to_string(), number(round3(duration)));
        }
        [branch, rest @ ..] => {
            let child = node
                .entry((*branch).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(members) = child {
                insert_path(members, rest, duration);
            }
        }
    }
}

/// Post-order: every branch gets a `total` equal to the sum of its
/// children's totals. Returns this node's contribution.
fn insert_totals(node: &mut Map<String, Value>) -> f64 {
    let mut sum = 0.0;
    let keys: Vec<String> = node.keys().cloned().collect();
    for key in keys {
        let contribution = match node.get_mut(&key) {
            Some(Value::Object(members)) => {
                let child_total = insert_totals(members);
                members.insert("total".to_string(), number(child_total));
                child_total
            }
            Some(value) => value.as_f64().unwrap_or(0.0),
            None => 0.0,
        };
        sum += contribution;
    }
    round3(sum)
}

fn render(value: &mut Value, grand_total: f64) {
    match value {
        Value::Object(members) => {
            for child in members.values_mut() {
                render(child, grand_total);
            }
        }
        Value::Number(n) => {
            let seconds = n.as_f64().unwrap_or(0.0);
            let percent = if grand_total > 0.0 {
                seconds / grand_total * 100.0
            } else {
                0.0
            };
            *value = Value::String(format!("{seconds} ({percent:.1}%)"));
        }
        _ => {}
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}
