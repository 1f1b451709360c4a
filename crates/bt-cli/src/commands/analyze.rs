//! Analyze command: aggregate movement durations across tag documents.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use bt_core::DurationAggregator;

use crate::commands::util::collect_files;

const MOVEMENT_CATEGORY: &str = "ego_vehicle_movement";

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Directory that contains .json tag documents.
    pub src_dir: PathBuf,

    /// Scan sub-directories too.
    #[arg(short, long)]
    pub recursive: bool,

    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &AnalyzeArgs) -> Result<()> {
    let targets = collect_files(&args.src_dir, args.recursive, "json")?;
    if targets.is_empty() {
        writeln!(writer, "No json files found - nothing to do.")?;
        return Ok(());
    }

    if !args.json {
        writeln!(writer, "Analyzing {} document(s)...", targets.len())?;
    }

    let mut total_log_time = 0.0_f64;
    let mut aggregator = DurationAggregator::new();

    for file in &targets {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let document: Value = match serde_json::from_str(&text) {
            Ok(document) => document,
            Err(error) => {
                // A broken document aborts its own unit only.
                tracing::warn!(path = %file.display(), %error, "skipping unparseable document");
                if !args.json {
                    writeln!(writer, "Skipping {}: {error}", file.display())?;
                }
                continue;
            }
        };

        if let Some((start, end)) = recording_span(&document) {
            total_log_time += end - start;
        }
        aggregator.add_document(&document, MOVEMENT_CATEGORY);
    }

    if args.json {
        let report = serde_json::json!({
            "total_log_time": round3(total_log_time),
            "movement": aggregator.report(),
        });
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(writer, "Total log time: {} sec", round3(total_log_time))?;
    writeln!(writer)?;
    render(writer, &aggregator.report(), 0)?;
    Ok(())
}

fn recording_span(document: &Value) -> Option<(f64, f64)> {
    let time = document.get("time")?;
    let start = time.get("start_time")?.as_f64()?;
    let end = time.get("end_time")?.as_f64()?;
    Some((start, end))
}

/// Indented `key: value` rendering of the nested report.
fn render<W: Write>(writer: &mut W, value: &Value, depth: usize) -> Result<()> {
    let Some(members) = value.as_object() else {
        return Ok(());
    };
    let indent = "  ".repeat(depth);
    for (key, child) in members {
        match child {
            Value::Object(_) => {
                writeln!(writer, "{indent}{key}:")?;
                render(writer, child, depth + 1)?;
            }
            Value::String(text) => writeln!(writer, "{indent}{key}: {text}")?,
            other => writeln!(writer, "{indent}{key}: {other}")?,
        }
    }
    Ok(())
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use insta::assert_snapshot;

    fn write_doc(dir: &Path, name: &str, document: &Value) {
        std::fs::write(dir.join(name), serde_json::to_string_pretty(document).unwrap()).unwrap();
    }

    #[test]
    fn analyze_merges_documents_and_reports_percentages() {
        let temp = tempfile::tempdir().unwrap();
        write_doc(
            temp.path(),
            "a.json",
            &serde_json::json!({
                "ego_vehicle_movement": {"parked": [[0, 10]], "turn": {"left_turn": [[0, 10]]}},
                "time": {"start_time": 0.0, "end_time": 30.0},
            }),
        );
        write_doc(
            temp.path(),
            "b.json",
            &serde_json::json!({
                "ego_vehicle_movement": {"turn": {"left_turn": [[5, 15]]}},
                "time": {"start_time": 100.0, "end_time": 130.0},
            }),
        );

        let mut output = Vec::new();
        let args = AnalyzeArgs {
            src_dir: temp.path().to_path_buf(),
            recursive: false,
            json: false,
        };
        run(&mut output, &args).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Analyzing 2 document(s)...
        Total log time: 60 sec

        parked: 10 (33.3%)
        turn:
          left_turn: 20 (66.7%)
          total: 20 (66.7%)
        total: 30 (100.0%)
        ");
    }

    #[test]
    fn json_report_carries_the_same_tree() {
        let temp = tempfile::tempdir().unwrap();
        write_doc(
            temp.path(),
            "a.json",
            &serde_json::json!({
                "ego_vehicle_movement": {"parked": [[0, 25]]},
                "time": {"start_time": 0.0, "end_time": 50.0},
            }),
        );

        let mut output = Vec::new();
        let args = AnalyzeArgs {
            src_dir: temp.path().to_path_buf(),
            recursive: false,
            json: true,
        };
        run(&mut output, &args).unwrap();

        let report: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(report["total_log_time"], serde_json::json!(50.0));
        assert_eq!(report["movement"]["parked"], serde_json::json!("25 (100.0%)"));
        assert_eq!(report["movement"]["total"], serde_json::json!("25 (100.0%)"));
    }

    #[test]
    fn unparseable_documents_are_skipped_not_fatal() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("broken.json"), "{oops").unwrap();
        write_doc(
            temp.path(),
            "good.json",
            &serde_json::json!({
                "ego_vehicle_movement": {"parked": [[0, 5]]},
            }),
        );

        let mut output = Vec::new();
        let args = AnalyzeArgs {
            src_dir: temp.path().to_path_buf(),
            recursive: false,
            json: false,
        };
        run(&mut output, &args).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Skipping"));
        assert!(output.contains("parked: 5 (100.0%)"));
    }
}
