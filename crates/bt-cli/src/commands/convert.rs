//! Convert command: tag a single recording's event log.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};

use bt_core::{PassSummary, RuleEngine, TagSchema};

use crate::Config;
use crate::reader::EventLogReader;

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input event log (.jsonl).
    pub source: PathBuf,

    /// Destination JSON file (default: <source>.tags.json).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the document to stdout instead of writing it.
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &ConvertArgs, config: &Config) -> Result<()> {
    let (document, summary) = tag_recording(&args.source, config)?;
    let json = serde_json::to_string_pretty(&Value::Object(document))?;

    if args.dry_run {
        writeln!(writer, "{json}")?;
        return Ok(());
    }

    let out_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.source));
    std::fs::write(&out_path, format!("{json}\n"))
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    writeln!(writer, "Wrote {}", out_path.display())?;
    if let Some(span) = format_recording_span(&summary) {
        writeln!(writer, "{span}")?;
    }
    Ok(())
}

/// One full tagging pass over a recording. Shared with `batch`.
pub fn tag_recording(source: &Path, config: &Config) -> Result<(Map<String, Value>, PassSummary)> {
    let reader = EventLogReader::open(source)?;
    let mut tags = TagSchema::default_template().empty_container();
    let summary = RuleEngine::new(config.rule_config()).fold(reader, &mut tags)?;
    tracing::debug!(
        source = %source.display(),
        events = summary.events_seen,
        skipped = summary.events_skipped,
        "tagging pass finished"
    );
    Ok((tags.to_document(), summary))
}

/// `<stem>.tags.json` next to the source.
pub fn default_output(source: &Path) -> PathBuf {
    source.with_extension("tags.json")
}

#[allow(clippy::cast_possible_truncation)]
fn format_recording_span(summary: &PassSummary) -> Option<String> {
    let (start, end) = (summary.start_time?, summary.end_time?);
    let stamp = |secs: f64| {
        chrono::DateTime::from_timestamp(secs as i64, 0)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
    };
    Some(format!(
        "Recording spans {} - {} ({:.1} s)",
        stamp(start)?,
        stamp(end)?,
        end - start
    ))
}
