//! Batch command: tag every recording under a directory.
//!
//! Recordings are independent units of work: each worker owns its own
//! container and reader, so the fan-out needs no shared mutable state. A
//! failed unit is reported and skipped; the rest of the batch still runs
//! and its results are kept.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use rayon::prelude::*;
use serde_json::Value;

use crate::Config;
use crate::commands::convert;
use crate::commands::util::collect_files;

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Directory containing .jsonl event logs.
    pub src_dir: PathBuf,

    /// Directory for tag documents (default: next to each log).
    #[arg(short = 'd', long)]
    pub out_dir: Option<PathBuf>,

    /// Scan sub-directories too.
    #[arg(short, long)]
    pub recursive: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &BatchArgs, config: &Config) -> Result<()> {
    let targets = collect_files(&args.src_dir, args.recursive, "jsonl")?;
    if targets.is_empty() {
        writeln!(writer, "No event logs found - nothing to do.")?;
        return Ok(());
    }

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    writeln!(writer, "Tagging {} recording(s)...", targets.len())?;

    let results: Vec<(PathBuf, Result<PathBuf>)> = targets
        .par_iter()
        .map(|source| {
            let result = process(source, args.out_dir.as_deref(), config);
            (source.clone(), result)
        })
        .collect();

    let mut failed = 0usize;
    for (source, result) in &results {
        let name = source
            .file_name()
            .map_or_else(|| source.display().to_string(), |n| n.to_string_lossy().to_string());
        match result {
            Ok(out_path) => {
                let out_name = out_path
                    .file_name()
                    .map_or_else(|| out_path.display().to_string(), |n| n.to_string_lossy().to_string());
                writeln!(writer, "  {name} -> {out_name}")?;
            }
            Err(error) => {
                failed += 1;
                writeln!(writer, "  {name}: {error}")?;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} recordings failed", results.len());
    }

    writeln!(writer, "Batch tagging finished")?;
    Ok(())
}

/// Tags one recording and writes its document. Failures abort this unit
/// only.
fn process(source: &Path, out_dir: Option<&Path>, config: &Config) -> Result<PathBuf> {
    let (document, _summary) = convert::tag_recording(source, config)?;

    let out_path = out_dir.map_or_else(
        || convert::default_output(source),
        |dir| {
            let default = convert::default_output(source);
            let name = default
                .file_name()
                .map_or_else(|| PathBuf::from("tags.json"), PathBuf::from);
            dir.join(name)
        },
    );

    let json = serde_json::to_string_pretty(&Value::Object(document))?;
    std::fs::write(&out_path, format!("{json}\n"))
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_log(dir: &Path, name: &str, label: i64) {
        let line = format!(
            r#"{{"topic":"/perception/object_recognition/objects","log_time":1000000000,"message":{{"objects":[{{"classification":[{{"label":{label}}}]}}]}}}}"#
        );
        std::fs::write(dir.join(name), format!("{line}\n")).unwrap();
    }

    #[test]
    fn batch_tags_every_recording_into_out_dir() {
        let temp = tempfile::tempdir().unwrap();
        write_log(temp.path(), "a.jsonl", 1);
        write_log(temp.path(), "b.jsonl", 7);
        let out_dir = temp.path().join("tags");

        let mut output = Vec::new();
        let args = BatchArgs {
            src_dir: temp.path().to_path_buf(),
            out_dir: Some(out_dir.clone()),
            recursive: false,
        };
        run(&mut output, &args, &Config::default()).unwrap();

        let a: Value =
            serde_json::from_str(&std::fs::read_to_string(out_dir.join("a.tags.json")).unwrap())
                .unwrap();
        assert_eq!(a["dynamic_object"]["vehicle"], serde_json::json!(["car"]));

        let b: Value =
            serde_json::from_str(&std::fs::read_to_string(out_dir.join("b.tags.json")).unwrap())
                .unwrap();
        assert_eq!(
            b["dynamic_object"]["pedestrian"],
            serde_json::json!(["pedestrian"])
        );

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Tagging 2 recording(s)"));
        assert!(output.contains("Batch tagging finished"));
    }

    #[test]
    fn empty_directory_is_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let mut output = Vec::new();
        let args = BatchArgs {
            src_dir: temp.path().to_path_buf(),
            out_dir: None,
            recursive: false,
        };
        run(&mut output, &args, &Config::default()).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("No event logs found"));
    }
}
