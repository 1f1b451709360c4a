//! Validate command: check edited tag-specification files.
//!
//! Three layers run in order per file: JSON parsing, structural schema
//! validation, then the semantic interval checks. Every violation across
//! every file is printed before the command fails, so one run surfaces all
//! problems at once.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::Value;

use bt_core::{TagSchema, validate_category};

use crate::commands::util::collect_files;

/// The interval-bearing category the semantic walk anchors at.
const MOVEMENT_CATEGORY: &str = "ego_vehicle_movement";

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Tag-specification file, or a directory of .json files.
    pub src: PathBuf,

    /// Validate against a JSON Schema document instead of the built-in
    /// template.
    #[arg(long)]
    pub schema: Option<PathBuf>,
}

pub fn run<W: Write>(writer: &mut W, args: &ValidateArgs) -> Result<()> {
    let schema = load_schema(args.schema.as_deref())?;

    let targets = if args.src.is_dir() {
        collect_files(&args.src, false, "json")?
    } else if args.src.exists() {
        vec![args.src.clone()]
    } else {
        bail!("source not found: {}", args.src.display());
    };

    if targets.is_empty() {
        writeln!(writer, "No json files found - nothing to do.")?;
        return Ok(());
    }

    let mut violations = 0usize;
    for file in &targets {
        violations += validate_file(writer, file, &schema)?;
    }

    if violations > 0 {
        bail!("{violations} violation(s) found");
    }

    writeln!(writer, "specification valid")?;
    Ok(())
}

fn load_schema(path: Option<&Path>) -> Result<TagSchema> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let document: Value = serde_json::from_str(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            Ok(TagSchema::from_json_schema(&document)?)
        }
        None => Ok(TagSchema::default_template()),
    }
}

/// Validates one file, printing each violation. Returns the violation
/// count; an unparseable file counts as one.
fn validate_file<W: Write>(writer: &mut W, path: &Path, schema: &TagSchema) -> Result<usize> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let document: Value = match serde_json::from_str(&text) {
        Ok(document) => document,
        Err(error) => {
            writeln!(writer, "{}: JSON parse error: {error}", path.display())?;
            return Ok(1);
        }
    };

    let mut count = 0usize;

    for violation in schema.validate(&document) {
        writeln!(writer, "{}: {violation}", path.display())?;
        count += 1;
    }

    if let Some(velocity) = document.get("velocity").and_then(Value::as_array) {
        if !velocity.iter().all(Value::is_number) {
            writeln!(writer, "{}: velocity: must contain only numbers", path.display())?;
            count += 1;
        }
    }

    for violation in validate_category(&document, MOVEMENT_CATEGORY) {
        writeln!(writer, "{}: {violation}", path.display())?;
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_document() -> serde_json::Map<String, Value> {
        TagSchema::default_template().empty_container().to_document()
    }

    fn write_doc(dir: &Path, name: &str, document: &serde_json::Map<String, Value>) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(document).unwrap()).unwrap();
        path
    }

    #[test]
    fn untouched_template_is_valid() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_doc(temp.path(), "spec.json", &template_document());

        let mut output = Vec::new();
        let args = ValidateArgs {
            src: path,
            schema: None,
        };
        run(&mut output, &args).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("specification valid"));
    }

    #[test]
    fn every_violation_is_printed_before_failing() {
        let temp = tempfile::tempdir().unwrap();
        let mut document = template_document();
        document.insert(
            "ego_vehicle_movement".to_string(),
            serde_json::json!({
                "lane_keep": [],
                "left_turn": [[5, 2]],
                "right_turn": [],
                "lane_change": [],
                "obstacle_avoidance": [],
                "stopped": [],
                "parked": [[1, 2, 3]],
                "pull_out": [],
                "pull_over": [],
            }),
        );
        document.insert("velocity".to_string(), serde_json::json!(["fast"]));
        let path = write_doc(temp.path(), "spec.json", &document);

        let mut output = Vec::new();
        let args = ValidateArgs {
            src: path,
            schema: None,
        };
        let err = run(&mut output, &args).unwrap_err();
        assert!(err.to_string().contains("3 violation(s) found"));

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("velocity: must contain only numbers"));
        assert!(output.contains("ego_vehicle_movement.left_turn[0]"));
        assert!(output.contains("ego_vehicle_movement.parked[0]"));
    }

    #[test]
    fn directory_mode_checks_every_file() {
        let temp = tempfile::tempdir().unwrap();
        write_doc(temp.path(), "good.json", &template_document());

        let mut bad = template_document();
        bad.shift_remove("location");
        write_doc(temp.path(), "bad.json", &bad);

        let mut output = Vec::new();
        let args = ValidateArgs {
            src: temp.path().to_path_buf(),
            schema: None,
        };
        let err = run(&mut output, &args).unwrap_err();
        assert!(err.to_string().contains("1 violation(s) found"));

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("bad.json"));
        assert!(output.contains("location: missing required category"));
    }

    #[test]
    fn unparseable_file_counts_as_a_violation() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut output = Vec::new();
        let args = ValidateArgs {
            src: path,
            schema: None,
        };
        let err = run(&mut output, &args).unwrap_err();
        assert!(err.to_string().contains("violation(s) found"));

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("JSON parse error"));
    }

    #[test]
    fn custom_json_schema_drives_validation() {
        let temp = tempfile::tempdir().unwrap();
        let schema_path = temp.path().join("schema.json");
        std::fs::write(
            &schema_path,
            serde_json::to_string(&serde_json::json!({
                "type": "object",
                "properties": {
                    "weather": {"type": "array", "items": {"enum": ["sunny", "rainy"]}},
                },
            }))
            .unwrap(),
        )
        .unwrap();

        let doc_path = temp.path().join("spec.json");
        std::fs::write(&doc_path, r#"{"weather": ["rainy"]}"#).unwrap();

        let mut output = Vec::new();
        let args = ValidateArgs {
            src: doc_path,
            schema: Some(schema_path),
        };
        run(&mut output, &args).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("specification valid"));
    }
}
