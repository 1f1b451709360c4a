//! Template command for emitting an empty tag document.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use bt_core::TagSchema;

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Write the template to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run<W: Write>(writer: &mut W, args: &TemplateArgs) -> Result<()> {
    let document = TagSchema::default_template().empty_container().to_document();
    let json = serde_json::to_string_pretty(&document)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(writer, "Template saved to {}", path.display())?;
        }
        None => writeln!(writer, "{json}")?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    #[test]
    fn template_prints_every_category_with_zero_values() {
        let mut output = Vec::new();
        run(&mut output, &TemplateArgs { output: None }).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r#"
        {
          "dynamic_object": {
            "vehicle": [],
            "two_wheeler": [],
            "pedestrian": [],
            "unknown": []
          },
          "ego_vehicle_movement": {
            "lane_keep": [],
            "left_turn": [],
            "right_turn": [],
            "lane_change": [],
            "obstacle_avoidance": [],
            "stopped": [],
            "parked": [],
            "pull_out": [],
            "pull_over": []
          },
          "location": [],
          "road_shape": [],
          "time_of_day": [],
          "vehicle_status": [],
          "velocity": []
        }
        "#);
    }

    #[test]
    fn template_written_to_file_round_trips_through_validate() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("template.json");

        let mut output = Vec::new();
        let args = TemplateArgs {
            output: Some(path.clone()),
        };
        run(&mut output, &args).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let document: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert!(TagSchema::default_template().validate(&document).is_empty());

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Template saved to"));
    }
}
