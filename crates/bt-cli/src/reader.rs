//! Line-wise event-log reading.
//!
//! The stand-in for the external decoder: recordings arrive as JSONL files,
//! one decoded `(topic, log_time, message)` event per line, already in
//! non-decreasing timestamp order. Events are yielded lazily so the whole
//! stream is never held in memory.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use bt_core::LogEvent;

/// Lazy reader over one recording's event log.
#[derive(Debug)]
pub struct EventLogReader {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
    line_no: usize,
}

impl EventLogReader {
    /// Opens `path` for streaming. A missing or unreadable source is a
    /// fatal precondition for the whole pass, checked here before any
    /// event is consumed.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("source not found: {}", path.display());
        }
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            path: path.to_path_buf(),
            line_no: 0,
        })
    }
}

impl Iterator for EventLogReader {
    type Item = LogEvent;

    /// Yields the next decodable event. Unreadable or malformed lines are
    /// skipped with a warning; they never abort the pass.
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;

            let line = match line {
                Ok(line) => line,
                Err(error) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = self.line_no,
                        %error,
                        "skipping unreadable line"
                    );
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<LogEvent>(&line) {
                Ok(event) => return Some(event),
                Err(error) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = self.line_no,
                        %error,
                        "skipping undecodable event"
                    );
                }
            }
        }
    }
}
