//! Destinations for trace lines.

use super::flags::DebugFlags;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

/// Spaces per nesting level in rendered trace lines.
const INDENT_SIZE: usize = 2;

/// One step-by-step trace line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceLine {
    /// Instance that produced the line.
    pub machine: Uuid,
    /// Nesting depth inside the algorithm.
    pub depth: usize,
    /// The single flag that enabled this line.
    pub category: DebugFlags,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl TraceLine {
    /// Classic rendering: a bar, then two spaces per level, then the message.
    pub fn render(&self) -> String {
        format!("|{:width$}{}", "", self.message, width = self.depth * INDENT_SIZE)
    }
}

/// Receives trace lines from a machine.
///
/// Sinks are called with the machine's lock held and must not call back
/// into the machine.
pub trait DebugSink: Send + Sync {
    fn line(&self, line: &TraceLine);
}

/// Forwards every line as a `tracing` debug event with target `chsm`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn line(&self, line: &TraceLine) {
        tracing::debug!(
            target: "chsm",
            machine = %line.machine,
            depth = line.depth,
            category = %line.category,
            "{}",
            line.message
        );
    }
}

/// Writes rendered lines to standard error.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrSink;

impl DebugSink for StderrSink {
    fn line(&self, line: &TraceLine) {
        eprintln!("{}", line.render());
    }
}

/// Writes each line as one JSON object per line to any writer.
pub struct JsonLinesSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Write lines to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> DebugSink for JsonLinesSink<W> {
    fn line(&self, line: &TraceLine) {
        let mut out = self.out.lock();
        let written = serde_json::to_writer(&mut *out, line)
            .map_err(std::io::Error::from)
            .and_then(|()| out.write_all(b"\n"));
        if let Err(err) = written {
            tracing::warn!(%err, "failed to write trace line");
        }
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<TraceLine>>,
}

impl RecordingSink {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every recorded line, oldest first.
    pub fn lines(&self) -> Vec<TraceLine> {
        self.lines.lock().clone()
    }

    /// Messages without indentation, in emission order.
    pub fn messages(&self) -> Vec<String> {
        self.lines.lock().iter().map(|l| l.message.clone()).collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl DebugSink for RecordingSink {
    fn line(&self, line: &TraceLine) {
        self.lines.lock().push(line.clone());
    }
}
