//! Session report
//!
//! Filters the captured lines down to telemetry frames (lines carrying the
//! record prefix, `R:` by default) and summarizes them as a count plus the
//! first and last few frames. With few frames the head and tail overlap and
//! the same frame shows up in both; that is the expected output.
//!
//! Output goes through a [`ReportSink`] so callers pick the destination and
//! format; tests use [`MemorySink`].

use crate::config::ReportConfig;
use crate::core::collector::{Capture, StopReason};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::io::Write;

/// Separator printed between head and tail when frames were elided
pub const ELLIPSIS: &str = "...";

/// Attitude parsed from an `R:<roll> P:<pitch> [Y:<yaw>]` frame, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attitude {
    /// Roll
    pub roll: f64,
    /// Pitch
    pub pitch: f64,
    /// Yaw, 0 when absent
    pub yaw: f64,
}

impl Attitude {
    /// Parse a frame; roll and pitch are required
    pub fn parse(line: &str) -> Option<Self> {
        let mut roll = None;
        let mut pitch = None;
        let mut yaw = 0.0;

        for field in line.split_whitespace() {
            if let Some(value) = field.strip_prefix("R:") {
                roll = value.parse().ok();
            } else if let Some(value) = field.strip_prefix("P:") {
                pitch = value.parse().ok();
            } else if let Some(value) = field.strip_prefix("Y:") {
                yaw = value.parse().unwrap_or(0.0);
            }
        }

        Some(Self {
            roll: roll?,
            pitch: pitch?,
            yaw,
        })
    }
}

/// Read-only summary of one run
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    frames: Vec<String>,
    head_len: usize,
    tail_len: usize,
    stop_reason: Option<StopReason>,
    discarded_bytes: usize,
    lossy_lines: u64,
}

impl SessionReport {
    /// Keep the lines starting with the configured prefix, in order
    pub fn from_lines<S: AsRef<str>>(lines: &[S], config: &ReportConfig) -> Self {
        let frames = lines
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|line| line.starts_with(config.prefix.as_str()))
            .map(str::to_string)
            .collect();

        Self {
            frames,
            head_len: config.head,
            tail_len: config.tail,
            stop_reason: None,
            discarded_bytes: 0,
            lossy_lines: 0,
        }
    }

    /// Build from a capture, keeping its stop reason
    pub fn from_capture(capture: &Capture, config: &ReportConfig) -> Self {
        let mut report = Self::from_lines(&capture.lines, config);
        report.stop_reason = Some(capture.stop_reason);
        report.discarded_bytes = capture.discarded_bytes;
        report.lossy_lines = capture.lossy_lines;
        report
    }

    /// Number of telemetry frames
    pub fn count(&self) -> usize {
        self.frames.len()
    }

    /// Every frame in receipt order
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// First `min(head, count)` frames
    pub fn head(&self) -> &[String] {
        &self.frames[..self.head_len.min(self.count())]
    }

    /// Last `min(tail, count)` frames
    pub fn tail(&self) -> &[String] {
        let count = self.count();
        &self.frames[count - self.tail_len.min(count)..]
    }

    /// True when more frames exist than the head shows
    pub fn is_elided(&self) -> bool {
        self.count() > self.head_len
    }

    /// Why collection ended, when known
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Trailing bytes dropped because no line terminator followed
    pub fn discarded_bytes(&self) -> usize {
        self.discarded_bytes
    }

    /// Lines decoded with replacement characters
    pub fn lossy_lines(&self) -> u64 {
        self.lossy_lines
    }

    /// Frames that parse as attitude records
    pub fn attitudes(&self) -> Vec<Attitude> {
        self.frames.iter().filter_map(|f| Attitude::parse(f)).collect()
    }

    /// The plain-text report, one entry per output line
    pub fn render_lines(&self) -> Vec<String> {
        let mut out = vec![format!("telemetry_lines: {}", self.count())];
        if self.count() == 0 {
            return out;
        }
        out.extend(self.head().iter().cloned());
        if self.is_elided() {
            out.push(ELLIPSIS.to_string());
        }
        out.extend(self.tail().iter().cloned());
        out
    }
}

/// Destination for a finished report
pub trait ReportSink {
    /// Write the whole report
    fn emit(&mut self, report: &SessionReport) -> std::io::Result<()>;
}

/// Plain-text report writer
pub struct TextSink<W: Write> {
    writer: W,
}

impl<W: Write> TextSink<W> {
    /// Create a new text sink
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for TextSink<W> {
    fn emit(&mut self, report: &SessionReport) -> std::io::Result<()> {
        for line in report.render_lines() {
            writeln!(self.writer, "{line}")?;
        }
        self.writer.flush()
    }
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    telemetry_lines: usize,
    head: &'a [String],
    tail: &'a [String],
    elided: bool,
    stop_reason: Option<StopReason>,
    discarded_bytes: usize,
    lossy_lines: u64,
    attitudes: Vec<Attitude>,
    generated_at: DateTime<Local>,
}

/// JSON report writer, one document per report
pub struct JsonSink<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonSink<W> {
    /// Create a compact JSON sink
    pub fn new(writer: W) -> Self {
        Self { writer, pretty: false }
    }

    /// Pretty-print the document
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn emit(&mut self, report: &SessionReport) -> std::io::Result<()> {
        let document = ReportDocument {
            telemetry_lines: report.count(),
            head: report.head(),
            tail: report.tail(),
            elided: report.is_elided(),
            stop_reason: report.stop_reason(),
            discarded_bytes: report.discarded_bytes(),
            lossy_lines: report.lossy_lines(),
            attitudes: report.attitudes(),
            generated_at: Local::now(),
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &document)?;
        } else {
            serde_json::to_writer(&mut self.writer, &document)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

/// Collects rendered report lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Every line emitted so far
    pub lines: Vec<String>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportSink for MemorySink {
    fn emit(&mut self, report: &SessionReport) -> std::io::Result<()> {
        self.lines.extend(report.render_lines());
        Ok(())
    }
}
