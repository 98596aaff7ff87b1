//! Trace loading for the plotting tools
//!
//! The simulator writes CSV traces; the plotting tools turn them into typed
//! series and hand a [`Figure`] to a [`Renderer`]. Loading is pure, so the
//! CSV → series transformation is testable without a drawing backend.

mod sensor;
mod startup;
#[cfg(feature = "svg")]
mod svg;

pub use sensor::SensorTrace;
pub use startup::{StartupLoad, StartupTrace, MISSING_TARGET_HINT};
#[cfg(feature = "svg")]
pub use svg::SvgRenderer;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// CSV schema and I/O errors
#[derive(Error, Debug)]
pub enum TraceError {
    /// File could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No header line
    #[error("CSV file is empty")]
    Empty,

    /// Header lacks a required column
    #[error("missing column '{0}'")]
    MissingColumn(String),

    /// A row is shorter than the header
    #[error("line {line}: no value for column '{column}'")]
    MissingValue {
        /// 1-based line number
        line: usize,
        /// Column name
        column: String,
    },

    /// A value does not parse as a number
    #[error("line {line}: column '{column}' is not a number: {value:?}")]
    InvalidNumber {
        /// 1-based line number
        line: usize,
        /// Column name
        column: String,
        /// Offending text
        value: String,
    },

    /// The rendered figure would replace the trace it was drawn from
    #[error("output {} would overwrite the input trace", .0.display())]
    OutputIsInput(PathBuf),
}

/// Where to write the rendered figure: `explicit`, or the CSV path with an
/// `.svg` extension. Refuses any path that names the input file.
pub fn output_path(csv_path: &Path, explicit: Option<&Path>) -> Result<PathBuf, TraceError> {
    let out = explicit.map_or_else(|| csv_path.with_extension("svg"), Path::to_path_buf);

    let same = out == csv_path
        || matches!(
            (std::fs::canonicalize(&out), std::fs::canonicalize(csv_path)),
            (Ok(a), Ok(b)) if a == b
        );
    if same {
        return Err(TraceError::OutputIsInput(out));
    }
    Ok(out)
}

/// A named series of values
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend label
    pub name: String,
    /// Values in row order
    pub values: Vec<f64>,
}

impl Series {
    /// Create a series
    pub fn new(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }
}

/// One set of axes sharing an x series
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// Y axis label
    pub y_label: String,
    /// X axis label, if shown
    pub x_label: Option<String>,
    /// Shared x values
    pub x: Vec<f64>,
    /// Plotted series
    pub series: Vec<Series>,
}

/// Everything a renderer draws
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    /// Figure title
    pub title: Option<String>,
    /// Panels, top to bottom
    pub panels: Vec<Panel>,
}

/// Drawing backend
pub trait Renderer {
    /// Draw the figure
    fn render(&mut self, figure: &Figure) -> Result<(), TraceError>;
}

/// Header plus raw rows of a CSV file
#[derive(Debug)]
struct CsvTable {
    columns: Vec<String>,
    // (1-based line number, fields)
    rows: Vec<(usize, Vec<String>)>,
}

impl CsvTable {
    /// Read a comma-separated table; blank lines are skipped
    fn read<R: BufRead>(reader: R) -> Result<Self, TraceError> {
        let mut lines = reader.lines().enumerate();

        let columns = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break split_fields(&line);
                    }
                }
                None => return Err(TraceError::Empty),
            }
        };

        let mut rows = Vec::new();
        for (index, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            rows.push((index + 1, split_fields(&line)));
        }

        Ok(Self { columns, rows })
    }

    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    fn column(&self, name: &str) -> Result<usize, TraceError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TraceError::MissingColumn(name.to_string()))
    }

    /// Parse one column as floats, in row order
    fn floats(&self, name: &str) -> Result<Vec<f64>, TraceError> {
        let index = self.column(name)?;
        self.rows
            .iter()
            .map(|(line, fields)| {
                let value = fields.get(index).ok_or_else(|| TraceError::MissingValue {
                    line: *line,
                    column: name.to_string(),
                })?;
                value.parse::<f64>().map_err(|_| TraceError::InvalidNumber {
                    line: *line,
                    column: name.to_string(),
                    value: value.clone(),
                })
            })
            .collect()
    }
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(',').map(|f| f.trim().to_string()).collect()
}
