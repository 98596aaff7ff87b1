//! Startup / stand-up ramp trace (`t,pitch,target_pitch_deg,mode`)

use super::{CsvTable, Figure, Panel, Series, TraceError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Printed when a trace was recorded without the target column
pub const MISSING_TARGET_HINT: &str = "missing target_pitch_deg; run sim with --trace";

/// Pitch against its target during the startup ramp
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartupTrace {
    /// Time (s)
    pub t: Vec<f64>,
    /// Measured pitch (deg)
    pub pitch: Vec<f64>,
    /// Commanded pitch (deg)
    pub target_pitch_deg: Vec<f64>,
    /// Controller mode per sample
    pub mode: Vec<i64>,
}

/// Result of loading a startup trace
#[derive(Debug, Clone, PartialEq)]
pub enum StartupLoad {
    /// Trace loaded
    Loaded(StartupTrace),
    /// The file has no `target_pitch_deg` column; nothing to plot
    MissingTarget,
}

impl StartupTrace {
    /// Load from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<StartupLoad, TraceError> {
        let table = CsvTable::read(reader)?;
        if !table.has_column("target_pitch_deg") {
            return Ok(StartupLoad::MissingTarget);
        }

        // Written as a float by the sim; truncate like an int cast
        #[allow(clippy::cast_possible_truncation)]
        let mode = table.floats("mode")?.into_iter().map(|m| m as i64).collect();

        Ok(StartupLoad::Loaded(Self {
            t: table.floats("t")?,
            pitch: table.floats("pitch")?,
            target_pitch_deg: table.floats("target_pitch_deg")?,
            mode,
        }))
    }

    /// Load from a file
    pub fn from_path(path: &Path) -> Result<StartupLoad, TraceError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.t.len()
    }

    /// True when the trace has no samples
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Pitch and target pitch on one panel
    pub fn figure(&self) -> Figure {
        Figure {
            title: Some("Startup / Stand-up Ramp".to_string()),
            panels: vec![Panel {
                y_label: "deg".to_string(),
                x_label: Some("t (s)".to_string()),
                x: self.t.clone(),
                series: vec![
                    Series::new("pitch (deg)", self.pitch.clone()),
                    Series::new("target_pitch (deg)", self.target_pitch_deg.clone()),
                ],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_trace() {
        let csv = "t,pitch,target_pitch_deg,mode,left\n0.0,-25.0,-25.0,0.0,1\n0.5,-12.5,-10.0,2.0,1\n";
        let StartupLoad::Loaded(trace) = StartupTrace::from_reader(csv.as_bytes()).unwrap() else {
            panic!("expected a loaded trace");
        };
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.pitch, [-25.0, -12.5]);
        assert_eq!(trace.target_pitch_deg, [-25.0, -10.0]);
        assert_eq!(trace.mode, [0, 2]);
    }

    #[test]
    fn test_mode_truncates() {
        let csv = "t,pitch,target_pitch_deg,mode\n0,0,0,3.9\n0,0,0,-1.5\n";
        let StartupLoad::Loaded(trace) = StartupTrace::from_reader(csv.as_bytes()).unwrap() else {
            panic!("expected a loaded trace");
        };
        assert_eq!(trace.mode, [3, -1]);
    }

    #[test]
    fn test_missing_target_is_not_an_error() {
        let csv = "t,pitch,mode\n0,0,0\n";
        assert_eq!(StartupTrace::from_reader(csv.as_bytes()).unwrap(), StartupLoad::MissingTarget);
    }

    #[test]
    fn test_bad_mode_is_schema_error() {
        let csv = "t,pitch,target_pitch_deg,mode\n0,0,0,balance\n";
        assert!(matches!(
            StartupTrace::from_reader(csv.as_bytes()),
            Err(TraceError::InvalidNumber { line: 2, .. })
        ));
    }
}
