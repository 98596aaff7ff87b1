//! Raw IMU sensor trace (`t,gx,gy,gz,ax,ay,az`)

use super::{CsvTable, Figure, Panel, Series, TraceError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Gyro and accelerometer samples, one entry per CSV row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorTrace {
    /// Time (s)
    pub t: Vec<f64>,
    /// Gyro X
    pub gx: Vec<f64>,
    /// Gyro Y
    pub gy: Vec<f64>,
    /// Gyro Z
    pub gz: Vec<f64>,
    /// Accel X
    pub ax: Vec<f64>,
    /// Accel Y
    pub ay: Vec<f64>,
    /// Accel Z
    pub az: Vec<f64>,
}

impl SensorTrace {
    /// Required header columns
    pub const COLUMNS: [&'static str; 7] = ["t", "gx", "gy", "gz", "ax", "ay", "az"];

    /// Load from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, TraceError> {
        let table = CsvTable::read(reader)?;
        for column in Self::COLUMNS {
            table.column(column)?;
        }

        Ok(Self {
            t: table.floats("t")?,
            gx: table.floats("gx")?,
            gy: table.floats("gy")?,
            gz: table.floats("gz")?,
            ax: table.floats("ax")?,
            ay: table.floats("ay")?,
            az: table.floats("az")?,
        })
    }

    /// Load from a file
    pub fn from_path(path: &Path) -> Result<Self, TraceError> {
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

    /// Gyro panel over accel panel, sharing the time axis
    pub fn figure(&self) -> Figure {
        Figure {
            title: None,
            panels: vec![
                Panel {
                    y_label: "gyro".to_string(),
                    x_label: None,
                    x: self.t.clone(),
                    series: vec![
                        Series::new("gx", self.gx.clone()),
                        Series::new("gy", self.gy.clone()),
                        Series::new("gz", self.gz.clone()),
                    ],
                },
                Panel {
                    y_label: "accel".to_string(),
                    x_label: Some("t (s)".to_string()),
                    x: self.t.clone(),
                    series: vec![
                        Series::new("ax", self.ax.clone()),
                        Series::new("ay", self.ay.clone()),
                        Series::new("az", self.az.clone()),
                    ],
                },
            ],
        }
    }
}
