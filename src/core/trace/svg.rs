//! SVG figure rendering

use super::{Figure, Panel, Renderer, TraceError};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Line colors, cycled per series
const PALETTE: [&str; 6] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b"];

/// Writes a figure to an SVG file, panels stacked vertically
pub struct SvgRenderer {
    path: PathBuf,
    width: u32,
    panel_height: u32,
    margin: u32,
}

impl SvgRenderer {
    /// Render into `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width: 1000,
            panel_height: 400,
            margin: 60,
        }
    }

    /// Output path
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Render the figure to an SVG document
    pub fn to_svg(&self, figure: &Figure) -> String {
        let title_height = if figure.title.is_some() { 30 } else { 0 };
        let panel_count = u32::try_from(figure.panels.len()).unwrap_or(u32::MAX);
        let height = title_height + self.panel_height.saturating_mul(panel_count.max(1));

        let mut svg = String::new();

        // SVG header
        let _ = write!(
            svg,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{height}" viewBox="0 0 {w} {height}">
  <style>
    .grid {{ stroke: #e0e0e0; stroke-width: 0.5; }}
    .axis {{ stroke: #333; stroke-width: 1; }}
    .label {{ font-family: sans-serif; font-size: 12px; fill: #333; }}
    .title {{ font-family: sans-serif; font-size: 16px; fill: #333; font-weight: bold; }}
    .legend {{ font-family: sans-serif; font-size: 11px; fill: #333; }}
  </style>
  <rect width="100%" height="100%" fill="white"/>
"#,
            w = self.width,
        );

        if let Some(title) = &figure.title {
            let _ = writeln!(
                svg,
                r#"  <text x="{}" y="22" class="title" text-anchor="middle">{}</text>"#,
                self.width / 2,
                escape(title)
            );
        }

        let mut top = title_height;
        for panel in &figure.panels {
            self.write_panel(&mut svg, panel, top);
            top += self.panel_height;
        }

        svg.push_str("</svg>\n");
        svg
    }

    fn write_panel(&self, svg: &mut String, panel: &Panel, top: u32) {
        let plot_width = f64::from(self.width - 2 * self.margin);
        let plot_height = f64::from(self.panel_height - 2 * self.margin);
        let x_range = padded_range(panel.x.iter().copied());
        let y_range = padded_range(panel.series.iter().flat_map(|s| s.values.iter().copied()));

        let _ = writeln!(svg, r#"  <g transform="translate({}, {})">"#, self.margin, top + self.margin);

        // Grid lines
        for i in 0..=10 {
            let x = f64::from(i) / 10.0 * plot_width;
            let y = f64::from(i) / 10.0 * plot_height;
            let _ = writeln!(svg, r#"    <line x1="{x:.1}" y1="0" x2="{x:.1}" y2="{plot_height}" class="grid"/>"#);
            let _ = writeln!(svg, r#"    <line x1="0" y1="{y:.1}" x2="{plot_width}" y2="{y:.1}" class="grid"/>"#);
        }

        // Axis
        let _ = writeln!(
            svg,
            r#"    <line x1="0" y1="{plot_height}" x2="{plot_width}" y2="{plot_height}" class="axis"/>
    <line x1="0" y1="0" x2="0" y2="{plot_height}" class="axis"/>"#
        );
        for i in 0..=5 {
            let fraction = f64::from(i) / 5.0;
            let x_val = x_range.0 + fraction * (x_range.1 - x_range.0);
            let y_val = y_range.0 + fraction * (y_range.1 - y_range.0);
            let _ = writeln!(
                svg,
                r#"    <text x="{:.1}" y="{:.1}" class="label" text-anchor="middle">{x_val:.2}</text>"#,
                fraction * plot_width,
                plot_height + 18.0
            );
            let _ = writeln!(
                svg,
                r#"    <text x="-8" y="{:.1}" class="label" text-anchor="end" dominant-baseline="middle">{y_val:.2}</text>"#,
                plot_height - fraction * plot_height
            );
        }
        let _ = writeln!(
            svg,
            r#"    <text x="-45" y="{:.1}" class="label" text-anchor="middle" transform="rotate(-90 -45 {:.1})">{}</text>"#,
            plot_height / 2.0,
            plot_height / 2.0,
            escape(&panel.y_label)
        );
        if let Some(x_label) = &panel.x_label {
            let _ = writeln!(
                svg,
                r#"    <text x="{:.1}" y="{:.1}" class="label" text-anchor="middle">{}</text>"#,
                plot_width / 2.0,
                plot_height + 38.0,
                escape(x_label)
            );
        }

        // Data series
        for (index, series) in panel.series.iter().enumerate() {
            let color = PALETTE[index % PALETTE.len()];
            let mut path = String::new();
            for (x, y) in panel.x.iter().zip(&series.values) {
                let px = (x - x_range.0) / (x_range.1 - x_range.0) * plot_width;
                let py = plot_height - (y - y_range.0) / (y_range.1 - y_range.0) * plot_height;
                let command = if path.is_empty() { 'M' } else { 'L' };
                let _ = write!(path, "{command}{px:.2},{py:.2} ");
            }
            if !path.is_empty() {
                let _ = writeln!(
                    svg,
                    r#"    <path d="{}" fill="none" stroke="{color}" stroke-width="1.5"/>"#,
                    path.trim_end()
                );
            }
        }

        // Legend
        if !panel.series.is_empty() {
            let _ = writeln!(
                svg,
                "    <g transform=\"translate({:.1}, 10)\">\n      <rect x=\"0\" y=\"0\" width=\"150\" height=\"{}\" fill=\"white\" stroke=\"#ccc\" rx=\"5\"/>",
                plot_width - 160.0,
                panel.series.len() * 20 + 10
            );
            for (index, series) in panel.series.iter().enumerate() {
                let y = 15 + index * 20;
                let color = PALETTE[index % PALETTE.len()];
                let _ = writeln!(
                    svg,
                    "      <line x1=\"10\" y1=\"{y}\" x2=\"30\" y2=\"{y}\" stroke=\"{color}\" stroke-width=\"2\"/>\n      <text x=\"40\" y=\"{}\" class=\"legend\">{}</text>",
                    y + 4,
                    escape(&series.name)
                );
            }
            svg.push_str("    </g>\n");
        }

        svg.push_str("  </g>\n");
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, figure: &Figure) -> Result<(), TraceError> {
        std::fs::write(&self.path, self.to_svg(figure))?;
        tracing::info!(path = %self.path.display(), "figure written");
        Ok(())
    }
}

/// Min/max of the values, widened so the range is never empty
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if min > max {
        (0.0, 1.0)
    } else if (max - min).abs() < f64::EPSILON {
        (min - 1.0, max + 1.0)
    } else {
        let pad = (max - min) * 0.05;
        (min - pad, max + pad)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
