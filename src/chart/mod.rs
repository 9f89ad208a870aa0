//! Chart specifications for the listening-pattern dashboard.
//!
//! Rendering is left to whatever consumes the spec; this module only lays out
//! the fixed 2×2 grid and hands it to a [`ChartSink`].

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::Report;
use crate::analysis::intensity::ListeningIntensity;
use crate::analysis::temporal::TemporalPatterns;

const PRIMARY_GREEN: &str = "#1DB954";
const SECONDARY_GREEN: &str = "#1ED760";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    Bar,
    Line,
}

/// One subplot in the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub row: u8,
    pub col: u8,
    pub title: String,
    pub kind: PanelKind,
    pub name: String,
    pub color: String,
    pub x: Vec<String>,
    pub y: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub rows: u8,
    pub cols: u8,
    pub height: u32,
    pub show_legend: bool,
    pub panels: Vec<Panel>,
}

/// Destination for a finished chart spec.
pub trait ChartSink {
    fn emit(&mut self, spec: &ChartSpec) -> Result<(), ChartError>;
}

/// Writes the spec as pretty-printed JSON.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChartSink for JsonFileSink {
    fn emit(&mut self, spec: &ChartSpec) -> Result<(), ChartError> {
        let json = serde_json::to_string_pretty(spec)?;
        std::fs::write(&self.path, json).map_err(|source| ChartError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::info!("Wrote chart spec to {}", self.path.display());
        Ok(())
    }
}

/// Build the 2×2 dashboard from a report. `None` without temporal data.
pub fn build(report: &Report) -> Option<ChartSpec> {
    Some(build_from(
        report.temporal.as_ref()?,
        report.intensity.as_ref(),
    ))
}

/// Hourly and weekday bars on top, monthly bars and the daily trend below.
pub fn build_from(
    temporal: &TemporalPatterns,
    intensity: Option<&ListeningIntensity>,
) -> ChartSpec {
    let hourly = temporal
        .active_hours()
        .into_iter()
        .map(|(h, c)| (h.to_string(), c))
        .collect();
    let trend = intensity
        .map(|i| {
            i.daily_counts
                .iter()
                .map(|(d, c)| (d.format("%Y-%m-%d").to_string(), *c))
                .collect()
        })
        .unwrap_or_default();

    ChartSpec {
        title: "⏰ Your Music Listening Patterns".to_string(),
        rows: 2,
        cols: 2,
        height: 800,
        show_legend: false,
        panels: vec![
            Panel::new((1, 1), PanelKind::Bar, "🕐 Listening by Hour", "Hourly", PRIMARY_GREEN)
                .with_data(hourly),
            Panel::new((1, 2), PanelKind::Bar, "📅 Listening by Day", "Daily", SECONDARY_GREEN)
                .with_data(temporal.weekday_table()),
            Panel::new(
                (2, 1),
                PanelKind::Bar,
                "📆 Monthly Patterns",
                "Monthly",
                SECONDARY_GREEN,
            )
            .with_data(temporal.month_table()),
            Panel::new(
                (2, 2),
                PanelKind::Line,
                "📈 Listening Trend",
                "Daily Trend",
                PRIMARY_GREEN,
            )
            .with_data(trend),
        ],
    }
}

impl Panel {
    fn new(cell: (u8, u8), kind: PanelKind, title: &str, name: &str, color: &str) -> Self {
        Self {
            row: cell.0,
            col: cell.1,
            title: title.to_string(),
            kind,
            name: name.to_string(),
            color: color.to_string(),
            x: Vec::new(),
            y: Vec::new(),
        }
    }

    /// Fill the axes from label → count pairs, keeping their order.
    fn with_data(mut self, points: Vec<(String, u64)>) -> Self {
        (self.x, self.y) = points.into_iter().unzip();
        self
    }
}
