use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::Metrics;
use super::result::{AnalysisResult, Metric};
use crate::dataset::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityLevel {
    Heavy,
    Moderate,
    Selective,
}

impl IntensityLevel {
    /// More than 50 plays/day is heavy, more than 20 moderate.
    pub fn from_average(avg_daily_plays: f64) -> Self {
        if avg_daily_plays > 50.0 {
            Self::Heavy
        } else if avg_daily_plays > 20.0 {
            Self::Moderate
        } else {
            Self::Selective
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Heavy => "heavy listener",
            Self::Moderate => "moderate listener",
            Self::Selective => "selective listener",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Heavy => "🎧",
            Self::Moderate => "🎵",
            Self::Selective => "🎶",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListeningIntensity {
    /// Mean plays over the days that have any plays.
    pub avg_daily_plays: f64,
    pub max_daily_plays: u64,
    pub level: IntensityLevel,
    /// Plays per calendar date, oldest first.
    pub daily_counts: Vec<(NaiveDate, u64)>,
    /// Whole days between first and last play, when more than zero.
    pub total_days: Option<i64>,
    pub total_plays: usize,
}

/// Per-date play statistics. `None` when no row has a usable timestamp.
pub fn analyze(ds: &Dataset) -> Option<ListeningIntensity> {
    let mut per_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for f in ds.events.iter().filter_map(|e| e.features.as_ref()) {
        *per_date.entry(f.date).or_default() += 1;
    }
    if per_date.is_empty() {
        log::debug!("Intensity analysis skipped: no dated plays");
        return None;
    }

    let daily_counts: Vec<(NaiveDate, u64)> = per_date.into_iter().collect();
    let total: u64 = daily_counts.iter().map(|(_, c)| c).sum();
    let avg_daily_plays = total as f64 / daily_counts.len() as f64;
    let max_daily_plays = daily_counts.iter().map(|(_, c)| *c).max().unwrap_or(0);

    Some(ListeningIntensity {
        avg_daily_plays,
        max_daily_plays,
        level: IntensityLevel::from_average(avg_daily_plays),
        daily_counts,
        total_days: ds.days_span().filter(|d| *d > 0),
        total_plays: ds.len(),
    })
}

impl Metrics for ListeningIntensity {
    fn metrics(&self) -> AnalysisResult {
        let daily = self
            .daily_counts
            .iter()
            .map(|(d, c)| (d.format("%Y-%m-%d").to_string(), *c))
            .collect();
        let mut result = AnalysisResult::new()
            .with("avg_daily_plays", self.avg_daily_plays)
            .with("max_daily_plays", self.max_daily_plays)
            .with("intensity_type", self.level.label())
            .with("daily_counts", Metric::Counts(daily));
        if let Some(days) = self.total_days {
            result.insert("total_days", days);
            result.insert("total_plays", self.total_plays);
        }
        result
    }

    fn insights(&self) -> Vec<String> {
        vec![format!(
            "{} You're a {} ({:.0} songs/day average)",
            self.level.emoji(),
            self.level.label(),
            self.avg_daily_plays
        )]
    }
}
