use chrono::{Month, Weekday};

use super::Metrics;
use super::result::{AnalysisResult, Metric};
use crate::dataset::Dataset;
use crate::dataset::features::{WEEKDAYS, weekday_name};

/// Listening personality by peak hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalPersonality {
    MorningPerson,
    AfternoonListener,
    EveningLover,
    NightOwl,
}

impl TemporalPersonality {
    /// Half-open bands: [5,12) morning, [12,17) afternoon, [17,22) evening,
    /// anything else night.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::MorningPerson,
            12..=16 => Self::AfternoonListener,
            17..=21 => Self::EveningLover,
            _ => Self::NightOwl,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::MorningPerson => "Morning music person",
            Self::AfternoonListener => "Afternoon listener",
            Self::EveningLover => "Evening music lover",
            Self::NightOwl => "Night owl listener",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::MorningPerson => "🌅",
            Self::AfternoonListener => "☀️",
            Self::EveningLover => "🌆",
            Self::NightOwl => "🌙",
        }
    }
}

/// When the listening happens.
#[derive(Debug, Clone)]
pub struct TemporalPatterns {
    pub peak_hour: u32,
    pub personality: TemporalPersonality,
    pub peak_day: Weekday,
    /// Plays per hour of day, index = hour.
    pub hourly_counts: [u64; 24],
    /// Plays per weekday, Monday first.
    pub weekday_counts: [u64; 7],
    /// Plays per month, January first.
    pub monthly_counts: [u64; 12],
}

/// Aggregate plays by hour, weekday and month. `None` when no row has a
/// usable timestamp.
pub fn analyze(ds: &Dataset) -> Option<TemporalPatterns> {
    if !ds.has_features() {
        log::debug!("Temporal analysis skipped: no timestamp data");
        return None;
    }

    let mut hourly_counts = [0u64; 24];
    let mut weekday_counts = [0u64; 7];
    let mut monthly_counts = [0u64; 12];
    // Order in which weekdays first show up, for peak-day ties.
    let mut weekday_seen: Vec<Weekday> = Vec::with_capacity(7);

    for f in ds.events.iter().filter_map(|e| e.features.as_ref()) {
        hourly_counts[f.hour as usize] += 1;
        weekday_counts[f.weekday.num_days_from_monday() as usize] += 1;
        monthly_counts[f.month.number_from_month() as usize - 1] += 1;
        if !weekday_seen.contains(&f.weekday) {
            weekday_seen.push(f.weekday);
        }
    }

    let peak_hour = peak_index(&hourly_counts) as u32;

    let mut peak_day = weekday_seen[0];
    for &day in &weekday_seen[1..] {
        if weekday_counts[day.num_days_from_monday() as usize]
            > weekday_counts[peak_day.num_days_from_monday() as usize]
        {
            peak_day = day;
        }
    }

    Some(TemporalPatterns {
        peak_hour,
        personality: TemporalPersonality::from_hour(peak_hour),
        peak_day,
        hourly_counts,
        weekday_counts,
        monthly_counts,
    })
}

/// Index of the maximum; the lowest index wins ties.
fn peak_index(counts: &[u64]) -> usize {
    let mut best = 0;
    for (i, &c) in counts.iter().enumerate() {
        if c > counts[best] {
            best = i;
        }
    }
    best
}

impl TemporalPatterns {
    pub fn peak_day_name(&self) -> &'static str {
        weekday_name(self.peak_day)
    }

    /// Hours that have at least one play, ascending.
    pub fn active_hours(&self) -> Vec<(u32, u64)> {
        self.hourly_counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(h, c)| (h as u32, *c))
            .collect()
    }

    pub fn weekday_table(&self) -> Vec<(String, u64)> {
        WEEKDAYS
            .iter()
            .zip(self.weekday_counts)
            .map(|(d, c)| (weekday_name(*d).to_string(), c))
            .collect()
    }

    pub fn month_table(&self) -> Vec<(String, u64)> {
        (1u8..=12)
            .filter_map(|n| Month::try_from(n).ok())
            .zip(self.monthly_counts)
            .map(|(m, c)| (m.name().to_string(), c))
            .collect()
    }
}

impl Metrics for TemporalPatterns {
    fn metrics(&self) -> AnalysisResult {
        let hourly = self
            .active_hours()
            .into_iter()
            .map(|(h, c)| (h.to_string(), c))
            .collect();
        AnalysisResult::new()
            .with("peak_hour", self.peak_hour)
            .with("temporal_personality", self.personality.label())
            .with("personality_emoji", self.personality.emoji())
            .with("peak_day", self.peak_day_name())
            .with("hourly_counts", Metric::Counts(hourly))
            .with("weekday_counts", Metric::Counts(self.weekday_table()))
            .with("monthly_counts", Metric::Counts(self.month_table()))
    }

    fn insights(&self) -> Vec<String> {
        vec![
            format!(
                "{} You're a {} (peak at {}:00)",
                self.personality.emoji(),
                self.personality.label(),
                self.peak_hour
            ),
            format!("📅 {} is your biggest music day", self.peak_day_name()),
        ]
    }
}
