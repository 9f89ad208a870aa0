use std::collections::HashSet;

use serde::Serialize;

use crate::dataset::Dataset;

/// Headline numbers for the whole export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_plays: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_artists: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_span: Option<i64>,
    /// Total plays over the whole span; absent for a zero-day span.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_daily_plays: Option<f64>,
    /// Share of plays that were repeats of an already-counted track.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_ratio: Option<f64>,
}

pub fn summarize(ds: &Dataset) -> Summary {
    let total_plays = ds.len();

    let unique_artists = ds
        .has_artists()
        .then(|| distinct(ds.events.iter().filter_map(|e| e.artist_name.as_deref())));

    let days_span = ds.days_span();
    let avg_daily_plays = days_span
        .filter(|d| *d > 0)
        .map(|d| total_plays as f64 / d as f64);

    let repeat_ratio = (ds.has_tracks() && total_plays > 0).then(|| {
        let unique = distinct(ds.events.iter().filter_map(|e| e.track_name.as_deref()));
        (total_plays - unique) as f64 / total_plays as f64 * 100.0
    });

    Summary {
        total_plays,
        unique_artists,
        days_span,
        avg_daily_plays,
        repeat_ratio,
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.collect::<HashSet<_>>().len()
}
