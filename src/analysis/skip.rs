use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Metrics;
use super::result::{AnalysisResult, Metric};
use crate::dataset::Dataset;

/// Tuning for the per-artist skip breakdown (the `[skip]` config table).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SkipOptions {
    /// Artists with fewer plays are left out of the rankings.
    pub min_artist_plays: u64,
    /// How many artists to list in each ranking.
    pub top_artists: usize,
}

impl Default for SkipOptions {
    fn default() -> Self {
        Self {
            min_artist_plays: 10,
            top_artists: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistSkipStat {
    pub artist: String,
    pub total_plays: u64,
    pub skip_count: u64,
    pub skip_rate: f64,
}

#[derive(Debug, Clone)]
pub struct SkipBehavior {
    /// Source column the skip flags came from.
    pub column: String,
    pub skipped: u64,
    pub overall_skip_rate: f64,
    /// Highest skip rate first.
    pub most_skipped: Option<Vec<ArtistSkipStat>>,
    /// Lowest skip rate first.
    pub least_skipped: Option<Vec<ArtistSkipStat>>,
}

/// Skip rates overall and per artist. `None` when the export has no skip column.
///
/// Rankings are only produced when artist names exist, something was skipped,
/// and at least one artist reaches `min_artist_plays`. Ties in skip rate are
/// broken by artist name.
pub fn analyze(ds: &Dataset, opts: &SkipOptions) -> Option<SkipBehavior> {
    let Some(skip) = ds.schema.skip.as_ref() else {
        log::debug!("Skip analysis skipped: no skip column");
        return None;
    };
    if ds.is_empty() {
        return None;
    }

    let skipped = ds
        .events
        .iter()
        .filter(|e| e.skipped == Some(true))
        .count() as u64;
    let overall_skip_rate = skipped as f64 / ds.len() as f64 * 100.0;

    let (most_skipped, least_skipped) = if ds.has_artists() && overall_skip_rate > 0.0 {
        let frequent = artist_skip_stats(ds, opts.min_artist_plays);
        if frequent.is_empty() {
            (None, None)
        } else {
            let (most, least) = rank(frequent, opts.top_artists);
            (Some(most), Some(least))
        }
    } else {
        (None, None)
    };

    Some(SkipBehavior {
        column: skip.column.name.clone(),
        skipped,
        overall_skip_rate,
        most_skipped,
        least_skipped,
    })
}

/// Per-artist totals for artists with at least `min_plays` plays, in artist
/// name order.
fn artist_skip_stats(ds: &Dataset, min_plays: u64) -> Vec<ArtistSkipStat> {
    let mut groups: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for event in &ds.events {
        if let Some(artist) = event.artist_name.as_deref() {
            let entry = groups.entry(artist).or_default();
            entry.0 += 1;
            if event.skipped == Some(true) {
                entry.1 += 1;
            }
        }
    }

    groups
        .into_iter()
        .filter(|(_, (total, _))| *total >= min_plays && *total > 0)
        .map(|(artist, (total_plays, skip_count))| ArtistSkipStat {
            artist: artist.to_string(),
            total_plays,
            skip_count,
            skip_rate: skip_count as f64 / total_plays as f64 * 100.0,
        })
        .collect()
}

/// Top `n` by skip rate descending and ascending. Stable sorts keep name
/// order among equal rates.
fn rank(stats: Vec<ArtistSkipStat>, n: usize) -> (Vec<ArtistSkipStat>, Vec<ArtistSkipStat>) {
    let mut most = stats.clone();
    most.sort_by(|a, b| b.skip_rate.total_cmp(&a.skip_rate));
    most.truncate(n);

    let mut least = stats;
    least.sort_by(|a, b| a.skip_rate.total_cmp(&b.skip_rate));
    least.truncate(n);

    (most, least)
}

impl Metrics for SkipBehavior {
    fn metrics(&self) -> AnalysisResult {
        let mut result = AnalysisResult::new()
            .with("skip_column", self.column.as_str())
            .with("overall_skip_rate", self.overall_skip_rate);
        if let (Some(most), Some(least)) = (&self.most_skipped, &self.least_skipped) {
            result.insert("most_skipped_artists", Metric::ArtistSkips(most.clone()));
            result.insert("least_skipped_artists", Metric::ArtistSkips(least.clone()));
        }
        result
    }

    fn insights(&self) -> Vec<String> {
        let mut out = vec![format!(
            "⏭️ You skip {:.1}% of the tracks you start",
            self.overall_skip_rate
        )];
        if let Some(top) = self.most_skipped.as_ref().and_then(|m| m.first()) {
            if top.skip_count > 0 {
                out.push(format!(
                    "🚫 {} gets skipped the most ({:.1}% of {} plays)",
                    top.artist, top.skip_rate, top.total_plays
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, table};

    /// Build a dataset from (artist, skip cell) pairs.
    fn dataset(column: &str, plays: &[(&str, &str)]) -> Dataset {
        let rows: Vec<Vec<&str>> = plays.iter().map(|(a, s)| vec![*a, *s]).collect();
        let rows: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
        Dataset::from_table(&table(&["artistName", column], &rows)).unwrap()
    }

    type Play = (&'static str, &'static str);

    fn repeat(artist: &'static str, skip: &'static str, n: usize) -> Vec<Play> {
        vec![(artist, skip); n]
    }

    fn names(stats: &Option<Vec<ArtistSkipStat>>) -> Vec<&str> {
        stats
            .iter()
            .flatten()
            .map(|a| a.artist.as_str())
            .collect()
    }

    #[test]
    fn test_no_skip_column_is_empty() {
        let ds = Dataset::from_table(&table(&["artistName"], &[&["A"]])).unwrap();
        assert!(analyze(&ds, &SkipOptions::default()).is_none());
    }

    #[test]
    fn test_boolean_overall_rate() {
        let mut plays = repeat("A", "true", 1);
        plays.extend(repeat("A", "false", 3));
        let s = analyze(&dataset("skipped", &plays), &SkipOptions::default()).unwrap();
        assert_eq!(s.column, "skipped");
        assert_eq!(s.skipped, 1);
        assert!((s.overall_skip_rate - 25.0).abs() < 1e-9);
        // nobody reaches 10 plays
        assert!(s.most_skipped.is_none());
        assert!(!s.metrics().contains_key("most_skipped_artists"));
    }

    #[test]
    fn test_categorical_reason_end() {
        let plays = vec![("A", "fwdbtn"), ("A", "skip"), ("B", "SKIP"), ("B", "trackdone")];
        let s = analyze(&dataset("reason_end", &plays), &SkipOptions::default()).unwrap();
        assert_eq!(s.column, "reason_end");
        assert!((s.overall_skip_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_plays_filter_excludes_small_artists() {
        let mut plays = repeat("A", "true", 9);
        plays.extend(repeat("B", "true", 2));
        plays.extend(repeat("B", "false", 8));
        plays.extend(repeat("C", "false", 12));
        let s = analyze(&dataset("skipped", &plays), &SkipOptions::default()).unwrap();

        let most = s.most_skipped.unwrap();
        let least = s.least_skipped.unwrap();
        assert!(most.iter().all(|a| a.artist != "A"));
        assert!(least.iter().all(|a| a.artist != "A"));
        assert_eq!(most[0].artist, "B");
        assert!((most[0].skip_rate - 20.0).abs() < 1e-9);
        assert_eq!(least[0].artist, "C");
        assert_eq!(least[0].skip_count, 0);
    }

    #[test]
    fn test_rankings_truncate_and_break_ties_by_name() {
        let mut plays = Vec::new();
        for artist in ["F", "E", "D", "C", "B", "A"] {
            plays.extend(repeat(artist, "true", 5));
            plays.extend(repeat(artist, "false", 5));
        }
        plays.extend(repeat("G", "false", 10));
        let s = analyze(&dataset("skipped", &plays), &SkipOptions::default()).unwrap();

        assert_eq!(names(&s.most_skipped), vec!["A", "B", "C", "D", "E"]);
        assert_eq!(names(&s.least_skipped), vec!["G", "A", "B", "C", "D"]);
    }

    #[test]
    fn test_zero_skip_rate_has_no_rankings() {
        let plays = repeat("A", "false", 12);
        let s = analyze(&dataset("skipped", &plays), &SkipOptions::default()).unwrap();
        assert_eq!(s.overall_skip_rate, 0.0);
        assert!(s.most_skipped.is_none());
        assert_eq!(s.insights().len(), 1);
    }

    #[test]
    fn test_custom_options() {
        let mut plays = repeat("A", "true", 3);
        plays.extend(repeat("B", "false", 3));
        let opts = SkipOptions {
            min_artist_plays: 3,
            top_artists: 1,
        };
        let s = analyze(&dataset("skipped", &plays), &opts).unwrap();
        assert_eq!(s.most_skipped.as_ref().unwrap().len(), 1);
        assert_eq!(s.most_skipped.as_ref().unwrap()[0].artist, "A");
        assert_eq!(s.least_skipped.as_ref().unwrap()[0].artist, "B");
        assert_eq!(
            s.insights(),
            vec![
                "⏭️ You skip 50.0% of the tracks you start".to_string(),
                "🚫 A gets skipped the most (100.0% of 3 plays)".to_string(),
            ]
        );
    }
}
