use std::collections::HashMap;

use super::Metrics;
use super::result::AnalysisResult;
use crate::dataset::Dataset;

/// Share of the artist list that counts as "top" for the concentration ratio.
const TOP_ARTIST_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorationType {
    ComfortZone,
    Balanced,
    Explorer,
}

impl ExplorationType {
    /// Concentration above 80% is comfort zone, above 60% balanced.
    pub fn from_concentration(ratio: f64) -> Self {
        if ratio > 80.0 {
            Self::ComfortZone
        } else if ratio > 60.0 {
            Self::Balanced
        } else {
            Self::Explorer
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ComfortZone => "Comfort Zone listener",
            Self::Balanced => "Balanced listener",
            Self::Explorer => "Explorer",
        }
    }

    pub fn tagline(&self) -> &'static str {
        match self {
            Self::ComfortZone => "you love your favorites!",
            Self::Balanced => "mix of favorites and exploration!",
            Self::Explorer => "always discovering new music!",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::ComfortZone => "🏠",
            Self::Balanced => "⚖️",
            Self::Explorer => "🗺️",
        }
    }

    /// "Explorer - always discovering new music!"
    pub fn description(&self) -> String {
        format!("{} - {}", self.label(), self.tagline())
    }
}

/// Who gets played, and how concentrated that is.
#[derive(Debug, Clone)]
pub struct ArtistPreferences {
    pub top_artist: String,
    pub top_artist_plays: u64,
    pub top_artist_percentage: f64,
    pub concentration_ratio: f64,
    pub diversity_score: f64,
    pub total_artists: usize,
    pub exploration: ExplorationType,
    /// Artist play counts, most played first.
    pub artist_counts: Vec<(String, u64)>,
}

/// Count plays per artist. `None` when no event carries an artist name.
///
/// Percentages use every event as the denominator, including events with no
/// artist, so they measure share of all listening.
pub fn analyze(ds: &Dataset) -> Option<ArtistPreferences> {
    if !ds.has_artists() {
        log::debug!("Preference analysis skipped: no artist data");
        return None;
    }

    let artist_counts = count_artists(ds);
    let total_plays = ds.len() as f64;
    let (top_artist, top_artist_plays) = artist_counts.first().cloned()?;

    let top_artist_percentage = top_artist_plays as f64 / total_plays * 100.0;
    let concentration_ratio = concentration_ratio(&artist_counts, total_plays);

    Some(ArtistPreferences {
        top_artist,
        top_artist_plays,
        top_artist_percentage,
        concentration_ratio,
        diversity_score: 100.0 - concentration_ratio,
        total_artists: artist_counts.len(),
        exploration: ExplorationType::from_concentration(concentration_ratio),
        artist_counts,
    })
}

/// Plays per artist sorted by count descending; ties keep first-appearance
/// order in the dataset.
fn count_artists(ds: &Dataset) -> Vec<(String, u64)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, u64)> = Vec::new();
    for artist in ds.events.iter().filter_map(|e| e.artist_name.as_deref()) {
        match index.get(artist) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(artist, counts.len());
                counts.push((artist.to_string(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Percentage of all plays going to the top 10% of artists (at least one).
/// `counts` must be sorted descending.
fn concentration_ratio(counts: &[(String, u64)], total_plays: f64) -> f64 {
    if counts.is_empty() || total_plays <= 0.0 {
        return 0.0;
    }
    let k = ((counts.len() as f64 * TOP_ARTIST_FRACTION) as usize).max(1);
    let top_plays: u64 = counts.iter().take(k).map(|(_, c)| c).sum();
    top_plays as f64 / total_plays * 100.0
}

impl Metrics for ArtistPreferences {
    fn metrics(&self) -> AnalysisResult {
        AnalysisResult::new()
            .with("top_artist", self.top_artist.as_str())
            .with("top_artist_plays", self.top_artist_plays)
            .with("top_artist_percentage", self.top_artist_percentage)
            .with("concentration_ratio", self.concentration_ratio)
            .with("diversity_score", self.diversity_score)
            .with("total_artists", self.total_artists)
            .with("exploration_type", self.exploration.description())
    }

    fn insights(&self) -> Vec<String> {
        vec![
            format!(
                "⭐ {} dominates your playlist ({:.1}% of all listening)",
                self.top_artist, self.top_artist_percentage
            ),
            format!(
                "📊 You're an '{}' - {}",
                self.exploration.label(),
                self.exploration.tagline()
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, table};

    fn dataset(artists: &[&str]) -> Dataset {
        let rows: Vec<Vec<&str>> = artists.iter().map(|a| vec![*a]).collect();
        let rows: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
        Dataset::from_table(&table(&["artistName"], &rows)).unwrap()
    }

    /// `n` artists, the first gets `top` plays, the rest one each.
    fn skewed(n: usize, top: usize) -> Vec<String> {
        let mut plays = vec!["Artist 0".to_string(); top];
        plays.extend((1..n).map(|i| format!("Artist {i}")));
        plays
    }

    #[test]
    fn test_single_artist_is_full_share() {
        let p = analyze(&dataset(&["A", "A", "A"])).unwrap();
        assert_eq!(p.top_artist, "A");
        assert!((p.top_artist_percentage - 100.0).abs() < 1e-9);
        assert!((p.concentration_ratio - 100.0).abs() < 1e-9);
        assert!(p.diversity_score.abs() < 1e-9);
        assert_eq!(p.exploration, ExplorationType::ComfortZone);
        assert_eq!(p.total_artists, 1);
    }

    #[test]
    fn test_top_artist_share_below_full_with_other_artists() {
        let p = analyze(&dataset(&["A", "A", "A", "B"])).unwrap();
        assert!((p.top_artist_percentage - 75.0).abs() < 1e-9);
        assert!(p.top_artist_percentage < 100.0);
    }

    #[test]
    fn test_concentration_uses_top_decile() {
        // 20 artists → k = 2. Plays: A=5, B=3, others 1 each (18) → total 26
        let mut plays: Vec<String> = vec!["A".into(); 5];
        plays.extend(vec!["B".to_string(); 3]);
        plays.extend((0..18).map(|i| format!("X{i}")));
        let refs: Vec<&str> = plays.iter().map(String::as_str).collect();
        let p = analyze(&dataset(&refs)).unwrap();

        assert_eq!(p.total_artists, 20);
        let expected = 8.0 / 26.0 * 100.0;
        assert!((p.concentration_ratio - expected).abs() < 1e-9);
        assert!((p.diversity_score - (100.0 - expected)).abs() < 1e-9);
        assert_eq!(p.exploration, ExplorationType::Explorer);
    }

    #[test]
    fn test_concentration_monotone_in_top_plays() {
        let mut last = 0.0;
        for top in 1..40 {
            let plays = skewed(10, top);
            let refs: Vec<&str> = plays.iter().map(String::as_str).collect();
            let ratio = analyze(&dataset(&refs)).unwrap().concentration_ratio;
            assert!(ratio >= last, "ratio dropped at top={top}: {ratio} < {last}");
            last = ratio;
        }
    }

    #[test]
    fn test_exploration_thresholds_are_strict() {
        assert_eq!(ExplorationType::from_concentration(80.0), ExplorationType::Balanced);
        assert_eq!(ExplorationType::from_concentration(80.01), ExplorationType::ComfortZone);
        assert_eq!(ExplorationType::from_concentration(60.0), ExplorationType::Explorer);
        assert_eq!(ExplorationType::from_concentration(60.01), ExplorationType::Balanced);
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let p = analyze(&dataset(&["B", "A", "A", "B", "C"])).unwrap();
        assert_eq!(p.top_artist, "B");
        assert_eq!(
            p.artist_counts,
            vec![("B".to_string(), 2), ("A".to_string(), 2), ("C".to_string(), 1)]
        );
    }

    #[test]
    fn test_missing_artists_count_toward_total() {
        let p = analyze(&dataset(&["A", "", "", ""])).unwrap();
        assert!((p.top_artist_percentage - 25.0).abs() < 1e-9);
        assert_eq!(p.total_artists, 1);
    }

    #[test]
    fn test_empty_artist_column_is_empty_result() {
        assert!(analyze(&dataset(&["", ""])).is_none());
    }

    #[test]
    fn test_insights() {
        let p = analyze(&dataset(&["A", "A", "A", "B"])).unwrap();
        assert_eq!(
            p.insights(),
            vec![
                "⭐ A dominates your playlist (75.0% of all listening)".to_string(),
                "📊 You're an 'Balanced listener' - mix of favorites and exploration!".to_string(),
            ]
        );
        assert_eq!(
            p.metrics().get("exploration_type").and_then(|m| m.as_text()),
            Some("Balanced listener - mix of favorites and exploration!")
        );
    }
}
