pub mod intensity;
pub mod preference;
pub mod result;
pub mod skip;
pub mod summary;
pub mod temporal;

use serde::{Serialize, Serializer};

use crate::dataset::Dataset;
use intensity::ListeningIntensity;
use preference::ArtistPreferences;
use result::AnalysisResult;
use skip::{SkipBehavior, SkipOptions};
use summary::Summary;
use temporal::TemporalPatterns;

/// Analyzer names, in the order their insights are reported.
pub const ANALYZERS: [&str; 4] = ["temporal", "preferences", "intensity", "skips"];

/// Common view over every analyzer's typed output.
pub trait Metrics {
    /// Named metrics for the generic report / JSON output.
    fn metrics(&self) -> AnalysisResult;
    /// Human-readable sentences, zero to two per analyzer.
    fn insights(&self) -> Vec<String>;
}

impl<T: Metrics> Metrics for Option<T> {
    fn metrics(&self) -> AnalysisResult {
        self.as_ref().map(T::metrics).unwrap_or_default()
    }

    fn insights(&self) -> Vec<String> {
        self.as_ref().map(T::insights).unwrap_or_default()
    }
}

/// Everything one run of the pipeline produces.
#[derive(Debug, Clone)]
pub struct Report {
    pub temporal: Option<TemporalPatterns>,
    pub preferences: Option<ArtistPreferences>,
    pub intensity: Option<ListeningIntensity>,
    pub skips: Option<SkipBehavior>,
    pub insights: Vec<String>,
    pub summary: Summary,
}

/// Run every analyzer over the dataset.
///
/// Analyzers only read the dataset, so they run in parallel; insights are
/// concatenated afterwards in [`ANALYZERS`] order (temporal, preferences,
/// intensity, skips), independent of completion order.
pub fn run(ds: &Dataset, skip_opts: &SkipOptions) -> Report {
    let ((temporal, preferences), ((intensity, skips), summary)) = rayon::join(
        || rayon::join(|| temporal::analyze(ds), || preference::analyze(ds)),
        || {
            rayon::join(
                || rayon::join(|| intensity::analyze(ds), || skip::analyze(ds, skip_opts)),
                || summary::summarize(ds),
            )
        },
    );

    let mut insights = Vec::new();
    insights.extend(temporal.insights());
    insights.extend(preferences.insights());
    insights.extend(intensity.insights());
    insights.extend(skips.insights());

    log::info!(
        "Analysis complete: {} of {} analyzers active, {} insights",
        [
            temporal.is_some(),
            preferences.is_some(),
            intensity.is_some(),
            skips.is_some()
        ]
        .iter()
        .filter(|a| **a)
        .count(),
        ANALYZERS.len(),
        insights.len()
    );

    Report {
        temporal,
        preferences,
        intensity,
        skips,
        insights,
        summary,
    }
}

impl Report {
    /// Analyzer name → metrics, in [`ANALYZERS`] order. Inactive analyzers map
    /// to an empty result.
    pub fn results(&self) -> Vec<(&'static str, AnalysisResult)> {
        vec![
            (ANALYZERS[0], self.temporal.metrics()),
            (ANALYZERS[1], self.preferences.metrics()),
            (ANALYZERS[2], self.intensity.metrics()),
            (ANALYZERS[3], self.skips.metrics()),
        ]
    }

    /// Serializable view: results, insights and summary.
    pub fn to_json(&self) -> ReportJson {
        ReportJson {
            results: self.results(),
            insights: self.insights.clone(),
            summary: self.summary.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportJson {
    #[serde(serialize_with = "named_map")]
    pub results: Vec<(&'static str, AnalysisResult)>,
    pub insights: Vec<String>,
    pub summary: Summary,
}

fn named_map<S: Serializer>(
    entries: &[(&'static str, AnalysisResult)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
}
