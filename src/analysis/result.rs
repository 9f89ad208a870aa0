use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use super::skip::ArtistSkipStat;

/// A single named metric value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Metric {
    Int(i64),
    Float(f64),
    Text(String),
    /// Label → count table (hours, weekdays, months, dates).
    Counts(Vec<(String, u64)>),
    ArtistSkips(Vec<ArtistSkipStat>),
}

impl Metric {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Metric::Int(i) => Some(*i as f64),
            Metric::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Metric::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Metric {
    fn from(v: i64) -> Self {
        Metric::Int(v)
    }
}

impl From<u32> for Metric {
    fn from(v: u32) -> Self {
        Metric::Int(i64::from(v))
    }
}

impl From<u64> for Metric {
    fn from(v: u64) -> Self {
        Metric::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<usize> for Metric {
    fn from(v: usize) -> Self {
        Metric::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Metric {
    fn from(v: f64) -> Self {
        Metric::Float(v)
    }
}

impl From<&str> for Metric {
    fn from(v: &str) -> Self {
        Metric::Text(v.to_string())
    }
}

impl From<String> for Metric {
    fn from(v: String) -> Self {
        Metric::Text(v)
    }
}

/// Named metrics produced by one analyzer, in insertion order.
///
/// Empty when the analyzer's required fields are absent; never holds
/// placeholder values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    entries: Vec<(&'static str, Metric)>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a metric, replacing any previous value under the same key.
    pub fn insert(&mut self, key: &'static str, value: impl Into<Metric>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: &'static str, value: impl Into<Metric>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Metric> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Metric)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut r = AnalysisResult::new()
            .with("peak_hour", 8u32)
            .with("peak_day", "Friday");
        r.insert("peak_hour", 9u32);

        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["peak_hour", "peak_day"]);
        assert_eq!(r.get("peak_hour"), Some(&Metric::Int(9)));
        assert_eq!(r.get("peak_day").and_then(Metric::as_text), Some("Friday"));
        assert!(!r.contains_key("top_artist"));
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let r = AnalysisResult::new()
            .with("z", 1.5)
            .with("a", Metric::Counts(vec![("Monday".into(), 3)]));
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"z":1.5,"a":[["Monday",3]]}"#);
    }
}
