pub mod features;
pub mod schema;

use chrono::NaiveDateTime;
use thiserror::Error;

use features::DerivedFeatures;
use schema::Schema;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Dataset has no rows")]
    Empty,
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// A single cell of the raw input table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// String form of a non-null cell. Numbers and booleans are rendered as-is
    /// so that e.g. a numeric track name still counts as a value.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

/// Untyped tabular input: header names plus rows of cells, in file order.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Index of a column by exact (case-sensitive) name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of a column, appending it (null-filled) if it doesn't exist yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Cell::Null);
        }
        self.columns.len() - 1
    }

    /// Append another table, unioning the columns. Cells the other table doesn't
    /// have are null.
    pub fn append(&mut self, other: RawTable) {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| self.ensure_column(name))
            .collect();
        let width = self.columns.len();
        for row in other.rows {
            let mut merged = vec![Cell::Null; width];
            for (src, cell) in row.into_iter().enumerate() {
                if let Some(&dst) = mapping.get(src) {
                    merged[dst] = cell;
                }
            }
            self.rows.push(merged);
        }
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> {
        self.rows
            .iter()
            .map(move |row| row.get(idx).unwrap_or(&Cell::Null))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One play record after normalization.
#[derive(Debug, Clone, Default)]
pub struct Event {
    pub timestamp: Option<NaiveDateTime>,
    pub features: Option<DerivedFeatures>,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    /// `None` when the input has no skip column at all.
    pub skipped: Option<bool>,
}

/// The normalized, read-only input shared by every analyzer.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub schema: Schema,
    pub events: Vec<Event>,
    /// Rows whose timestamp cell was present but couldn't be parsed.
    pub malformed_timestamps: usize,
}

impl Dataset {
    /// Resolve the schema, derive calendar features and build typed events.
    pub fn from_table(table: &RawTable) -> Result<Self, DatasetError> {
        if table.is_empty() {
            return Err(DatasetError::Empty);
        }
        for (i, row) in table.rows.iter().enumerate() {
            if row.len() != table.columns.len() {
                return Err(DatasetError::RaggedRow {
                    row: i,
                    found: row.len(),
                    expected: table.columns.len(),
                });
            }
        }

        let schema = Schema::resolve(table);
        if schema.timestamp.is_none() {
            log::warn!("No timestamp column found - temporal analysis will be limited");
        }

        let mut malformed = 0usize;
        let mut first_bad: Option<String> = None;

        let events: Vec<Event> = table
            .rows
            .iter()
            .map(|row| {
                let timestamp = schema.timestamp.as_ref().and_then(|col| {
                    let cell = &row[col.index];
                    let parsed = features::parse_timestamp(cell);
                    if parsed.is_none() && !cell.is_null() {
                        malformed += 1;
                        if first_bad.is_none() {
                            first_bad = cell.to_text();
                        }
                    }
                    parsed
                });
                let text_at = |col: &Option<schema::ColumnRef>| {
                    col.as_ref().and_then(|c| row[c.index].to_text())
                };
                Event {
                    timestamp,
                    features: timestamp.map(DerivedFeatures::from_timestamp),
                    track_name: text_at(&schema.track),
                    artist_name: text_at(&schema.artist),
                    album_name: text_at(&schema.album),
                    skipped: schema
                        .skip
                        .as_ref()
                        .map(|s| s.indicator.is_skip(&row[s.column.index])),
                }
            })
            .collect();

        if malformed > 0 {
            log::warn!(
                "{} rows have unparseable timestamps (first: {:?}), skipping their time features",
                malformed,
                first_bad.unwrap_or_default()
            );
        }

        let dataset = Self {
            schema,
            events,
            malformed_timestamps: malformed,
        };

        if let Some((min, max)) = dataset.time_range() {
            log::info!("Date range: {} to {}", min, max);
        }

        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Earliest and latest parsed timestamps.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut stamps = self.events.iter().filter_map(|e| e.timestamp);
        let first = stamps.next()?;
        Some(stamps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }

    /// Whole days between the earliest and latest timestamp.
    pub fn days_span(&self) -> Option<i64> {
        self.time_range().map(|(lo, hi)| (hi - lo).num_days())
    }

    pub fn has_artists(&self) -> bool {
        self.events.iter().any(|e| e.artist_name.is_some())
    }

    pub fn has_tracks(&self) -> bool {
        self.events.iter().any(|e| e.track_name.is_some())
    }

    pub fn has_features(&self) -> bool {
        self.events.iter().any(|e| e.features.is_some())
    }
}

/// Build a table from string literals: `""` becomes null, everything else is
/// typed the same way the CSV loader types cells.
#[cfg(test)]
pub(crate) fn table(columns: &[&str], rows: &[&[&str]]) -> RawTable {
    let mut t = RawTable::new(columns.iter().map(|c| c.to_string()).collect());
    for row in rows {
        t.rows
            .push(row.iter().map(|v| crate::loader::infer_cell(v)).collect());
    }
    t
}
