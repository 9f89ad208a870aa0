//! Capability detection: which semantic fields an export provides.
//!
//! Exports come in several shapes (extended streaming history, the older
//! account-data dump, hand-made CSVs), so columns are resolved once here and
//! every analyzer reads the typed [`Schema`] instead of matching header names.

use super::{Cell, RawTable};

/// Substrings that mark a header as the timestamp source (case-insensitive).
const TIMESTAMP_HINTS: &[&str] = &["time", "date", "ts"];

/// Extended streaming history names → canonical names.
const TRACK_ALIASES: &[&str] = &["master_metadata_track_name", "trackName"];
const ARTIST_ALIASES: &[&str] = &["master_metadata_album_artist_name", "artistName"];
const ALBUM_ALIASES: &[&str] = &["master_metadata_album_album_name", "albumName"];

/// Skip indicator columns in priority order.
const SKIP_COLUMNS: &[&str] = &["skipped", "skip", "reason_end", "reason_start"];

/// Text values that count as a skip in a categorical skip column.
pub const SKIP_TOKENS: &[&str] = &["SKIP", "skip", "skipped"];

/// A resolved source column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub index: usize,
    pub name: String,
}

/// How a skip column's cells are turned into skip / no-skip.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipIndicator {
    /// Every cell is a native boolean: skip = true.
    Boolean,
    /// Mixed or textual cells: skip = membership in the token set, or a true-ish
    /// value (`true`, `1`).
    Categorical(&'static [&'static str]),
}

impl SkipIndicator {
    pub fn is_skip(&self, cell: &Cell) -> bool {
        match self {
            SkipIndicator::Boolean => matches!(cell, Cell::Bool(true)),
            SkipIndicator::Categorical(tokens) => match cell {
                Cell::Bool(b) => *b,
                Cell::Int(i) => *i == 1,
                Cell::Float(f) => *f == 1.0,
                Cell::Text(s) => tokens.contains(&s.as_str()),
                Cell::Null => false,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkipIndicator::Boolean => "boolean",
            SkipIndicator::Categorical(_) => "categorical",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkipColumn {
    pub column: ColumnRef,
    pub indicator: SkipIndicator,
}

/// The set of semantic fields available in a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub timestamp: Option<ColumnRef>,
    pub track: Option<ColumnRef>,
    pub artist: Option<ColumnRef>,
    pub album: Option<ColumnRef>,
    pub skip: Option<SkipColumn>,
}

impl Schema {
    pub fn resolve(table: &RawTable) -> Self {
        let skip = find_first(table, SKIP_COLUMNS).map(|column| {
            let indicator = if table.column(column.index).all(|c| matches!(c, Cell::Bool(_))) {
                SkipIndicator::Boolean
            } else {
                SkipIndicator::Categorical(SKIP_TOKENS)
            };
            SkipColumn { column, indicator }
        });

        Self {
            timestamp: find_timestamp(&table.columns),
            track: find_first(table, TRACK_ALIASES),
            artist: find_first(table, ARTIST_ALIASES),
            album: find_first(table, ALBUM_ALIASES),
            skip,
        }
    }
}

/// First header (in column order) containing one of the timestamp hints.
fn find_timestamp(columns: &[String]) -> Option<ColumnRef> {
    columns
        .iter()
        .enumerate()
        .find(|(_, name)| {
            let lower = name.to_lowercase();
            TIMESTAMP_HINTS.iter().any(|hint| lower.contains(hint))
        })
        .map(|(index, name)| ColumnRef {
            index,
            name: name.clone(),
        })
}

/// First name from `candidates` (in candidate order) that exists in the table.
fn find_first(table: &RawTable, candidates: &[&str]) -> Option<ColumnRef> {
    candidates.iter().find_map(|name| {
        table.column_index(name).map(|index| ColumnRef {
            index,
            name: name.to_string(),
        })
    })
}
