//! Reading listening-history exports into a [`RawTable`].
//!
//! Accepts CSV files and JSON arrays of flat objects, or directories of them.

use crate::SUPPORTED_FORMATS;
use crate::dataset::{Cell, RawTable};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {0}")]
    MissingInput(PathBuf),
    #[error("Unsupported file type: {0} (expected .csv or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("No .csv or .json files under {0}")]
    NoInputFiles(PathBuf),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Expected a JSON array of objects in {0}")]
    JsonShape(PathBuf),
    #[error("No listening records in input")]
    Empty,
}

pub type Result<T> = std::result::Result<T, LoadError>;

/// Load every input path (files or directories) into one table, in order.
pub fn load_paths(paths: &[PathBuf]) -> Result<RawTable> {
    let mut files = Vec::new();
    for path in paths {
        files.extend(collect_files(path)?);
    }

    let pb = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut table = RawTable::default();
    for file in &files {
        if let Some(pb) = &pb {
            pb.set_message(
                file.file_name()
                    .map(|f| f.to_string_lossy().to_string())
                    .unwrap_or_default(),
            );
        }
        let part = load_file(file)?;
        log::info!("Loaded {} records from {}", part.len(), file.display());
        table.append(part);
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_with_message(format!("{} records", table.len()));
    }

    if table.is_empty() {
        return Err(LoadError::Empty);
    }
    log::info!(
        "Loaded {} listening records, columns: {:?}",
        table.len(),
        table.columns
    );
    Ok(table)
}

/// Resolve one input path to the list of files it names.
fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(LoadError::MissingInput(path.to_path_buf()));
    }
    if path.is_file() {
        if extension_of(path).is_none() {
            return Err(LoadError::UnsupportedFormat(path.to_path_buf()));
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| extension_of(p).is_some())
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(LoadError::NoInputFiles(path.to_path_buf()));
    }
    Ok(files)
}

/// Lowercased extension, if it's one we can read.
fn extension_of(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    SUPPORTED_FORMATS.contains(&ext.as_str()).then_some(ext)
}

pub fn load_file(path: &Path) -> Result<RawTable> {
    match extension_of(path).as_deref() {
        Some("csv") => load_csv(path),
        Some("json") => load_json(path),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn load_csv(path: &Path) -> Result<RawTable> {
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let width = columns.len();
    let mut table = RawTable::new(columns);

    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let mut row: Vec<Cell> = record.iter().take(width).map(infer_cell).collect();
        row.resize(width, Cell::Null);
        table.rows.push(row);
    }
    Ok(table)
}

fn load_json(path: &Path) -> Result<RawTable> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&contents).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    table_from_json(value).ok_or_else(|| LoadError::JsonShape(path.to_path_buf()))
}

/// Build a table from a JSON array of objects. Columns appear in first-seen key
/// order. Returns `None` if the value isn't an array of objects.
fn table_from_json(value: Value) -> Option<RawTable> {
    let Value::Array(records) = value else {
        return None;
    };

    let mut table = RawTable::default();
    for record in records {
        let Value::Object(fields) = record else {
            return None;
        };
        let mut row = vec![Cell::Null; table.columns.len()];
        for (key, value) in fields {
            let idx = match table.column_index(&key) {
                Some(idx) => idx,
                None => {
                    let idx = table.ensure_column(&key);
                    row.push(Cell::Null);
                    idx
                }
            };
            row[idx] = json_cell(value);
        }
        table.rows.push(row);
    }
    Some(table)
}

fn json_cell(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
        },
        Value::String(s) if s.is_empty() => Cell::Null,
        Value::String(s) => Cell::Text(s),
        other => Cell::Text(other.to_string()),
    }
}

/// Type a CSV field: empty → null, then boolean, integer, float, text.
pub fn infer_cell(raw: &str) -> Cell {
    let s = raw.trim();
    match s {
        "" => Cell::Null,
        "true" | "True" | "TRUE" => Cell::Bool(true),
        "false" | "False" | "FALSE" => Cell::Bool(false),
        _ => {
            if let Ok(i) = s.parse::<i64>() {
                Cell::Int(i)
            } else if let Ok(f) = s.parse::<f64>() {
                Cell::Float(f)
            } else {
                Cell::Text(s.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_infer_cell() {
        assert_eq!(infer_cell(""), Cell::Null);
        assert_eq!(infer_cell("  "), Cell::Null);
        assert_eq!(infer_cell("True"), Cell::Bool(true));
        assert_eq!(infer_cell("false"), Cell::Bool(false));
        assert_eq!(infer_cell("42"), Cell::Int(42));
        assert_eq!(infer_cell("1.5"), Cell::Float(1.5));
        assert_eq!(infer_cell("fwdbtn"), Cell::Text("fwdbtn".into()));
        assert_eq!(infer_cell("2024-01-01 10:00"), Cell::Text("2024-01-01 10:00".into()));
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "history.csv",
            "endTime,artistName,trackName,msPlayed\n\
             2020-03-01 08:15,Band,Song,200000\n\
             2020-03-01 09:00,,Other,1000\n",
        );
        let table = load_paths(&[path]).unwrap();
        assert_eq!(table.columns, vec!["endTime", "artistName", "trackName", "msPlayed"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][3], Cell::Int(200000));
        assert_eq!(table.rows[1][1], Cell::Null);
    }

    #[test]
    fn test_load_json_preserves_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "Streaming_History_Audio_2023.json",
            r#"[
                {"ts": "2023-07-14T21:05:33Z", "ms_played": 1000,
                 "master_metadata_track_name": "Song", "skipped": null,
                 "offline_timestamp": 1689368733},
                {"ts": "2023-07-14T21:09:01Z", "ms_played": 5,
                 "master_metadata_track_name": "Song", "skipped": true,
                 "offline_timestamp": 1689368941, "incognito_mode": false}
            ]"#,
        );
        let table = load_paths(&[path]).unwrap();
        assert_eq!(
            table.columns,
            vec![
                "ts",
                "ms_played",
                "master_metadata_track_name",
                "skipped",
                "offline_timestamp",
                "incognito_mode"
            ]
        );
        assert_eq!(table.rows[0][3], Cell::Null);
        assert_eq!(table.rows[0][5], Cell::Null);
        assert_eq!(table.rows[1][3], Cell::Bool(true));
        assert_eq!(table.rows[1][5], Cell::Bool(false));
    }

    #[test]
    fn test_directory_concatenates_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b.csv", "ts,artistName\n2024-01-02,B\n");
        write_file(dir.path(), "a.json", r#"[{"ts": "2024-01-01", "artistName": "A"}]"#);
        write_file(dir.path(), "notes.txt", "ignored");

        let table = load_paths(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][1], Cell::Text("A".into()));
        assert_eq!(table.rows[1][1], Cell::Text("B".into()));
    }

    #[test]
    fn test_missing_input() {
        let err = load_paths(&[PathBuf::from("/definitely/not/here.csv")]).unwrap_err();
        assert!(matches!(err, LoadError::MissingInput(_)));
    }

    #[test]
    fn test_unsupported_and_empty_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let txt = write_file(dir.path(), "notes.txt", "hello");
        assert!(matches!(
            load_paths(&[txt]).unwrap_err(),
            LoadError::UnsupportedFormat(_)
        ));

        let empty_dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_paths(&[empty_dir.path().to_path_buf()]).unwrap_err(),
            LoadError::NoInputFiles(_)
        ));

        let header_only = write_file(dir.path(), "empty.csv", "ts,artistName\n");
        assert!(matches!(load_paths(&[header_only]).unwrap_err(), LoadError::Empty));
    }

    #[test]
    fn test_json_must_be_array_of_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "odd.json", r#"{"ts": "2024-01-01"}"#);
        assert!(matches!(load_paths(&[path]).unwrap_err(), LoadError::JsonShape(_)));
    }
}
