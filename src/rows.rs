//! Headered, comma-delimited table files read into plain field rows.
//!
//! No quoting or escaping: a field containing a comma shifts every column
//! after it. Callers map rows onto named records and skip the short ones.

use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, Trim, WriterBuilder};
use tempfile::NamedTempFile;

use crate::error::{StoreError, StoreResult};

pub type Row = Vec<String>;

/// Read every data row after the header. An unreadable file is logged and
/// yields no rows.
pub fn read_rows(path: &Path) -> Vec<Row> {
    match try_read_rows(path) {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(error = %err, "failed to read table file");
            Vec::new()
        }
    }
}

pub fn try_read_rows(path: &Path) -> StoreResult<Vec<Row>> {
    Ok(try_read_table(path)?.rows)
}

/// A table file with its header kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub header: Row,
    pub rows: Vec<Row>,
}

pub fn try_read_table(path: &Path) -> StoreResult<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| StoreError::csv(path, e))?;

    let header = reader
        .headers()
        .map_err(|e| StoreError::csv(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(StoreError::csv(path, err)),
            Err(err) => {
                tracing::debug!(
                    path = %path.display(),
                    line = index + 2,
                    error = %err,
                    "skipping undecodable row"
                );
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Table { header, rows })
}

/// Replace the file with `table`. The rows go to a sibling temp file that is
/// renamed over `path`, so a failed write leaves the old file in place.
pub fn write_table(path: &Path, table: &Table) -> StoreResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut writer = WriterBuilder::new()
        .flexible(true)
        .quote_style(QuoteStyle::Never)
        .from_writer(temp);
    if !table.header.is_empty() {
        writer
            .write_record(&table.header)
            .map_err(|e| StoreError::csv(path, e))?;
    }
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| StoreError::csv(path, e))?;
    }

    let temp = writer
        .into_inner()
        .map_err(|e| StoreError::io(path, e.into_error()))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(path, e))?;
    temp.persist(path).map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}

/// Numeric score from a text field; anything unparseable counts as 0.
pub fn parse_score(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// The row if it has at least `width` fields.
pub fn require_width(row: &[String], width: usize) -> Option<&[String]> {
    (row.len() >= width).then_some(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_header_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.csv");
        std::fs::write(&path, "ID,Name\nS001, Avery \n\n   \nS002,Jules\n").unwrap();

        let rows = read_rows(&path);
        assert_eq!(
            rows,
            vec![
                vec!["S001".to_string(), "Avery".to_string()],
                vec!["S002".to_string(), "Jules".to_string()],
            ]
        );
    }

    #[test]
    fn missing_file_yields_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_rows(&dir.path().join("absent.csv")).is_empty());
        assert!(try_read_rows(&dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn quotes_are_not_special() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.csv");
        std::fs::write(&path, "ID,Name,Credits\nC1,\"Intro, Part 1\",3\n").unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[0][1], "\"Intro");
    }

    #[test]
    fn rows_of_different_width_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        std::fs::write(&path, "A,B,C\n1,2,3\n4\n").unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert!(require_width(&rows[0], 3).is_some());
        assert!(require_width(&rows[1], 3).is_none());
    }

    #[test]
    fn write_then_read_preserves_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "old contents\n").unwrap();
        let table = Table {
            header: vec!["StudentID".to_string(), "Flag".to_string()],
            rows: vec![
                vec!["S001".to_string(), "Eligible".to_string()],
                vec!["S002".to_string()],
            ],
        };
        write_table(&path, &table).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "StudentID,Flag\nS001,Eligible\nS002\n");
        assert_eq!(try_read_table(&path).unwrap(), table);
    }

    #[test]
    fn failed_rewrite_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("students.csv");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();
        let table = Table {
            header: vec!["ID".to_string()],
            rows: vec![vec!["S002".to_string()]],
        };

        // renaming a file over a directory fails after the rows are written
        assert!(write_table(&target, &table).is_err());
        assert_eq!(std::fs::read_to_string(target.join("keep")).unwrap(), "x");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn scores_default_to_zero() {
        assert_eq!(parse_score(" 72 "), 72.0);
        assert_eq!(parse_score("64.5"), 64.5);
        assert_eq!(parse_score("absent"), 0.0);
        assert_eq!(parse_score(""), 0.0);
        assert_eq!(parse_score("NaN"), 0.0);
    }
}
