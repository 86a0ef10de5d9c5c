//! Replay input loaders (deterministic).
//!
//! # Market CSV format
//! A header row followed by numeric rows. Required column: `close`. Optional
//! column: `time` (i64; defaults to the 0-based row index). Every other
//! column is parsed as `f64` and handed to the oracle as a named feature —
//! the loader makes no assumption about which indicators are present.
//!
//! # Verdict log format
//! JSON Lines, one serialized [`Verdict`] per line. Used to drive a
//! [`ScriptedOracle`](fxd_oracle::ScriptedOracle) so replay runs are
//! reproducible without a model.

use std::fs;
use std::path::Path;

use fxd_oracle::{MarketFeatures, Verdict};

/// One historical row: the step time, the close price the engine acts on,
/// and the full feature set for the oracle.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayRow {
    pub time: i64,
    pub close: f64,
    pub features: MarketFeatures,
}

/// Loader errors are small, explicit, and test-friendly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    EmptyInput,
    MissingHeader(&'static str),
    ParseNumber { line: usize, column: String, value: String },
    BadRow { line: usize, reason: String },
    BadVerdict { line: usize, reason: String },
    Io(String),
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e.to_string())
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::EmptyInput => write!(f, "empty input"),
            LoadError::MissingHeader(h) => write!(f, "missing header: {h}"),
            LoadError::ParseNumber { line, column, value } => {
                write!(f, "failed to parse number at line {line}, column {column}: {value}")
            }
            LoadError::BadRow { line, reason } => write!(f, "bad row at line {line}: {reason}"),
            LoadError::BadVerdict { line, reason } => {
                write!(f, "bad verdict at line {line}: {reason}")
            }
            LoadError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Load replay rows from a CSV file on disk.
pub fn load_csv_file(path: impl AsRef<Path>) -> Result<Vec<ReplayRow>, LoadError> {
    let s = fs::read_to_string(path)?;
    parse_csv_rows(&s)
}

/// Parse replay rows from CSV content (pure, deterministic).
///
/// Rows are kept in file order: the replay scan is positional and a
/// `start_index` refers to this ordering.
pub fn parse_csv_rows(csv: &str) -> Result<Vec<ReplayRow>, LoadError> {
    let mut lines = csv.lines();

    let header_line = lines.next().ok_or(LoadError::EmptyInput)?;
    let header_line = header_line.trim().trim_start_matches('\u{feff}');
    if header_line.is_empty() {
        return Err(LoadError::EmptyInput);
    }

    let headers: Vec<String> = header_line
        .split(',')
        .map(|s| s.trim().to_string())
        .collect();

    let col_close = headers
        .iter()
        .position(|h| h == "close")
        .ok_or(LoadError::MissingHeader("close"))?;
    let col_time = headers.iter().position(|h| h == "time");

    let mut out: Vec<ReplayRow> = Vec::new();

    for (line_idx0, raw) in lines.enumerate() {
        let line_no = line_idx0 + 2; // 1-based, counting the header as line 1

        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = raw.split(',').map(|s| s.trim()).collect();
        if fields.len() != headers.len() {
            return Err(LoadError::BadRow {
                line: line_no,
                reason: format!(
                    "expected {} columns, got {}",
                    headers.len(),
                    fields.len()
                ),
            });
        }

        let mut features = MarketFeatures::new();
        let mut time: i64 = out.len() as i64;
        let mut close: f64 = 0.0;

        for (i, field) in fields.iter().enumerate() {
            if Some(i) == col_time {
                time = field.parse::<i64>().map_err(|_| LoadError::ParseNumber {
                    line: line_no,
                    column: headers[i].clone(),
                    value: field.to_string(),
                })?;
                continue;
            }

            let value = field.parse::<f64>().map_err(|_| LoadError::ParseNumber {
                line: line_no,
                column: headers[i].clone(),
                value: field.to_string(),
            })?;
            if i == col_close {
                close = value;
            }
            features.set(headers[i].clone(), value);
        }

        out.push(ReplayRow {
            time,
            close,
            features,
        });
    }

    Ok(out)
}

/// Load a verdict log: one JSON verdict per line, in step order.
pub fn load_verdict_log(path: impl AsRef<Path>) -> Result<Vec<Verdict>, LoadError> {
    let content = fs::read_to_string(path)?;
    let mut out = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let verdict: Verdict =
            serde_json::from_str(trimmed).map_err(|e| LoadError::BadVerdict {
                line: i + 1,
                reason: e.to_string(),
            })?;
        out.push(verdict);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_close_time_and_arbitrary_features() {
        let csv = "time,close,rsi,atr\n100,1.1000,55.2,0.0042\n101,1.1010,57.0,0.0041\n";
        let rows = parse_csv_rows(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time, 100);
        assert_eq!(rows[0].close, 1.1000);
        assert_eq!(rows[0].features.get("rsi"), Some(55.2));
        assert_eq!(rows[1].features.get("atr"), Some(0.0041));
    }

    #[test]
    fn time_defaults_to_row_index() {
        let csv = "close\n1.1\n1.2\n1.3\n";
        let rows = parse_csv_rows(csv).unwrap();
        assert_eq!(rows[2].time, 2);
    }

    #[test]
    fn missing_close_header_is_an_error() {
        let csv = "open,high\n1,2\n";
        assert_eq!(parse_csv_rows(csv), Err(LoadError::MissingHeader("close")));
    }

    #[test]
    fn malformed_value_reports_line_and_column() {
        let csv = "close,rsi\n1.1,not_a_number\n";
        match parse_csv_rows(csv) {
            Err(LoadError::ParseNumber { line, column, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, "rsi");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn ragged_row_reports_line() {
        let csv = "close,rsi\n1.1\n";
        assert!(matches!(
            parse_csv_rows(csv),
            Err(LoadError::BadRow { line: 2, .. })
        ));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let csv = "close\n1.1\n\n# weekend gap\n1.2\n";
        let rows = parse_csv_rows(csv).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
