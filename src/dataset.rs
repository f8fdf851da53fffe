use crate::models::{Dataset, DatasetRow};
use chrono::NaiveDate;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("malformed dataset line {line}: {reason}")]
    Malformed { line: u64, reason: String },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Parses the persisted CSV. A header line is optional: when the very first record does not
/// start with a date it is taken to be one and skipped.
pub fn parse_dataset(text: &str) -> Result<Dataset, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map(|pos| pos.line()).unwrap_or(index as u64 + 1);
        if record.iter().all(str::is_empty) {
            continue;
        }

        let date_field = record.get(0).unwrap_or_default();
        let date = match NaiveDate::parse_from_str(date_field, DATE_FORMAT) {
            Ok(date) => date,
            Err(_) if index == 0 => continue,
            Err(err) => {
                return Err(DatasetError::Malformed {
                    line,
                    reason: format!("bad date {date_field:?}: {err}"),
                });
            }
        };

        if record.len() < 3 {
            return Err(DatasetError::Malformed {
                line,
                reason: format!("expected at least 3 columns, found {}", record.len()),
            });
        }

        let mut values = Vec::with_capacity(record.len() - 1);
        for field in record.iter().skip(1) {
            values.push(parse_count(field).ok_or_else(|| DatasetError::Malformed {
                line,
                reason: format!("bad count {field:?}"),
            })?);
        }

        rows.push(DatasetRow {
            date,
            case: values[0],
            new: values[1],
            extra: values.split_off(2),
        });
    }

    Ok(Dataset { rows })
}

/// Counts are non-negative integers.
fn parse_count(field: &str) -> Option<i64> {
    if let Ok(value) = field.parse::<i64>() {
        return (value >= 0).then_some(value);
    }
    // pandas round-trips write integers as "85.0"
    let value = field.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0 && value >= 0.0 && value < i64::MAX as f64)
        .then_some(value as i64)
}

pub fn format_row(date: NaiveDate, values: &[i64]) -> String {
    let mut line = date.format(DATE_FORMAT).to_string();
    for value in values {
        line.push(',');
        line.push_str(&value.to_string());
    }
    line
}

/// Returns `existing` with `line` appended as a new final row.
pub fn append_line(existing: &str, line: &str) -> String {
    let mut out = String::with_capacity(existing.len() + line.len() + 2);
    out.push_str(existing);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(line);
    out.push('\n');
    out
}
