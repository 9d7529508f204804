use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::models::{Aggregate, Field, FlatRecord, Metric, PeriodShares, Scalar};
use crate::services::pivot::PeriodTable;

pub const AGGREGATE_HEADERS: &[&str] = &["key", "label", "value"];
pub const SHARE_HEADERS: &[&str] = &["period", "key", "label", "value", "share"];

#[derive(Debug, Clone, PartialEq)]
pub enum CsvValue {
    Text(String),
    Number(f64),
}

impl fmt::Display for CsvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for CsvValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CsvValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CsvValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

pub type CsvRow = HashMap<String, CsvValue>;

/// Render rows as CSV with every field wrapped in double quotes.
///
/// Columns follow `headers`; a row missing a header renders an empty field.
/// Embedded quote characters are written as-is, not doubled.
pub fn serialize(rows: &[CsvRow], headers: &[&str]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(quote_line(headers.iter().map(|h| h.to_string())));

    for row in rows {
        lines.push(quote_line(headers.iter().map(|h| {
            row.get(*h).map(|v| v.to_string()).unwrap_or_default()
        })));
    }

    debug!(rows = rows.len(), columns = headers.len(), "Serialized CSV");
    lines.join("\n")
}

fn quote_line(fields: impl Iterator<Item = String>) -> String {
    fields
        .map(|f| format!("\"{}\"", f))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn aggregate_rows(aggregates: &[Aggregate]) -> Vec<CsvRow> {
    aggregates
        .iter()
        .map(|a| {
            CsvRow::from([
                ("key".to_string(), CsvValue::from(a.key.as_str())),
                ("label".to_string(), CsvValue::from(a.label.as_str())),
                ("value".to_string(), CsvValue::from(a.value)),
            ])
        })
        .collect()
}

pub fn share_rows(periods: &[PeriodShares]) -> Vec<CsvRow> {
    periods
        .iter()
        .flat_map(|p| {
            p.shares.iter().map(move |s| {
                CsvRow::from([
                    ("period".to_string(), CsvValue::from(p.period.as_str())),
                    ("key".to_string(), CsvValue::from(s.key.as_str())),
                    ("label".to_string(), CsvValue::from(s.label.as_str())),
                    ("value".to_string(), CsvValue::from(s.value)),
                    ("share".to_string(), CsvValue::from(s.share)),
                ])
            })
        })
        .collect()
}

/// Rows and headers (`period` followed by the column codes) of a pivot table.
pub fn table_rows(table: &PeriodTable) -> (Vec<CsvRow>, Vec<String>) {
    let mut headers = vec![Field::Period.as_str().to_string()];
    headers.extend(table.columns.iter().cloned());

    let rows = table
        .rows
        .iter()
        .map(|r| {
            let mut row = CsvRow::new();
            row.insert("period".to_string(), CsvValue::from(r.period.as_str()));
            for (code, cell) in &r.cells {
                if let Some(value) = cell {
                    row.insert(code.clone(), CsvValue::from(*value));
                }
            }
            row
        })
        .collect();

    (rows, headers)
}

/// Column names of a raw record export.
pub fn record_headers() -> Vec<&'static str> {
    Field::all()
        .iter()
        .map(Field::as_str)
        .chain(
            [Metric::Count, Metric::Rate, Metric::AvgWeightGrams]
                .iter()
                .map(Metric::as_str),
        )
        .collect()
}

pub fn record_rows(records: &[FlatRecord]) -> Vec<CsvRow> {
    let headers = record_headers();
    records
        .iter()
        .map(|record| {
            headers
                .iter()
                .filter_map(|h| {
                    let value = match record.get(h)? {
                        Scalar::Text(s) => CsvValue::from(s.as_str()),
                        Scalar::Number(n) => CsvValue::from(*n),
                        Scalar::Null => return None,
                    };
                    Some((h.to_string(), value))
                })
                .collect()
        })
        .collect()
}
