use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::trace;

use crate::models::{Field, FlatRecord, Metric};

/// One row of a [`PeriodTable`]: the period plus one cell per column code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRow {
    pub period: String,
    #[serde(flatten)]
    pub cells: BTreeMap<String, Option<f64>>,
}

impl PeriodRow {
    pub fn get(&self, code: &str) -> Option<f64> {
        self.cells.get(code).copied().flatten()
    }

    /// Sum of the present cells in this row.
    pub fn total(&self) -> f64 {
        self.cells.values().flatten().sum()
    }
}

/// Rows ordered by period; every row carries every column key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodTable {
    pub columns: Vec<String>,
    pub rows: Vec<PeriodRow>,
}

impl PeriodTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn periods(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.period.clone()).collect()
    }

    /// Period-aligned values of one column.
    pub fn column(&self, code: &str) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.get(code)).collect()
    }
}

/// Re-express records as one row per distinct period with one column per
/// distinct code.
///
/// Duplicate (period, code) pairs are not summed: the later record wins.
/// Callers that need totals must reduce first.
pub fn pivot(
    records: &[FlatRecord],
    period_field: Field,
    code_field: Field,
    value_metric: Metric,
) -> PeriodTable {
    let mut periods: BTreeSet<String> = BTreeSet::new();
    let mut codes: BTreeSet<String> = BTreeSet::new();
    let mut keyed: Vec<(String, String, &FlatRecord)> = Vec::new();

    for record in records {
        let (Some(period), Some(code)) = (record.text(period_field), record.text(code_field))
        else {
            continue;
        };
        periods.insert(period.clone());
        codes.insert(code.clone());
        keyed.push((period, code, record));
    }

    let empty_cells: BTreeMap<String, Option<f64>> =
        codes.iter().map(|c| (c.clone(), None)).collect();
    let mut rows: BTreeMap<String, PeriodRow> = periods
        .into_iter()
        .map(|period| {
            let row = PeriodRow {
                period: period.clone(),
                cells: empty_cells.clone(),
            };
            (period, row)
        })
        .collect();

    for (period, code, record) in keyed {
        let Some(value) = record.number(value_metric) else {
            continue;
        };
        if let Some(row) = rows.get_mut(&period) {
            row.cells.insert(code, Some(value));
        }
    }

    trace!(
        period_field = %period_field,
        code_field = %code_field,
        rows = rows.len(),
        columns = codes.len(),
        "Pivoted records"
    );

    PeriodTable {
        columns: codes.into_iter().collect(),
        rows: rows.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(period: &str, code: &str, value: f64) -> FlatRecord {
        FlatRecord::new()
            .with("period", period)
            .with("category_code", code)
            .with("count", value)
    }

    #[test]
    fn test_pivot_aligns_columns() {
        let records = vec![
            record("2024-02", "A", 5.0),
            record("2024-01", "A", 10.0),
            record("2024-01", "B", 30.0),
        ];

        let table = pivot(&records, Field::Period, Field::CategoryCode, Metric::Count);

        assert_eq!(table.columns, vec!["A", "B"]);
        assert_eq!(table.periods(), vec!["2024-01", "2024-02"]);
        for row in &table.rows {
            assert!(row.cells.contains_key("A"));
            assert!(row.cells.contains_key("B"));
        }
        assert_eq!(table.column("A"), vec![Some(10.0), Some(5.0)]);
        assert_eq!(table.column("B"), vec![Some(30.0), None]);
    }

    #[test]
    fn test_pivot_last_write_wins() {
        let records = vec![record("2024-01", "A", 10.0), record("2024-01", "A", 20.0)];

        let table = pivot(&records, Field::Period, Field::CategoryCode, Metric::Count);

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("A"), Some(20.0));
    }

    #[test]
    fn test_pivot_area_by_week() {
        let records = vec![
            FlatRecord::new()
                .with("week", "2024-W02")
                .with("area_name", "Nord")
                .with("rate", 0.4),
            FlatRecord::new()
                .with("week", "2024-W01")
                .with("area_name", "Vest")
                .with("rate", 0.2),
        ];

        let table = pivot(&records, Field::Week, Field::AreaName, Metric::Rate);

        assert_eq!(table.columns, vec!["Nord", "Vest"]);
        assert_eq!(table.periods(), vec!["2024-W01", "2024-W02"]);
        assert_eq!(table.column("Nord"), vec![None, Some(0.4)]);
    }

    #[test]
    fn test_pivot_missing_value_keeps_column() {
        let records = vec![
            record("2024-01", "A", 1.0),
            FlatRecord::new()
                .with("period", "2024-01")
                .with("category_code", "B"),
        ];

        let table = pivot(&records, Field::Period, Field::CategoryCode, Metric::Count);

        assert_eq!(table.columns, vec!["A", "B"]);
        assert_eq!(table.rows[0].get("B"), None);
        assert_eq!(table.rows[0].total(), 1.0);
    }

    #[test]
    fn test_pivot_empty_input() {
        let table = pivot(&[], Field::Period, Field::CategoryCode, Metric::Count);
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn test_row_serializes_flat() {
        let table = pivot(
            &[record("2024-01", "A", 2.0)],
            Field::Period,
            Field::CategoryCode,
            Metric::Count,
        );
        let json = serde_json::to_string(&table.rows[0]).unwrap();
        assert_eq!(json, r#"{"period":"2024-01","A":2.0}"#);
    }
}
