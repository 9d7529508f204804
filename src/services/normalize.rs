use crate::models::{Aggregate, PercentageShare, PeriodAggregates, PeriodShares};
use crate::services::pivot::PeriodTable;

/// Share of `value` in `total`. A zero or negative total yields 0.
pub fn share_of(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total
    } else {
        0.0
    }
}

/// Express each aggregate as a share of the set's total.
pub fn normalize(aggregates: &[Aggregate]) -> Vec<PercentageShare> {
    let total: f64 = aggregates.iter().map(|a| a.value).sum();

    aggregates
        .iter()
        .map(|a| PercentageShare {
            key: a.key.clone(),
            label: a.label.clone(),
            value: a.value,
            share: share_of(a.value, total),
        })
        .collect()
}

/// Normalize every period against its own total.
pub fn normalize_by_period(periods: &[PeriodAggregates]) -> Vec<PeriodShares> {
    periods
        .iter()
        .map(|p| PeriodShares {
            period: p.period.clone(),
            shares: normalize(&p.aggregates),
        })
        .collect()
}

/// Divide each cell by its row (period) total. Absent cells stay absent.
pub fn normalize_table(table: &PeriodTable) -> PeriodTable {
    let mut normalized = table.clone();
    for row in &mut normalized.rows {
        let total = row.total();
        for cell in row.cells.values_mut() {
            if let Some(value) = cell {
                *value = share_of(*value, total);
            }
        }
    }
    normalized
}
