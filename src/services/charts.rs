use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::models::chart::{palette_color, OTHER_COLOR};
use crate::models::{Aggregate, ChartSeries, Field, FlatRecord, Metric, PieSlice, SeriesChart};
use crate::services::grouping::{reduce, reduce_per_period, GroupKey};
use crate::services::normalize::normalize_table;
use crate::services::pivot::{pivot, PeriodTable};
use crate::services::top_n::collapse;

/// Line/bar chart with one series per group, summed per period.
///
/// With `as_share` each point is the group's share of its own period total.
pub fn trend_chart(
    records: &[FlatRecord],
    group_key: GroupKey,
    metric: Metric,
    as_share: bool,
) -> SeriesChart {
    let (table, labels) = trend_pivot(records, group_key, metric, as_share);

    debug!(
        group_key = %group_key,
        metric = %metric,
        as_share,
        periods = table.rows.len(),
        series = table.columns.len(),
        "Built trend chart"
    );
    series_chart(&table, |code| {
        labels.get(code).cloned().unwrap_or_else(|| code.to_string())
    })
}

/// The period x group table behind [`trend_chart`], keyed by group key.
pub fn trend_table(
    records: &[FlatRecord],
    group_key: GroupKey,
    metric: Metric,
    as_share: bool,
) -> PeriodTable {
    trend_pivot(records, group_key, metric, as_share).0
}

fn trend_pivot(
    records: &[FlatRecord],
    group_key: GroupKey,
    metric: Metric,
    as_share: bool,
) -> (PeriodTable, HashMap<String, String>) {
    let periods = reduce_per_period(records, Field::Period, group_key, metric);

    let mut labels: HashMap<String, String> = HashMap::new();
    let mut flat = Vec::new();
    for period in &periods {
        for aggregate in &period.aggregates {
            labels
                .entry(aggregate.key.clone())
                .or_insert_with(|| aggregate.label.clone());
            flat.push(aggregate.to_record(&period.period, group_key.key_field(), Metric::Value));
        }
    }

    let table = pivot(&flat, Field::Period, group_key.key_field(), Metric::Value);
    let table = if as_share {
        normalize_table(&table)
    } else {
        table
    };
    (table, labels)
}

/// One series per area, one point per period. Observations sharing a
/// (period, area) pair are summed before pivoting.
pub fn area_trend_chart(records: &[FlatRecord], metric: Metric) -> SeriesChart {
    let summed = sum_pairs(records, Field::Period, Field::AreaName, metric);
    let table = pivot(&summed, Field::Period, Field::AreaName, metric);
    series_chart(&table, str::to_string)
}

/// The `top_n` heaviest groups plus one "Andre kategorier" aggregate holding
/// the remainder.
pub fn top_aggregates(
    records: &[FlatRecord],
    group_key: GroupKey,
    metric: Metric,
    top_n: usize,
) -> Vec<Aggregate> {
    collapse(reduce(records, group_key, metric), top_n).into_vec()
}

/// Pie slices for [`top_aggregates`], the remainder slice in a neutral color.
pub fn pie_chart(
    records: &[FlatRecord],
    group_key: GroupKey,
    metric: Metric,
    top_n: usize,
) -> Vec<PieSlice> {
    top_aggregates(records, group_key, metric, top_n)
        .into_iter()
        .enumerate()
        .map(|(i, a)| PieSlice {
            color: if a.is_other() {
                OTHER_COLOR.to_string()
            } else {
                palette_color(i)
            },
            name: a.label,
            value: a.value,
        })
        .collect()
}

pub fn series_chart(table: &PeriodTable, label: impl Fn(&str) -> String) -> SeriesChart {
    SeriesChart {
        categories: table.periods(),
        series: table
            .columns
            .iter()
            .enumerate()
            .map(|(i, code)| ChartSeries {
                name: label(code),
                data: table.column(code),
                color: palette_color(i),
            })
            .collect(),
    }
}

/// Sum `metric` per (period, code) pair, yielding one record per pair.
pub fn sum_pairs(
    records: &[FlatRecord],
    period_field: Field,
    code_field: Field,
    metric: Metric,
) -> Vec<FlatRecord> {
    let mut sums: BTreeMap<(String, String), f64> = BTreeMap::new();
    for record in records {
        let (Some(period), Some(code), Some(value)) = (
            record.text(period_field),
            record.text(code_field),
            record.number(metric),
        ) else {
            continue;
        };
        *sums.entry((period, code)).or_insert(0.0) += value;
    }

    sums.into_iter()
        .map(|((period, code), value)| {
            FlatRecord::new()
                .with(period_field.as_str(), period)
                .with(code_field.as_str(), code)
                .with(metric.as_str(), value)
        })
        .collect()
}
