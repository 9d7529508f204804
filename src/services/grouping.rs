use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::models::{Aggregate, Field, FlatRecord, Metric, PeriodAggregates};

/// Which categorical field of a record supplies the aggregation key and label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Level-1 category name, used as both key and label.
    #[default]
    Level1,
    /// Category code as key, `"{code} - {short name}"` as label.
    Code,
    /// Category short name, used as both key and label.
    Category,
}

impl FromStr for GroupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "level1" => Ok(Self::Level1),
            "code" => Ok(Self::Code),
            "category" => Ok(Self::Category),
            other => Err(format!("Unknown grouping '{}'", other)),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Level1 => "level1",
            Self::Code => "code",
            Self::Category => "category",
        }
    }

    /// Field that carries the aggregation key.
    pub fn key_field(&self) -> Field {
        match self {
            Self::Level1 => Field::Level1Name,
            Self::Code => Field::CategoryCode,
            Self::Category => Field::CategoryShortName,
        }
    }

    /// Derive `(key, label)` from the categorical fields of a record.
    /// Returns `None` when the key field is missing.
    pub fn key_and_label(&self, record: &FlatRecord) -> Option<(String, String)> {
        match self {
            Self::Level1 | Self::Category => {
                let name = record.text(self.key_field())?;
                Some((name.clone(), name))
            }
            Self::Code => {
                let code = record.text(Field::CategoryCode)?;
                let label = match record.text(Field::CategoryShortName) {
                    Some(short_name) => format!("{} - {}", code, short_name),
                    None => code.clone(),
                };
                Some((code, label))
            }
        }
    }
}

/// Sum `metric` per group key. Output keeps first-seen key order.
///
/// Records whose metric is missing or zero, or that lack the key field, are
/// skipped and never produce an entry of their own.
pub fn reduce<'a>(
    records: impl IntoIterator<Item = &'a FlatRecord>,
    group_key: GroupKey,
    metric: Metric,
) -> Vec<Aggregate> {
    let mut aggregates: Vec<Aggregate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0usize;

    for record in records {
        let value = match record.number(metric) {
            Some(v) if v != 0.0 => v,
            _ => {
                skipped += 1;
                continue;
            }
        };
        let Some((key, label)) = group_key.key_and_label(record) else {
            skipped += 1;
            continue;
        };

        match index.get(&key) {
            Some(&i) => aggregates[i].value += value,
            None => {
                index.insert(key.clone(), aggregates.len());
                aggregates.push(Aggregate::new(key, label, value));
            }
        }
    }

    trace!(
        group_key = %group_key,
        metric = %metric,
        groups = aggregates.len(),
        skipped,
        "Reduced records"
    );
    aggregates
}

/// Bucket records by `period_field` and reduce each bucket independently.
/// Buckets come out in ascending period order.
pub fn reduce_per_period(
    records: &[FlatRecord],
    period_field: Field,
    group_key: GroupKey,
    metric: Metric,
) -> Vec<PeriodAggregates> {
    let mut buckets: BTreeMap<String, Vec<&FlatRecord>> = BTreeMap::new();
    for record in records {
        if let Some(period) = record.text(period_field) {
            buckets.entry(period).or_default().push(record);
        }
    }

    buckets
        .into_iter()
        .map(|(period, bucket)| PeriodAggregates {
            aggregates: reduce(bucket, group_key, metric),
            period,
        })
        .filter(|p| !p.aggregates.is_empty())
        .collect()
}
