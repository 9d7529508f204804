use serde::{Deserialize, Serialize};

use crate::models::record::{Field, FlatRecord, Metric};

/// Key and display label of the synthetic bucket that absorbs the long tail.
pub const OTHER_KEY: &str = "Andre kategorier";
pub const OTHER_LABEL: &str = "Andre kategorier";

/// A (key, label, summed value) triple produced by grouping flat records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub key: String,
    pub label: String,
    pub value: f64,
}

impl Aggregate {
    pub fn new(key: impl Into<String>, label: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value,
        }
    }

    pub fn is_other(&self) -> bool {
        self.key == OTHER_KEY
    }

    /// Re-express this aggregate as a flat record so it can be pivoted.
    pub fn to_record(&self, period: &str, key_field: Field, metric: Metric) -> FlatRecord {
        FlatRecord::new()
            .with(Field::Period.as_str(), period)
            .with(key_field.as_str(), self.key.as_str())
            .with(metric.as_str(), self.value)
    }
}

/// An aggregate expressed as a share of its period total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentageShare {
    pub key: String,
    pub label: String,
    pub value: f64,
    pub share: f64,
}

/// All aggregates that fall within one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAggregates {
    pub period: String,
    pub aggregates: Vec<Aggregate>,
}

/// Normalized aggregates for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodShares {
    pub period: String,
    pub shares: Vec<PercentageShare>,
}

/// Directed, weighted flow-graph edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEdge {
    pub source: String,
    pub target: String,
    pub value: f64,
}

impl RankedEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
        }
    }

    pub fn is_other(&self) -> bool {
        self.target == OTHER_LABEL
    }
}
