use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single cell of a flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Null,
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

/// Categorical fields a record may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Period,
    Date,
    Week,
    Month,
    Quarter,
    AreaName,
    LocationName,
    Generation,
    WeightClass,
    Level1Name,
    CategoryCode,
    CategoryShortName,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Period => "period",
            Self::Date => "date",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::AreaName => "area_name",
            Self::LocationName => "location_name",
            Self::Generation => "generation",
            Self::WeightClass => "weight_class",
            Self::Level1Name => "level1_name",
            Self::CategoryCode => "category_code",
            Self::CategoryShortName => "category_short_name",
        }
    }

    pub fn all() -> &'static [Field] {
        &[
            Self::Period,
            Self::Date,
            Self::Week,
            Self::Month,
            Self::Quarter,
            Self::AreaName,
            Self::LocationName,
            Self::Generation,
            Self::WeightClass,
            Self::Level1Name,
            Self::CategoryCode,
            Self::CategoryShortName,
        ]
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric fields a record may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Number of dead fish.
    Count,
    /// Mortality rate in percent of the stock.
    Rate,
    AvgWeightGrams,
    /// Generic value column used by re-expressed aggregates.
    Value,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Rate => "rate",
            Self::AvgWeightGrams => "avg_weight_grams",
            Self::Value => "value",
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(Self::Count),
            "rate" => Ok(Self::Rate),
            "avg_weight_grams" => Ok(Self::AvgWeightGrams),
            "value" => Ok(Self::Value),
            other => Err(format!("Unknown metric '{}'", other)),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (period, category) observation as delivered by a record source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord {
    fields: BTreeMap<String, Scalar>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Scalar>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Scalar>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.fields.get(name)
    }

    /// Non-empty text value of a categorical field. Numeric codes are rendered
    /// without a trailing `.0`.
    pub fn text(&self, field: Field) -> Option<String> {
        match self.fields.get(field.as_str())? {
            Scalar::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Scalar::Number(n) if n.is_finite() => Some(n.to_string()),
            _ => None,
        }
    }

    /// Finite numeric value of a metric field. Numeric text is parsed.
    pub fn number(&self, metric: Metric) -> Option<f64> {
        let value = match self.fields.get(metric.as_str())? {
            Scalar::Number(n) => *n,
            Scalar::Text(s) => s.trim().parse::<f64>().ok()?,
            Scalar::Null => return None,
        };
        value.is_finite().then_some(value)
    }
}
