use chrono::NaiveDate;
use serde::Deserialize;

use crate::config::Config;
use crate::date_utils::{parse_date, DatePreset, DateRange, Granularity};
use crate::error::{AppError, AppResult};
use crate::models::query::split_list;
use crate::models::{Field, Metric, QueryParams};
use crate::services::flow_graph::{FlowConfig, ValueSelector};
use crate::services::grouping::GroupKey;

/// Raw query string of the chart and export endpoints.
///
/// Every selector is parsed up front; an unknown value is rejected with a
/// validation error instead of falling back to a default.
#[derive(Debug, Default, Deserialize)]
pub struct ChartParams {
    pub preset: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub areas: Option<String>,
    pub generations: Option<String>,
    pub weight_classes: Option<String>,
    pub granularity: Option<String>,
    pub group_by: Option<String>,
    pub metric: Option<String>,
    pub share: Option<bool>,
    pub top_n: Option<usize>,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub min_threshold: Option<f64>,
    pub target: Option<String>,
    pub decorate: Option<bool>,
}

impl ChartParams {
    pub fn query(&self, today: NaiveDate) -> AppResult<QueryParams> {
        let range = self.date_range(today)?;
        let granularity = parse_or(self.granularity.as_deref(), Granularity::default())?;

        Ok(QueryParams::new(range, granularity)
            .with_areas(split_list(self.areas.as_deref()))
            .with_generations(split_list(self.generations.as_deref()))
            .with_weight_classes(split_list(self.weight_classes.as_deref())))
    }

    fn date_range(&self, today: NaiveDate) -> AppResult<DateRange> {
        if let Some(preset) = non_empty(self.preset.as_deref()) {
            let preset = preset.parse::<DatePreset>().map_err(AppError::Validation)?;
            return Ok(DateRange::from_preset(preset, today));
        }

        match (
            non_empty(self.from_date.as_deref()),
            non_empty(self.to_date.as_deref()),
        ) {
            (None, None) => Ok(DateRange::all()),
            (from, to) => {
                let all = DateRange::all();
                let from = from.map(parse_date_param).transpose()?.unwrap_or(all.from);
                let to = to.map(parse_date_param).transpose()?.unwrap_or(all.to);
                Ok(DateRange::from_dates(from, to))
            }
        }
    }

    pub fn group_key(&self) -> AppResult<GroupKey> {
        parse_or(self.group_by.as_deref(), GroupKey::default())
    }

    pub fn metric(&self) -> AppResult<Metric> {
        parse_or(self.metric.as_deref(), Metric::Count)
    }

    pub fn top_n(&self, config: &Config) -> usize {
        self.top_n.unwrap_or(config.default_top_n)
    }

    pub fn flow_config(&self, config: &Config) -> AppResult<FlowConfig> {
        let value = ValueSelector::parse(
            non_empty(self.value.as_deref()).unwrap_or("count"),
            non_empty(self.unit.as_deref()),
        )
        .map_err(AppError::Validation)?;

        let target_field = match non_empty(self.target.as_deref()) {
            None | Some("category") => Field::CategoryShortName,
            Some("code") => Field::CategoryCode,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "Unknown flow target '{}'",
                    other
                )))
            }
        };

        let min_threshold = self.min_threshold.unwrap_or(config.default_min_threshold);
        if !min_threshold.is_finite() {
            return Err(AppError::Validation(
                "min_threshold must be a finite number".into(),
            ));
        }

        Ok(FlowConfig {
            target_field,
            value,
            min_threshold,
            top_n: self.top_n(config),
            decorate_labels: self.decorate.unwrap_or(false),
            ..Default::default()
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_or<T>(value: Option<&str>, default: T) -> AppResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    match non_empty(value) {
        Some(s) => s.parse().map_err(AppError::Validation),
        None => Ok(default),
    }
}

fn parse_date_param(value: &str) -> AppResult<NaiveDate> {
    parse_date(value)
        .ok_or_else(|| AppError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}
