use crate::date_utils::{DateRange, Granularity};

/// Filter window handed to a record source.
///
/// Built once per request from the caller's parameters and never mutated.
/// Empty filter lists mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub range: DateRange,
    pub areas: Vec<String>,
    pub generations: Vec<String>,
    pub weight_classes: Vec<String>,
    pub granularity: Granularity,
}

impl QueryParams {
    pub fn new(range: DateRange, granularity: Granularity) -> Self {
        Self {
            range,
            granularity,
            ..Default::default()
        }
    }

    pub fn with_areas(mut self, areas: Vec<String>) -> Self {
        self.areas = areas;
        self
    }

    pub fn with_generations(mut self, generations: Vec<String>) -> Self {
        self.generations = generations;
        self
    }

    pub fn with_weight_classes(mut self, weight_classes: Vec<String>) -> Self {
        self.weight_classes = weight_classes;
        self
    }
}

/// Split a comma separated query value into trimmed, non-empty items.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|s| {
            s.split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
