use serde::{Deserialize, Serialize};

use crate::date_utils::{month_label, parse_date, quarter_label, week_label, Granularity};
use crate::models::record::{Field, FlatRecord, Metric};

/// A stored mortality observation: one date, area, generation and loss cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    pub date: String,
    pub area_name: Option<String>,
    pub location_name: Option<String>,
    pub generation: Option<String>,
    pub weight_class: Option<String>,
    pub level1_name: Option<String>,
    pub category_code: String,
    pub category_short_name: Option<String>,
    pub count: Option<f64>,
    pub rate: Option<f64>,
    pub avg_weight_grams: Option<f64>,
}

impl Observation {
    /// Flatten into a record whose `period` follows `granularity`. The
    /// week/month/quarter labels are always filled in as well.
    pub fn to_flat_record(&self, granularity: Granularity) -> FlatRecord {
        let mut record = FlatRecord::new()
            .with(Field::Date.as_str(), self.date.as_str())
            .with(Field::AreaName.as_str(), self.area_name.clone())
            .with(Field::LocationName.as_str(), self.location_name.clone())
            .with(Field::Generation.as_str(), self.generation.clone())
            .with(Field::WeightClass.as_str(), self.weight_class.clone())
            .with(Field::Level1Name.as_str(), self.level1_name.clone())
            .with(Field::CategoryCode.as_str(), self.category_code.as_str())
            .with(
                Field::CategoryShortName.as_str(),
                self.category_short_name.clone(),
            )
            .with(Metric::Count.as_str(), self.count)
            .with(Metric::Rate.as_str(), self.rate)
            .with(Metric::AvgWeightGrams.as_str(), self.avg_weight_grams);

        if let Some(date) = parse_date(&self.date) {
            record.set(Field::Period.as_str(), granularity.period_label(date));
            record.set(Field::Week.as_str(), week_label(date));
            record.set(Field::Month.as_str(), month_label(date));
            record.set(Field::Quarter.as_str(), quarter_label(date));
        }
        record
    }
}
