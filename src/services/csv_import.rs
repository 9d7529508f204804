use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::date_utils::parse_date;
use crate::error::AppError;

/// A mortality observation read from an uploaded CSV file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedObservation {
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
    pub row_number: usize,
}

#[derive(Debug)]
pub struct ParseResult {
    pub observations: Vec<ParsedObservation>,
    pub errors: Vec<String>,
}

pub fn parse_csv(content: &[u8]) -> Result<ParseResult, AppError> {
    trace!(content_size = content.len(), "Starting CSV parsing");

    let content_str =
        std::str::from_utf8(content).map_err(|e| AppError::CsvParse(e.to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content_str.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::CsvParse(e.to_string()))?
        .clone();

    debug!(column_count = headers.len(), "CSV headers parsed");

    let date_col = find_column(&headers, "date")
        .ok_or_else(|| AppError::CsvParse("No date column found in CSV".into()))?;
    let code_col = find_column(&headers, "category_code")
        .ok_or_else(|| AppError::CsvParse("No category_code column found in CSV".into()))?;

    let area_col = find_column(&headers, "area_name");
    let location_col = find_column(&headers, "location_name");
    let generation_col = find_column(&headers, "generation");
    let weight_class_col = find_column(&headers, "weight_class");
    let level1_col = find_column(&headers, "level1_name");
    let short_name_col = find_column(&headers, "category_short_name");
    let count_col = find_column(&headers, "count");
    let rate_col = find_column(&headers, "rate");
    let avg_weight_col = find_column(&headers, "avg_weight_grams");

    let mut observations = Vec::new();
    let mut errors = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let row_number = row_idx + 2;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                errors.push(format!("Row {}: {}", row_number, e));
                continue;
            }
        };

        let date = record.get(date_col).unwrap_or("").trim().to_string();
        let category_code = record.get(code_col).unwrap_or("").trim().to_string();

        if date.is_empty() || category_code.is_empty() {
            errors.push(format!("Row {}: Missing date or category_code", row_number));
            continue;
        }
        if parse_date(&date).is_none() {
            errors.push(format!("Row {}: Invalid date '{}'", row_number, date));
            continue;
        }

        let mut numbers = [None; 3];
        let mut invalid = None;
        for (slot, (col, name)) in numbers.iter_mut().zip([
            (count_col, "count"),
            (rate_col, "rate"),
            (avg_weight_col, "avg_weight_grams"),
        ]) {
            match get_optional_field(&record, col) {
                Some(raw) => match clean_number(&raw).parse::<f64>() {
                    Ok(v) => *slot = Some(v),
                    Err(_) => {
                        invalid = Some(format!("Row {}: Invalid {} '{}'", row_number, name, raw));
                        break;
                    }
                },
                None => *slot = None,
            }
        }
        if let Some(error) = invalid {
            errors.push(error);
            continue;
        }
        let [count, rate, avg_weight_grams] = numbers;

        observations.push(ParsedObservation {
            date,
            area_name: get_optional_field(&record, area_col),
            location_name: get_optional_field(&record, location_col),
            generation: get_optional_field(&record, generation_col),
            weight_class: get_optional_field(&record, weight_class_col),
            level1_name: get_optional_field(&record, level1_col),
            category_code,
            category_short_name: get_optional_field(&record, short_name_col),
            count,
            rate,
            avg_weight_grams,
            row_number,
        });
    }

    if !errors.is_empty() {
        warn!(
            error_count = errors.len(),
            "CSV parsing completed with errors"
        );
    }
    debug!(
        row_count = observations.len(),
        error_count = errors.len(),
        "CSV parsing completed"
    );

    Ok(ParseResult {
        observations,
        errors,
    })
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn get_optional_field(record: &csv::StringRecord, col: Option<usize>) -> Option<String> {
    col.and_then(|c| record.get(c))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Accept both `1.5` and `1,5` as decimal notation and drop spaces used as
/// thousand separators.
fn clean_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}
