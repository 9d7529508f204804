use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::AppResult;
use crate::handlers::api::today;
use crate::handlers::params::ChartParams;
use crate::models::Field;
use crate::services::charts;
use crate::services::csv_export::{self, AGGREGATE_HEADERS, SHARE_HEADERS};
use crate::services::grouping::reduce_per_period;
use crate::services::normalize::normalize_by_period;
use crate::state::AppState;

fn csv_response(body: String, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Per-period aggregates with their share of the period total.
pub async fn aggregates(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> AppResult<Response> {
    let query = params.query(today())?;
    let group_key = params.group_key()?;
    let metric = params.metric()?;

    let records = state.records.fetch(&query)?;
    let periods = reduce_per_period(&records, Field::Period, group_key, metric);
    let shares = normalize_by_period(&periods);

    let body = csv_export::serialize(&csv_export::share_rows(&shares), SHARE_HEADERS);
    Ok(csv_response(
        body,
        &format!("mortality_{}_{}.csv", group_key, metric),
    ))
}

/// Trend table: one row per period, one column per group key.
pub async fn trend(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> AppResult<Response> {
    let query = params.query(today())?;
    let group_key = params.group_key()?;
    let metric = params.metric()?;

    let records = state.records.fetch(&query)?;
    let table = charts::trend_table(&records, group_key, metric, params.share.unwrap_or(false));

    let (rows, headers) = csv_export::table_rows(&table);
    let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
    Ok(csv_response(
        csv_export::serialize(&rows, &headers),
        &format!("mortality_trend_{}_{}.csv", group_key, metric),
    ))
}

/// Top N groups over the whole window, remainder folded into one row.
pub async fn top(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> AppResult<Response> {
    let query = params.query(today())?;
    let group_key = params.group_key()?;
    let metric = params.metric()?;
    let top_n = params.top_n(&state.config);

    let records = state.records.fetch(&query)?;
    let aggregates = charts::top_aggregates(&records, group_key, metric, top_n);

    Ok(csv_response(
        csv_export::serialize(&csv_export::aggregate_rows(&aggregates), AGGREGATE_HEADERS),
        &format!("mortality_top_{}_{}.csv", group_key, metric),
    ))
}

pub async fn records(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> AppResult<Response> {
    let query = params.query(today())?;
    let records = state.records.fetch(&query)?;

    let body = csv_export::serialize(
        &csv_export::record_rows(&records),
        &csv_export::record_headers(),
    );
    Ok(csv_response(body, "mortality_records.csv"))
}
