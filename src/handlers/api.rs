use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{Local, NaiveDate};

use crate::error::AppResult;
use crate::handlers::params::ChartParams;
use crate::models::{FlatRecord, PieSlice, SeriesChart};
use crate::services::charts;
use crate::services::flow_graph::{self, FlowGraph};
use crate::state::AppState;

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn trend(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> AppResult<Json<SeriesChart>> {
    let query = params.query(today())?;
    let group_key = params.group_key()?;
    let metric = params.metric()?;

    let records = state.records.fetch(&query)?;

    Ok(Json(charts::trend_chart(
        &records,
        group_key,
        metric,
        params.share.unwrap_or(false),
    )))
}

pub async fn area_trend(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> AppResult<Json<SeriesChart>> {
    let query = params.query(today())?;
    let metric = params.metric()?;

    let records = state.records.fetch(&query)?;

    Ok(Json(charts::area_trend_chart(&records, metric)))
}

pub async fn pie(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> AppResult<Json<Vec<PieSlice>>> {
    let query = params.query(today())?;
    let group_key = params.group_key()?;
    let metric = params.metric()?;
    let top_n = params.top_n(&state.config);

    let records = state.records.fetch(&query)?;

    Ok(Json(charts::pie_chart(&records, group_key, metric, top_n)))
}

pub async fn sankey(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> AppResult<Json<FlowGraph>> {
    let query = params.query(today())?;
    let flow_config = params.flow_config(&state.config)?;

    let records = state.records.fetch(&query)?;

    Ok(Json(flow_graph::build(&records, &flow_config)))
}

pub async fn records(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> AppResult<Json<Vec<FlatRecord>>> {
    let query = params.query(today())?;
    Ok(Json(state.records.fetch(&query)?))
}
