//! Statistics API endpoints.

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::stats::{self, DurationStyle, LogStatistic, LogSummary};
use crate::validation::parse_dive_number;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatisticQuery {
    /// `hm`, `dhm`, or raw minutes when absent
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub uptodive: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatisticValue {
    pub statistic: String,
    pub value: String,
}

/// GET /api/stats - Headline figures for the whole log.
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<LogSummary> {
    success(stats::summary(&state.repo).await?)
}

/// GET /api/stats/:detail - A single named statistic.
pub async fn get_statistic(
    State(state): State<AppState>,
    Path(detail): Path<String>,
    Query(query): Query<StatisticQuery>,
) -> ApiResult<StatisticValue> {
    let statistic = LogStatistic::from_name(&detail)
        .ok_or_else(|| AppError::invalid(format!("Unknown statistic: {}", detail)))?;
    let style = query
        .format
        .as_deref()
        .map(DurationStyle::parse)
        .unwrap_or_default();
    // A bound that is not a dive number is ignored like one naming a missing dive
    let up_to_dive = query.uptodive.as_deref().and_then(parse_dive_number);

    let value = stats::log_statistic(&state.repo, statistic, style, up_to_dive).await?;
    success(StatisticValue {
        statistic: detail,
        value,
    })
}
