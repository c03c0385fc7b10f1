//! Settings API endpoint.

use axum::extract::State;
use serde::Serialize;

use super::{success, ApiResult};
use crate::config::{DepthUnits, TempUnits};
use crate::AppState;

/// Effective unit preferences and their display suffixes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub depth_units: DepthUnits,
    pub temp_units: TempUnits,
    pub depth_abbrev: &'static str,
    pub temp_abbrev: &'static str,
}

/// GET /api/settings - Unit preferences in effect.
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<SettingsView> {
    let units = state.config.units;
    success(SettingsView {
        depth_units: units.depth_units,
        temp_units: units.temp_units,
        depth_abbrev: units.depth_units.abbrev(),
        temp_abbrev: units.temp_units.abbrev(),
    })
}
