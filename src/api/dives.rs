//! Dive API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{path_dive_number, success, ApiResult};
use crate::config::UnitPreferences;
use crate::errors::AppError;
use crate::models::{DiveEntry, DiveField, DiveRecord, DiveSubmission, FieldValue, Measure};
use crate::query::{DiveFilter, DiveQuerySubmission};
use crate::validation::{parse_dive_number, renumbers, validate_submission};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextDiveNumber {
    pub dive_number: i64,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Comma separated dive numbers
    #[serde(default)]
    pub numbers: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMembership {
    pub dive_number: i64,
    pub attribute_id: i64,
    pub present: bool,
}

/// One field of one dive, with its display text.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiveDetail {
    pub dive_number: i64,
    pub field: &'static str,
    pub value: Option<FieldValue>,
    pub display: String,
}

/// Render a value with the unit suffix for its measure, if any.
pub fn display_value(
    value: Option<&FieldValue>,
    measure: Option<Measure>,
    units: &UnitPreferences,
) -> String {
    match (value, measure) {
        (None, _) => String::new(),
        (Some(value), Some(measure)) => format!("{} {}", value, units.abbrev_for(measure)),
        (Some(value), None) => value.to_string(),
    }
}

/// Parse a comma separated list of dive numbers, skipping anything malformed.
fn parse_number_list(raw: &str) -> Vec<i64> {
    raw.split(',').filter_map(parse_dive_number).collect()
}

/// GET /api/dives - List all dive numbers.
pub async fn list_dives(State(state): State<AppState>) -> ApiResult<Vec<i64>> {
    success(state.repo.list_dive_numbers().await?)
}

/// GET /api/dives/next-number - Number to pre-fill for a new dive.
pub async fn next_dive_number(State(state): State<AppState>) -> ApiResult<NextDiveNumber> {
    success(NextDiveNumber {
        dive_number: state.repo.next_dive_number().await?,
    })
}

/// GET /api/dives/summaries?numbers= - Several dives in the order asked for.
pub async fn dive_summaries(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Vec<DiveRecord>> {
    let numbers = parse_number_list(&query.numbers);
    success(state.repo.get_dives(&numbers).await?)
}

/// POST /api/dives - Validate and store a new dive.
pub async fn create_dive(
    State(state): State<AppState>,
    Json(submission): Json<DiveSubmission>,
) -> ApiResult<DiveEntry> {
    let valid = validate_submission(&state.fields, &submission)?;
    let dive_number = valid.record.dive_number;

    state
        .repo
        .create_dive(&valid.record, &valid.attribute_ids)
        .await?;

    let (record, attributes) = state.repo.get_dive_entry(dive_number).await?;
    success(DiveEntry { record, attributes })
}

/// POST /api/dives/search - Run the query engine.
pub async fn search_dives(
    State(state): State<AppState>,
    Json(submission): Json<DiveQuerySubmission>,
) -> ApiResult<Vec<DiveRecord>> {
    let filter = DiveFilter::parse(&submission)?;
    let dives = state.repo.query_dives(&filter).await?;
    tracing::debug!("Dive search matched {} dives", dives.len());
    success(dives)
}

/// GET /api/dives/:n - A dive and its attribute names.
pub async fn get_dive(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> ApiResult<DiveEntry> {
    let dive_number = path_dive_number(&number)?;
    let (record, attributes) = state.repo.get_dive_entry(dive_number).await?;
    success(DiveEntry { record, attributes })
}

/// PUT /api/dives/:n - Validate and overwrite an existing dive.
pub async fn update_dive(
    State(state): State<AppState>,
    Path(number): Path<String>,
    Json(mut submission): Json<DiveSubmission>,
) -> ApiResult<DiveEntry> {
    let dive_number = path_dive_number(&number)?;

    if renumbers(&submission, dive_number) {
        return Err(AppError::invalid(
            "Dive numbers cannot be changed by an edit",
        ));
    }
    if submission.raw(DiveField::DiveNumber).is_none() {
        submission.dive_number = Some(dive_number.to_string());
    }

    let valid = validate_submission(&state.fields, &submission)?;
    state
        .repo
        .update_dive(dive_number, &valid.record, &valid.attribute_ids)
        .await?;

    let (record, attributes) = state.repo.get_dive_entry(dive_number).await?;
    success(DiveEntry { record, attributes })
}

/// DELETE /api/dives/:n - Delete a dive. Missing dives are not an error.
pub async fn delete_dive(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> ApiResult<()> {
    let dive_number = path_dive_number(&number)?;
    state.repo.delete_dive(dive_number).await?;
    success(())
}

/// GET /api/dives/:n/attributes/:id - Whether a dive carries an attribute.
pub async fn dive_has_attribute(
    State(state): State<AppState>,
    Path((number, attribute)): Path<(String, String)>,
) -> ApiResult<AttributeMembership> {
    let dive_number = path_dive_number(&number)?;
    let attribute_id: i64 = attribute
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid attribute id: {}", attribute)))?;

    success(AttributeMembership {
        dive_number,
        attribute_id,
        present: state.repo.has_attribute(dive_number, attribute_id).await?,
    })
}

/// GET /api/dives/:n/detail/:field - One field of a dive.
pub async fn dive_detail(
    State(state): State<AppState>,
    Path((number, field_name)): Path<(String, String)>,
) -> ApiResult<DiveDetail> {
    let dive_number = path_dive_number(&number)?;
    let field = DiveField::from_name(&field_name)
        .ok_or_else(|| AppError::invalid(format!("Unknown dive field: {}", field_name)))?;

    let record = state.repo.get_dive(dive_number).await?;
    let value = record.value_of(field);
    let measure = state.fields.get(field).and_then(|spec| spec.measure);

    success(DiveDetail {
        dive_number,
        field: field.key(),
        display: display_value(value.as_ref(), measure, &state.config.units),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DepthUnits, TempUnits};

    #[test]
    fn test_display_appends_unit_for_measured_fields() {
        let units = UnitPreferences {
            depth_units: DepthUnits::Feet,
            temp_units: TempUnits::Fahrenheit,
        };

        assert_eq!(
            display_value(
                Some(&FieldValue::Decimal(60.0)),
                Some(Measure::Length),
                &units
            ),
            "60 ft"
        );
        assert_eq!(
            display_value(
                Some(&FieldValue::Decimal(78.5)),
                Some(Measure::Temperature),
                &units
            ),
            "78.5 F"
        );
        assert_eq!(
            display_value(Some(&FieldValue::Text("Jo".into())), None, &units),
            "Jo"
        );
        assert_eq!(display_value(None, Some(Measure::Length), &units), "");
    }

    #[test]
    fn test_number_list_skips_malformed_entries() {
        assert_eq!(parse_number_list("3, 1,x,,0,12"), vec![3, 1, 12]);
        assert!(parse_number_list("").is_empty());
    }
}
