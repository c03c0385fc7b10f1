//! Dive record model and the raw submission it is built from.

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};

use super::DiveField;

/// One logged dive.
///
/// Dates are kept as the validated `YYYY-MM-DD` text rather than a calendar type,
/// since the date check is deliberately looser than a real calendar.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiveRecord {
    pub dive_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_down: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_depth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dive_time_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sea_conditions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buddy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boat_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A typed value held by one field of a dive record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Decimal(f64),
    Date(String),
    Time(NaiveTime),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Decimal(v) => write!(f, "{}", v),
            FieldValue::Date(v) | FieldValue::Text(v) => f.write_str(v),
            FieldValue::Time(v) => write!(f, "{}", v.format("%H:%M")),
        }
    }
}

impl DiveRecord {
    pub fn new(dive_number: i64) -> Self {
        Self {
            dive_number,
            ..Default::default()
        }
    }

    /// Read a single field.
    pub fn value_of(&self, field: DiveField) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        let decimal = |v: Option<f64>| v.map(FieldValue::Decimal);
        match field {
            DiveField::DiveNumber => Some(FieldValue::Integer(self.dive_number)),
            DiveField::Date => self.date.clone().map(FieldValue::Date),
            DiveField::SiteName => text(&self.site_name),
            DiveField::Location => text(&self.location),
            DiveField::Objective => text(&self.objective),
            DiveField::TimeDown => self.time_down.map(FieldValue::Time),
            DiveField::MaxDepth => decimal(self.max_depth),
            DiveField::AvgDepth => decimal(self.avg_depth),
            DiveField::DiveTimeMinutes => decimal(self.dive_time_minutes),
            DiveField::WaterTemp => decimal(self.water_temp),
            DiveField::AirTemp => decimal(self.air_temp),
            DiveField::Weather => text(&self.weather),
            DiveField::SeaConditions => text(&self.sea_conditions),
            DiveField::Visibility => decimal(self.visibility),
            DiveField::Buddy => text(&self.buddy),
            DiveField::BoatName => text(&self.boat_name),
            DiveField::Notes => text(&self.notes),
        }
    }

    /// Write a single field. A value of the wrong shape for the field is ignored.
    pub fn set(&mut self, field: DiveField, value: FieldValue) {
        match (field, value) {
            (DiveField::DiveNumber, FieldValue::Integer(v)) => self.dive_number = v,
            (DiveField::Date, FieldValue::Date(v)) => self.date = Some(v),
            (DiveField::TimeDown, FieldValue::Time(v)) => self.time_down = Some(v),
            (DiveField::MaxDepth, FieldValue::Decimal(v)) => self.max_depth = Some(v),
            (DiveField::AvgDepth, FieldValue::Decimal(v)) => self.avg_depth = Some(v),
            (DiveField::DiveTimeMinutes, FieldValue::Decimal(v)) => {
                self.dive_time_minutes = Some(v)
            }
            (DiveField::WaterTemp, FieldValue::Decimal(v)) => self.water_temp = Some(v),
            (DiveField::AirTemp, FieldValue::Decimal(v)) => self.air_temp = Some(v),
            (DiveField::Visibility, FieldValue::Decimal(v)) => self.visibility = Some(v),
            (DiveField::SiteName, FieldValue::Text(v)) => self.site_name = Some(v),
            (DiveField::Location, FieldValue::Text(v)) => self.location = Some(v),
            (DiveField::Objective, FieldValue::Text(v)) => self.objective = Some(v),
            (DiveField::Weather, FieldValue::Text(v)) => self.weather = Some(v),
            (DiveField::SeaConditions, FieldValue::Text(v)) => self.sea_conditions = Some(v),
            (DiveField::Buddy, FieldValue::Text(v)) => self.buddy = Some(v),
            (DiveField::BoatName, FieldValue::Text(v)) => self.boat_name = Some(v),
            (DiveField::Notes, FieldValue::Text(v)) => self.notes = Some(v),
            _ => {}
        }
    }
}

/// A dive record together with the names of its attributes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiveEntry {
    #[serde(flatten)]
    pub record: DiveRecord,
    pub attributes: Vec<String>,
}

/// Request body for creating or editing a dive.
///
/// Every field is the raw text the diver typed; nothing is trusted until it has
/// been through validation. Numbers sent as JSON numbers are accepted as text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiveSubmission {
    #[serde(default, deserialize_with = "raw_text")]
    pub dive_number: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub site_name: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub objective: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub time_down: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub max_depth: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub avg_depth: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub dive_time_minutes: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub water_temp: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub air_temp: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub weather: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub sea_conditions: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub visibility: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub buddy: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub boat_name: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub notes: Option<String>,
    /// Ids of the attribute types to link to the dive
    #[serde(default)]
    pub attribute_ids: Vec<i64>,
}

impl DiveSubmission {
    /// Raw text submitted for a field, `None` when absent or empty.
    pub fn raw(&self, field: DiveField) -> Option<&str> {
        let value = match field {
            DiveField::DiveNumber => &self.dive_number,
            DiveField::Date => &self.date,
            DiveField::SiteName => &self.site_name,
            DiveField::Location => &self.location,
            DiveField::Objective => &self.objective,
            DiveField::TimeDown => &self.time_down,
            DiveField::MaxDepth => &self.max_depth,
            DiveField::AvgDepth => &self.avg_depth,
            DiveField::DiveTimeMinutes => &self.dive_time_minutes,
            DiveField::WaterTemp => &self.water_temp,
            DiveField::AirTemp => &self.air_temp,
            DiveField::Weather => &self.weather,
            DiveField::SeaConditions => &self.sea_conditions,
            DiveField::Visibility => &self.visibility,
            DiveField::Buddy => &self.buddy,
            DiveField::BoatName => &self.boat_name,
            DiveField::Notes => &self.notes,
        };
        value.as_deref().filter(|s| !s.is_empty())
    }
}

/// Accept a JSON string or number as raw text.
pub(crate) fn raw_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected text or a number, got {}",
            other
        ))),
    }
}
