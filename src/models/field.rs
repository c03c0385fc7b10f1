//! Field metadata for dive records.
//!
//! The table of fields, their display labels and their input rules is built once
//! at startup and handed to anything that needs to validate or describe a field.

use serde::Serialize;

/// Every stored column of a dive record, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiveField {
    DiveNumber,
    Date,
    SiteName,
    Location,
    Objective,
    TimeDown,
    MaxDepth,
    AvgDepth,
    DiveTimeMinutes,
    WaterTemp,
    AirTemp,
    Weather,
    SeaConditions,
    Visibility,
    Buddy,
    BoatName,
    Notes,
}

impl DiveField {
    pub const ALL: [DiveField; 17] = [
        DiveField::DiveNumber,
        DiveField::Date,
        DiveField::SiteName,
        DiveField::Location,
        DiveField::Objective,
        DiveField::TimeDown,
        DiveField::MaxDepth,
        DiveField::AvgDepth,
        DiveField::DiveTimeMinutes,
        DiveField::WaterTemp,
        DiveField::AirTemp,
        DiveField::Weather,
        DiveField::SeaConditions,
        DiveField::Visibility,
        DiveField::Buddy,
        DiveField::BoatName,
        DiveField::Notes,
    ];

    /// Column name in the `dive` table.
    pub fn column(&self) -> &'static str {
        match self {
            DiveField::DiveNumber => "dive_number",
            DiveField::Date => "dive_date",
            DiveField::SiteName => "site_name",
            DiveField::Location => "location",
            DiveField::Objective => "objective",
            DiveField::TimeDown => "time_down",
            DiveField::MaxDepth => "max_depth",
            DiveField::AvgDepth => "avg_depth",
            DiveField::DiveTimeMinutes => "dive_time",
            DiveField::WaterTemp => "water_temp",
            DiveField::AirTemp => "air_temp",
            DiveField::Weather => "weather",
            DiveField::SeaConditions => "sea_conditions",
            DiveField::Visibility => "visibility",
            DiveField::Buddy => "buddy",
            DiveField::BoatName => "boat_name",
            DiveField::Notes => "notes",
        }
    }

    /// Key used in JSON payloads.
    pub fn key(&self) -> &'static str {
        match self {
            DiveField::DiveNumber => "diveNumber",
            DiveField::Date => "date",
            DiveField::SiteName => "siteName",
            DiveField::Location => "location",
            DiveField::Objective => "objective",
            DiveField::TimeDown => "timeDown",
            DiveField::MaxDepth => "maxDepth",
            DiveField::AvgDepth => "avgDepth",
            DiveField::DiveTimeMinutes => "diveTimeMinutes",
            DiveField::WaterTemp => "waterTemp",
            DiveField::AirTemp => "airTemp",
            DiveField::Weather => "weather",
            DiveField::SeaConditions => "seaConditions",
            DiveField::Visibility => "visibility",
            DiveField::Buddy => "buddy",
            DiveField::BoatName => "boatName",
            DiveField::Notes => "notes",
        }
    }

    /// Look a field up by its JSON key or its column name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.key() == name || f.column() == name)
    }
}

/// What a field measures, for picking a display unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Depths and visibility
    Length,
    Temperature,
}

/// Input rule for a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Whole number no smaller than `min`
    Integer { min: i64 },
    Decimal { non_negative: bool },
    Date,
    Time,
    Text { max_len: usize },
}

/// One row of the field table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub field: DiveField,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub measure: Option<Measure>,
}

impl FieldSpec {
    const fn new(field: DiveField, label: &'static str, kind: FieldKind) -> Self {
        Self {
            field,
            label,
            kind,
            required: false,
            measure: None,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn measured(mut self, measure: Measure) -> Self {
        self.measure = Some(measure);
        self
    }
}

/// Upper bound on short text fields.
pub const SHORT_TEXT_MAX: usize = 100;
/// Upper bound on the notes field.
pub const NOTES_MAX: usize = 10_000;

/// Immutable table of dive fields, keyed by [`DiveField`].
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    specs: Vec<FieldSpec>,
}

impl FieldCatalog {
    /// The fields of a logged dive.
    pub fn dive_fields() -> Self {
        use DiveField::*;

        let text = FieldKind::Text {
            max_len: SHORT_TEXT_MAX,
        };
        let positive = FieldKind::Decimal { non_negative: true };
        let signed = FieldKind::Decimal {
            non_negative: false,
        };

        Self {
            specs: vec![
                FieldSpec::new(DiveNumber, "Dive Number", FieldKind::Integer { min: 1 }).required(),
                FieldSpec::new(Date, "Dive Date", FieldKind::Date),
                FieldSpec::new(SiteName, "Dive Site", text),
                FieldSpec::new(Location, "Location", text),
                FieldSpec::new(Objective, "Objective", text),
                FieldSpec::new(TimeDown, "Time Down", FieldKind::Time),
                FieldSpec::new(MaxDepth, "Max Depth", positive).measured(Measure::Length),
                FieldSpec::new(AvgDepth, "Average Depth", positive).measured(Measure::Length),
                FieldSpec::new(DiveTimeMinutes, "Dive Time", positive),
                FieldSpec::new(WaterTemp, "Water Temperature", signed)
                    .measured(Measure::Temperature),
                FieldSpec::new(AirTemp, "Air Temperature", signed).measured(Measure::Temperature),
                FieldSpec::new(Weather, "Weather", text),
                FieldSpec::new(SeaConditions, "Sea Conditions", text),
                FieldSpec::new(Visibility, "Visibility", positive).measured(Measure::Length),
                FieldSpec::new(Buddy, "Buddy", text),
                FieldSpec::new(BoatName, "Boat Name", text),
                FieldSpec::new(Notes, "Notes", FieldKind::Text { max_len: NOTES_MAX }),
            ],
        }
    }

    /// Field specs in form order.
    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    pub fn get(&self, field: DiveField) -> Option<&FieldSpec> {
        self.specs.iter().find(|spec| spec.field == field)
    }
}
