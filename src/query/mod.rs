//! Dive log query engine.
//!
//! A raw [`DiveQuerySubmission`] is parsed into a typed [`DiveFilter`]. Range
//! bounds are pushed down to SQL by the repository; the substring and
//! attribute checks run over the candidate rows here.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{raw_text, DiveRecord};
use crate::validation::{valid_date, valid_decimal};

/// Raw search form as submitted. Blank entries impose no filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiveQuerySubmission {
    #[serde(default, deserialize_with = "raw_text")]
    pub max_depth_min: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub max_depth_max: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub date_min: Option<String>,
    #[serde(default, deserialize_with = "raw_text")]
    pub date_max: Option<String>,
    #[serde(default)]
    pub site_contains: Option<String>,
    #[serde(default)]
    pub buddy_contains: Option<String>,
    #[serde(default)]
    pub required_attribute_ids: Vec<i64>,
}

/// Validated search criteria. All ranges are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiveFilter {
    pub max_depth_min: Option<f64>,
    pub max_depth_max: Option<f64>,
    pub date_min: Option<String>,
    pub date_max: Option<String>,
    /// Lower-cased needle
    pub site_contains: Option<String>,
    /// Lower-cased needle
    pub buddy_contains: Option<String>,
    pub required_attribute_ids: BTreeSet<i64>,
}

fn non_blank(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().filter(|s| !s.is_empty())
}

fn parse_depth(
    raw: &Option<String>,
    message: &str,
    errors: &mut Vec<String>,
) -> Option<f64> {
    let raw = non_blank(raw)?;
    let parsed = if valid_decimal(raw) {
        raw.parse().ok()
    } else {
        None
    };
    if parsed.is_none() {
        errors.push(message.to_string());
    }
    parsed
}

fn parse_date(raw: &Option<String>, message: &str, errors: &mut Vec<String>) -> Option<String> {
    let raw = non_blank(raw)?;
    if valid_date(raw) {
        Some(raw.to_string())
    } else {
        errors.push(message.to_string());
        None
    }
}

fn needle(raw: &Option<String>) -> Option<String> {
    non_blank(raw).map(str::to_lowercase)
}

/// Case-insensitive literal containment. A missing field never matches.
fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

impl DiveFilter {
    /// Validate a raw search form, reporting every malformed bound together.
    pub fn parse(submission: &DiveQuerySubmission) -> Result<Self, AppError> {
        let mut errors = Vec::new();

        let max_depth_min = parse_depth(
            &submission.max_depth_min,
            "Minimum Max Depth must be blank or numeric.",
            &mut errors,
        );
        let max_depth_max = parse_depth(
            &submission.max_depth_max,
            "Maximum Max Depth must be blank or numeric.",
            &mut errors,
        );
        let date_min = parse_date(
            &submission.date_min,
            "Earliest Date must be YYYY-MM-DD.",
            &mut errors,
        );
        let date_max = parse_date(
            &submission.date_max,
            "Latest Date must be YYYY-MM-DD.",
            &mut errors,
        );

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(Self {
            max_depth_min,
            max_depth_max,
            date_min,
            date_max,
            site_contains: needle(&submission.site_contains),
            buddy_contains: needle(&submission.buddy_contains),
            required_attribute_ids: submission.required_attribute_ids.iter().copied().collect(),
        })
    }

    /// Whether the record passes the site and buddy substring checks.
    pub fn matches_text(&self, record: &DiveRecord) -> bool {
        let site_ok = self
            .site_contains
            .as_deref()
            .map_or(true, |n| contains_ignore_case(record.site_name.as_deref(), n));
        let buddy_ok = self
            .buddy_contains
            .as_deref()
            .map_or(true, |n| contains_ignore_case(record.buddy.as_deref(), n));
        site_ok && buddy_ok
    }

    /// Whether a dive holding `held` carries every required attribute.
    pub fn matches_attributes(&self, held: &BTreeSet<i64>) -> bool {
        self.required_attribute_ids.is_subset(held)
    }
}
