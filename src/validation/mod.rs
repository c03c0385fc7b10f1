//! Field validators and dive submission validation.
//!
//! The predicates here are pure checks over raw text. [`validate_submission`]
//! runs every field of a [`DiveSubmission`] through them and reports all
//! problems at once, so a form can show them together.

use chrono::NaiveTime;

use crate::errors::AppError;
use crate::models::{
    DiveField, DiveRecord, DiveSubmission, FieldCatalog, FieldKind, FieldSpec, FieldValue,
};

/// Largest absolute value accepted for integers and the whole part of decimals.
pub const NUMERIC_LIMIT: i64 = 100_000;

/// Longest raw numeric input accepted.
const NUMERIC_MAX_LEN: usize = 12;

fn strip_sign(text: &str) -> &str {
    text.strip_prefix(&['+', '-'][..]).unwrap_or(text)
}

fn all_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Whole-part magnitude of a digit string, saturating for absurdly long input.
fn magnitude(digits: &str) -> i64 {
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(i64::MAX)
}

/// Optional sign followed by digits, at most 12 characters, magnitude at most 100000.
pub fn valid_integer(text: &str) -> bool {
    if text.len() > NUMERIC_MAX_LEN {
        return false;
    }
    let digits = strip_sign(text);
    all_digits(digits) && magnitude(digits) <= NUMERIC_LIMIT
}

/// Like [`valid_integer`] but allows one decimal point followed by at least one digit.
///
/// `.5` is accepted, `5.` is not.
pub fn valid_decimal(text: &str) -> bool {
    if text.len() > NUMERIC_MAX_LEN {
        return false;
    }
    let body = strip_sign(text);
    let whole = match body.split_once('.') {
        None => {
            if !all_digits(body) {
                return false;
            }
            body
        }
        Some((whole, fraction)) => {
            if !(whole.is_empty() || all_digits(whole)) || !all_digits(fraction) {
                return false;
            }
            whole
        }
    };
    magnitude(whole) <= NUMERIC_LIMIT
}

/// `YYYY-MM-DD` with month at most 12 and day at most 31.
///
/// There is no per-month day check, so `2014-02-30` passes. Stored logs were
/// entered under this rule, so it is kept as is.
pub fn valid_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let (year, month, day) = (&text[0..4], &text[5..7], &text[8..10]);
    if !(all_digits(year) && all_digits(month) && all_digits(day)) {
        return false;
    }
    magnitude(month) <= 12 && magnitude(day) <= 31
}

/// Hour and minute of an `HH:MM` or `HH:MM:SS` string; seconds are not checked.
fn parse_time(text: &str) -> Option<(u32, u32)> {
    if text.len() > 8 {
        return None;
    }
    let mut parts = text.split(':');
    let hour = parts.next()?;
    let minute = parts.next()?;
    if let Some(second) = parts.next() {
        if second.len() != 2 || !all_digits(second) {
            return None;
        }
    }
    if parts.next().is_some() {
        return None;
    }
    if !(1..=2).contains(&hour.len()) || !all_digits(hour) {
        return None;
    }
    if minute.len() != 2 || !all_digits(minute) {
        return None;
    }
    let (hour, minute) = (hour.parse().ok()?, minute.parse().ok()?);
    (hour <= 23 && minute <= 59).then_some((hour, minute))
}

/// `HH:MM` or `HH:MM:SS`, hour 0-23 and minute 0-59.
pub fn valid_time(text: &str) -> bool {
    parse_time(text).is_some()
}

/// At most `max_len` characters. Empty text always passes.
pub fn valid_bounded_text(text: &str, max_len: usize) -> bool {
    text.chars().count() <= max_len
}

/// Check one raw field value against its rule and convert it.
fn check_field(spec: &FieldSpec, raw: &str) -> Result<FieldValue, String> {
    match spec.kind {
        FieldKind::Integer { min } => {
            let value = if valid_integer(raw) {
                raw.parse::<i64>().ok().filter(|v| *v >= min)
            } else {
                None
            };
            value.map(FieldValue::Integer).ok_or_else(|| {
                format!(
                    "{} must be a positive integer that's not too big (max 100,000).",
                    spec.label
                )
            })
        }
        FieldKind::Decimal { non_negative } => {
            let value = if valid_decimal(raw) {
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| !(non_negative && *v < 0.0))
            } else {
                None
            };
            value.map(FieldValue::Decimal).ok_or_else(|| {
                format!(
                    "Invalid {} entry. Should be a {}number that's not too big (max: 100,000). \
                     It may have a decimal point but must not end with one.",
                    spec.label,
                    if non_negative { "positive " } else { "" }
                )
            })
        }
        FieldKind::Date => {
            if valid_date(raw) {
                Ok(FieldValue::Date(raw.to_string()))
            } else {
                Err(format!(
                    "Incorrect {} format. Should be: YYYY-MM-DD",
                    spec.label
                ))
            }
        }
        FieldKind::Time => parse_time(raw)
            .and_then(|(hour, minute)| NaiveTime::from_hms_opt(hour, minute, 0))
            .map(FieldValue::Time)
            .ok_or_else(|| {
                format!(
                    "Incorrect {} format. Should be: HH:MM. You entered: {}",
                    spec.label, raw
                )
            }),
        FieldKind::Text { max_len } => {
            if valid_bounded_text(raw, max_len) {
                Ok(FieldValue::Text(raw.to_string()))
            } else {
                Err(format!(
                    "{} is too long ({}-character max)",
                    spec.label, max_len
                ))
            }
        }
    }
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDive {
    pub record: DiveRecord,
    pub attribute_ids: Vec<i64>,
}

/// Validate every field of a submission, collecting one message per bad field.
///
/// A record is only produced when no field failed.
pub fn validate_submission(
    catalog: &FieldCatalog,
    submission: &DiveSubmission,
) -> Result<ValidDive, AppError> {
    let mut errors = Vec::new();
    let mut record = DiveRecord::default();

    for spec in catalog.specs() {
        match submission.raw(spec.field) {
            None if spec.required => {
                errors.push(format!("{} must not be empty.", spec.label));
            }
            None => {}
            Some(raw) => match check_field(spec, raw) {
                Ok(value) => record.set(spec.field, value),
                Err(message) => errors.push(message),
            },
        }
    }

    if !errors.is_empty() {
        tracing::debug!(
            "Rejected dive submission with {} field errors",
            errors.len()
        );
        return Err(AppError::Validation(errors));
    }

    Ok(ValidDive {
        record,
        attribute_ids: submission.attribute_ids.clone(),
    })
}

/// Parse a dive number given in a path or list, with the same rule as the form.
pub fn parse_dive_number(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if !valid_integer(raw) {
        return None;
    }
    raw.parse().ok().filter(|n: &i64| *n >= 1)
}

/// Whether a submission carries a well-formed dive number other than `expected`.
///
/// A malformed number is left for [`validate_submission`] to report.
pub fn renumbers(submission: &DiveSubmission, expected: i64) -> bool {
    submission
        .raw(DiveField::DiveNumber)
        .and_then(parse_dive_number)
        .is_some_and(|number| number != expected)
}
