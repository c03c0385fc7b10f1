//! Summary statistics over the dive log.

use serde::Serialize;

use crate::db::Repository;
use crate::errors::AppError;

/// How a duration in minutes is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationStyle {
    /// The bare number of minutes
    #[default]
    Raw,
    /// `2 hours and 5 minutes`
    HoursMinutes,
    /// `1 day, 2 hours and 5 minutes`
    DaysHoursMinutes,
}

impl DurationStyle {
    /// Parse `hm` / `dhm`; anything else is raw minutes.
    pub fn parse(format: &str) -> Self {
        match format {
            "hm" => DurationStyle::HoursMinutes,
            "dhm" => DurationStyle::DaysHoursMinutes,
            _ => DurationStyle::Raw,
        }
    }
}

fn plural(count: f64, singular: &str, plural: &str) -> String {
    let word = if count == 1.0 { singular } else { plural };
    format!("{} {}", number(count), word)
}

/// Whole numbers print without a fractional part.
fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Render a number of minutes in the given style.
pub fn format_duration(minutes: f64, style: DurationStyle) -> String {
    match style {
        DurationStyle::Raw => number(minutes),
        DurationStyle::HoursMinutes => {
            let hours = (minutes / 60.0).floor();
            let mins = minutes - hours * 60.0;
            format!(
                "{} and {}",
                plural(hours, "hour", "hours"),
                plural(mins, "minute", "minutes")
            )
        }
        DurationStyle::DaysHoursMinutes => {
            let days = (minutes / 1440.0).floor();
            let rest = minutes - days * 1440.0;
            let hours = (rest / 60.0).floor();
            let mins = rest - hours * 60.0;
            format!(
                "{}, {} and {}",
                plural(days, "day", "days"),
                plural(hours, "hour", "hours"),
                plural(mins, "minute", "minutes")
            )
        }
    }
}

/// A named statistic of the whole log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatistic {
    TimeUnderwater,
    /// Highest dive number
    NumDives,
    /// Number of stored dives
    NumLoggedDives,
}

impl LogStatistic {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "timeunderwater" => Some(LogStatistic::TimeUnderwater),
            "numdives" => Some(LogStatistic::NumDives),
            "numloggeddives" => Some(LogStatistic::NumLoggedDives),
            _ => None,
        }
    }
}

/// Headline figures for the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    pub dive_count: i64,
    pub logged_dive_count: i64,
    pub highest_dive_number: i64,
    pub total_minutes: f64,
}

/// Dive count as the log presents it: the highest dive number in use.
pub async fn dive_count(repo: &Repository) -> Result<i64, AppError> {
    repo.highest_dive_number().await
}

/// Number of dives actually stored.
pub async fn logged_dive_count(repo: &Repository) -> Result<i64, AppError> {
    repo.count_dives().await
}

pub async fn summary(repo: &Repository) -> Result<LogSummary, AppError> {
    let count = dive_count(repo).await?;
    Ok(LogSummary {
        dive_count: count,
        logged_dive_count: logged_dive_count(repo).await?,
        highest_dive_number: repo.highest_dive_number().await?,
        total_minutes: repo.total_time_underwater(None).await?,
    })
}

/// Evaluate a named statistic.
///
/// `up_to_dive` only bounds the time total, and only when it names a stored dive.
pub async fn log_statistic(
    repo: &Repository,
    statistic: LogStatistic,
    style: DurationStyle,
    up_to_dive: Option<i64>,
) -> Result<String, AppError> {
    match statistic {
        LogStatistic::TimeUnderwater => {
            let bound = match up_to_dive {
                Some(n) if repo.dive_exists(n).await? => Some(n),
                _ => None,
            };
            let minutes = repo.total_time_underwater(bound).await?;
            Ok(format_duration(minutes, style))
        }
        LogStatistic::NumDives => Ok(dive_count(repo).await?.to_string()),
        LogStatistic::NumLoggedDives => Ok(logged_dive_count(repo).await?.to_string()),
    }
}
