//! Configuration module for the dive log backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Serialize;

use crate::models::Measure;

/// Display unit for depths and visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DepthUnits {
    #[default]
    Metres,
    Feet,
}

impl DepthUnits {
    /// Parse a unit preference, falling back to `Metres` for anything unrecognised.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "feet" => DepthUnits::Feet,
            "metres" => DepthUnits::Metres,
            _ => DepthUnits::default(),
        }
    }

    pub fn abbrev(&self) -> &'static str {
        match self {
            DepthUnits::Metres => "m",
            DepthUnits::Feet => "ft",
        }
    }
}

/// Display unit for water and air temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TempUnits {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TempUnits {
    /// Parse a unit preference, falling back to `Celsius` for anything unrecognised.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "fahrenheit" => TempUnits::Fahrenheit,
            "celsius" => TempUnits::Celsius,
            _ => TempUnits::default(),
        }
    }

    pub fn abbrev(&self) -> &'static str {
        match self {
            TempUnits::Celsius => "C",
            TempUnits::Fahrenheit => "F",
        }
    }
}

/// Unit preferences used when formatting stored values for display.
///
/// Stored values are never converted; these only pick the suffix shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPreferences {
    pub depth_units: DepthUnits,
    pub temp_units: TempUnits,
}

impl UnitPreferences {
    /// Unit suffix shown after a value of the given measure.
    pub fn abbrev_for(&self, measure: Measure) -> &'static str {
        match measure {
            Measure::Length => self.depth_units.abbrev(),
            Measure::Temperature => self.temp_units.abbrev(),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub units: UnitPreferences,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let db_path = env::var("SCUBALOG_DB_PATH")
            .unwrap_or_else(|_| "./data/scubalog.sqlite".to_string())
            .into();

        let bind_addr_raw =
            env::var("SCUBALOG_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = bind_addr_raw
            .parse()
            .map_err(|e| format!("Invalid SCUBALOG_BIND_ADDR {:?}: {}", bind_addr_raw, e))?;

        let log_level = env::var("SCUBALOG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let depth_units = env::var("SCUBALOG_DEPTH_UNITS")
            .map(|v| DepthUnits::parse_or_default(&v))
            .unwrap_or_default();
        let temp_units = env::var("SCUBALOG_TEMP_UNITS")
            .map(|v| TempUnits::parse_or_default(&v))
            .unwrap_or_default();

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            units: UnitPreferences {
                depth_units,
                temp_units,
            },
        })
    }
}
