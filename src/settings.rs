use chrono::Utc;

use crate::error::{Error, Result};
use crate::query::period::Period;

pub const DEFAULT_PERIOD: &str = "default_period";
pub const STRICT_RECORDS: &str = "strict_records";
pub const DEFAULT_PROJECT: &str = "default_project";

/// Typed view of the `app_config` table. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub default_period: String,
    pub strict_records: bool,
    pub default_project: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_period: "30d".to_string(),
            strict_records: false,
            default_project: None,
        }
    }
}

impl Settings {
    /// Build settings from stored key/value pairs, rejecting invalid values
    /// for known keys.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut settings = Settings::default();
        for (key, value) in pairs {
            validate(key, value)?;
            match key {
                DEFAULT_PERIOD => settings.default_period = value.trim().to_string(),
                STRICT_RECORDS => settings.strict_records = parse_bool(key, value)?,
                DEFAULT_PROJECT => {
                    let value = value.trim();
                    settings.default_project = (!value.is_empty()).then(|| value.to_string());
                }
                _ => {}
            }
        }
        Ok(settings)
    }
}

/// Check a value before it is stored under `key`.
pub fn validate(key: &str, value: &str) -> Result<()> {
    match key {
        DEFAULT_PERIOD => {
            Period::parse(value, Utc::now().date_naive())
                .and_then(|period| period.window())
                .map(|_| ())
                .map_err(|e| Error::Config(format!("{key}: {e}")))
        }
        STRICT_RECORDS => parse_bool(key, value).map(|_| ()),
        _ => Ok(()),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{key}: expected true or false, got '{other}'"))),
    }
}
