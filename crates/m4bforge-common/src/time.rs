//! Time normalization.
//!
//! Chapter start and end times arrive in several shapes: raw seconds from
//! JSON, numeric strings from the command line, or `MM:SS[.sss]` strings
//! typed by a person. [`normalize`] resolves all of them to `f64` seconds.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A time value as supplied by a caller, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeInput {
    /// Already numeric; passed through unchanged.
    Seconds(f64),
    /// Textual form: `"390"`, `"390.5"`, `"6:30"` or `"6:30.5"`.
    Text(String),
}

impl From<f64> for TimeInput {
    fn from(secs: f64) -> Self {
        TimeInput::Seconds(secs)
    }
}

impl From<u32> for TimeInput {
    fn from(secs: u32) -> Self {
        TimeInput::Seconds(f64::from(secs))
    }
}

impl From<&str> for TimeInput {
    fn from(text: &str) -> Self {
        TimeInput::Text(text.to_string())
    }
}

impl From<String> for TimeInput {
    fn from(text: String) -> Self {
        TimeInput::Text(text)
    }
}

impl TryFrom<&Value> for TimeInput {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(TimeInput::Seconds)
                .ok_or_else(|| Error::invalid_format(n.to_string())),
            Value::String(s) => Ok(TimeInput::Text(s.clone())),
            other => Err(Error::invalid_format(other.to_string())),
        }
    }
}

/// Resolve a time value to seconds.
///
/// Numeric input is returned as-is, with no bounds check. Text is trimmed,
/// then read either as `minutes:seconds` (exactly one colon) or as a plain
/// number. Seconds of 60 or more are accepted and simply added.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] when the text cannot be resolved.
///
/// # Examples
///
/// ```
/// use m4bforge_common::time::{normalize, TimeInput};
///
/// assert_eq!(normalize(&TimeInput::from("6:30")).unwrap(), 390.0);
/// assert_eq!(normalize(&TimeInput::from(390.5)).unwrap(), 390.5);
/// assert!(normalize(&TimeInput::from("10:")).is_err());
/// ```
pub fn normalize(input: &TimeInput) -> Result<f64> {
    match input {
        TimeInput::Seconds(secs) => Ok(*secs),
        TimeInput::Text(text) => parse_time_str(text),
    }
}

/// Resolve a JSON value to seconds.
///
/// Numbers and strings follow [`normalize`]; every other JSON type is an
/// [`Error::InvalidFormat`].
pub fn normalize_value(value: &Value) -> Result<f64> {
    normalize(&TimeInput::try_from(value)?)
}

/// Parse a textual time (`"390"`, `"6:30"`, `"6:30.5"`) into seconds.
pub fn parse_time_str(text: &str) -> Result<f64> {
    let trimmed = text.trim();

    if trimmed.contains(':') {
        let mut parts = trimmed.split(':');
        return match (parts.next(), parts.next(), parts.next()) {
            (Some(minutes), Some(seconds), None) => {
                match (parse_number(minutes), parse_number(seconds)) {
                    (Some(m), Some(s)) => Ok(m * 60.0 + s),
                    _ => Err(Error::invalid_format(text)),
                }
            }
            _ => Err(Error::invalid_format(text)),
        };
    }

    parse_number(trimmed).ok_or_else(|| Error::invalid_format(text))
}

// Textual "NaN" and "inf" are rejected; only numeric input may carry
// non-finite values through.
fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
