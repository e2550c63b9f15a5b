//! Chapter markers and interval derivation.

use crate::time::{normalize, normalize_value, TimeInput};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named time interval embedded as metadata in the output container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    /// Start time in seconds.
    pub start_time: f64,
    /// End time in seconds; filled in by [`derive_intervals`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
}

impl Chapter {
    pub fn new(title: impl Into<String>, start_time: f64) -> Self {
        Self {
            title: title.into(),
            start_time,
            end_time: None,
        }
    }

    /// Build a chapter from a title and an unnormalized start time.
    pub fn parse(title: impl Into<String>, start: impl Into<TimeInput>) -> Result<Self> {
        Ok(Self::new(title, normalize(&start.into())?))
    }

    pub fn with_end(mut self, end_time: f64) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Whether this chapter carries a usable end time.
    ///
    /// An explicit end of `0` (or NaN) counts as no end time at all, so it is
    /// replaced during derivation and omitted from metadata files.
    pub fn has_end(&self) -> bool {
        matches!(self.end_time, Some(end) if end != 0.0 && !end.is_nan())
    }
}

/// Sort chapters by start time and fill in missing end times.
///
/// The sort is stable. Each chapter except the last that lacks an end time
/// takes the start time of the chapter after it. The last chapter keeps
/// whatever end time it was given, if any. Explicit end times are never
/// overwritten or checked against the start.
pub fn derive_intervals(mut chapters: Vec<Chapter>) -> Vec<Chapter> {
    chapters.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    for i in 1..chapters.len() {
        let next_start = chapters[i].start_time;
        let prev = &mut chapters[i - 1];
        if !prev.has_end() {
            prev.end_time = Some(next_start);
        }
    }

    chapters
}

#[derive(Debug, Deserialize)]
struct RawChapter {
    #[serde(default)]
    title: String,
    #[serde(default)]
    start_time: Value,
    #[serde(default)]
    end_time: Value,
}

/// Parse a JSON chapter list as sent by HTTP clients.
///
/// Expects an array of `{"title", "start_time", "end_time"?}` objects whose
/// times are numbers or strings accepted by [`normalize`]. A missing or
/// `null` end time is treated as absent. The result is passed through
/// [`derive_intervals`]. An empty array yields an empty list.
pub fn parse_chapters_json(json: &str) -> Result<Vec<Chapter>> {
    let raw: Vec<RawChapter> = match serde_json::from_str::<Value>(json)? {
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<RawChapter>, serde_json::Error>>()?,
        _ => return Err(Error::invalid_input("chapters must be a JSON array")),
    };

    let chapters = raw
        .into_iter()
        .map(|c| {
            let start_time = normalize_value(&c.start_time)?;
            let end_time = match c.end_time {
                Value::Null => None,
                ref end => Some(normalize_value(end)?),
            };
            Ok(Chapter {
                title: c.title,
                start_time,
                end_time,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(derive_intervals(chapters))
}
