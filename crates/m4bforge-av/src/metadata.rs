//! FFMETADATA chapter files.
//!
//! ffmpeg reads chapter markers from a side file in its `;FFMETADATA1`
//! format, passed as a second input and mapped with `-map_metadata 1`.

use m4bforge_common::{Chapter, Result};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Render chapters as an FFMETADATA1 document with a millisecond timebase.
///
/// Times are floored to whole milliseconds. `END` is written for every
/// chapter except the last, and only when the chapter has a usable end time
/// (see [`Chapter::has_end`]).
pub fn render_ffmetadata(chapters: &[Chapter]) -> String {
    let mut out = String::from(";FFMETADATA1\n");
    let last = chapters.len().saturating_sub(1);

    for (i, chapter) in chapters.iter().enumerate() {
        out.push_str("[CHAPTER]\n");
        out.push_str("TIMEBASE=1/1000\n");
        let _ = writeln!(out, "START={}", to_millis(chapter.start_time));
        if i < last && chapter.has_end() {
            if let Some(end) = chapter.end_time {
                let _ = writeln!(out, "END={}", to_millis(end));
            }
        }
        let _ = writeln!(out, "title={}\n", escape_value(&chapter.title));
    }

    out
}

/// Write the chapter metadata document to `path`.
pub async fn write_ffmetadata(path: &Path, chapters: &[Chapter]) -> Result<()> {
    tokio::fs::write(path, render_ffmetadata(chapters)).await?;
    Ok(())
}

/// A unique metadata file path next to `output`.
pub fn sidecar_path(output: &Path) -> PathBuf {
    let dir = output.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("chapters_{}.txt", uuid::Uuid::new_v4()))
}

fn to_millis(secs: f64) -> i64 {
    (secs * 1000.0).floor() as i64
}

// '=', ';', '#', '\' and newlines are special in FFMETADATA values.
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '=' | ';' | '#' | '\\' | '\n' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}
