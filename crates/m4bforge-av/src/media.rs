//! Input kinds and the output format each one converts to.

use m4bforge_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of source accepted for conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// MP3 audio, converted to an M4B audiobook.
    Mp3,
    /// M3U8/M3U playlist, converted to an MKV file.
    M3u8,
}

const MP3_MIME_TYPES: &[&str] = &["audio/mpeg", "audio/mp3"];

const M3U8_MIME_TYPES: &[&str] = &[
    "application/x-mpegurl",
    "application/vnd.apple.mpegurl",
    "audio/mpegurl",
    "audio/x-mpegurl",
];

impl InputKind {
    /// Detect the kind from a file name extension, case-insensitively.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "mp3" => Some(InputKind::Mp3),
            "m3u8" | "m3u" => Some(InputKind::M3u8),
            _ => None,
        }
    }

    /// Detect the kind from a MIME type, ignoring parameters.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next()?.trim().to_lowercase();
        if MP3_MIME_TYPES.contains(&essence.as_str()) {
            Some(InputKind::Mp3)
        } else if M3U8_MIME_TYPES.contains(&essence.as_str()) {
            Some(InputKind::M3u8)
        } else {
            None
        }
    }

    /// Detect from an uploaded file name, falling back to its MIME type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] when neither identifies MP3 or M3U8.
    pub fn detect(file_name: &str, mime: Option<&str>) -> Result<Self> {
        Self::from_extension(Path::new(file_name))
            .or_else(|| mime.and_then(Self::from_mime))
            .ok_or_else(|| {
                Error::Unsupported(format!(
                    "{file_name}. Only MP3 and M3U8 files are allowed."
                ))
            })
    }

    /// Extension used for the stored upload.
    pub fn input_extension(&self) -> &'static str {
        match self {
            InputKind::Mp3 => "mp3",
            InputKind::M3u8 => "m3u8",
        }
    }

    /// Extension of the produced file.
    pub fn output_extension(&self) -> &'static str {
        match self {
            InputKind::Mp3 => "m4b",
            InputKind::M3u8 => "mkv",
        }
    }

    /// MIME type of the produced file.
    pub fn output_content_type(&self) -> &'static str {
        match self {
            InputKind::Mp3 => "audio/x-m4b",
            InputKind::M3u8 => "video/x-matroska",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InputKind::Mp3 => "MP3",
            InputKind::M3u8 => "M3U8",
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
