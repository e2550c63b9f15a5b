//! Conversion orchestration shared by the CLI and the HTTP server.

use m4bforge_av::{ConversionSettings, EncodeJob, InputKind, MediaEncoder, OutputFile, Playlist};
use m4bforge_common::Result;
use std::path::Path;

/// Validate the job's input and run it through the encoder.
///
/// Playlists are parsed first so that a non-playlist upload is rejected
/// before ffmpeg is spawned.
pub async fn convert(
    encoder: &dyn MediaEncoder,
    settings: &ConversionSettings,
    job: &EncodeJob,
) -> Result<OutputFile> {
    if job.kind == InputKind::M3u8 {
        let playlist = Playlist::from_file(&job.input).await?;
        tracing::info!(
            "Playlist {:?} has {} entries ({:.1}s known duration)",
            job.input,
            playlist.len(),
            playlist.total_duration()
        );
    }

    tracing::debug!("Dispatching {:?} to {}", job.input, encoder.name());
    encoder.run(job, settings).await
}

/// Pick the download file name for a conversion.
///
/// A non-blank `custom` name wins; it is reduced to its final path component
/// and gets the output extension when it has none. Otherwise the uploaded
/// file's stem is used.
pub fn output_file_name(original: &str, custom: Option<&str>, kind: InputKind) -> String {
    let ext = kind.output_extension();

    if let Some(custom) = custom.map(sanitize_file_name).filter(|c| !c.is_empty()) {
        return if Path::new(&custom).extension().is_some() {
            custom
        } else {
            format!("{custom}.{ext}")
        };
    }

    let stem = sanitize_file_name(
        Path::new(&sanitize_file_name(original))
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default()
            .as_ref(),
    );
    if stem.is_empty() {
        format!("output.{ext}")
    } else {
        format!("{stem}.{ext}")
    }
}

// Keeps the last path component and drops characters that would break a
// Content-Disposition header.
fn sanitize_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    last.chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect::<String>()
        .trim()
        .trim_start_matches('.')
        .to_string()
}
