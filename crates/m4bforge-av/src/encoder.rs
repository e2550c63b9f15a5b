//! The external encoder capability and its ffmpeg implementation.

use crate::command::ToolCommand;
use crate::metadata;
use crate::tools::{check_ffmpeg, get_tool_path, ToolInfo};
use crate::InputKind;
use async_trait::async_trait;
use m4bforge_common::{Chapter, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Encoding parameters applied to every conversion.
///
/// Callers pass this explicitly into [`MediaEncoder::run`]; there are no
/// process-wide defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConversionSettings {
    /// ffmpeg audio encoder name (default: "aac").
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate for MP3 sources (default: "64k").
    #[serde(default = "default_mp3_bitrate")]
    pub mp3_bitrate: String,

    /// Audio bitrate for M3U8 sources (default: "128k").
    #[serde(default = "default_m3u8_bitrate")]
    pub m3u8_bitrate: String,

    /// Maximum encoder run time in seconds (default: 3600).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_mp3_bitrate() -> String {
    "64k".to_string()
}

fn default_m3u8_bitrate() -> String {
    "128k".to_string()
}

fn default_timeout_secs() -> u64 {
    3600
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            audio_codec: default_audio_codec(),
            mp3_bitrate: default_mp3_bitrate(),
            m3u8_bitrate: default_m3u8_bitrate(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ConversionSettings {
    /// Default bitrate for a given input kind.
    pub fn bitrate_for(&self, kind: InputKind) -> &str {
        match kind {
            InputKind::Mp3 => &self.mp3_bitrate,
            InputKind::M3u8 => &self.m3u8_bitrate,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A single conversion request handed to a [`MediaEncoder`].
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub kind: InputKind,
    /// Chapters in final order, already passed through
    /// [`m4bforge_common::derive_intervals`]. Empty for none.
    pub chapters: Vec<Chapter>,
    /// Overrides the settings' bitrate for this job (e.g. "96k").
    pub bitrate: Option<String>,
}

impl EncodeJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, kind: InputKind) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            kind,
            chapters: Vec::new(),
            bitrate: None,
        }
    }

    pub fn with_chapters(mut self, chapters: Vec<Chapter>) -> Self {
        self.chapters = chapters;
        self
    }

    pub fn with_bitrate(mut self, bitrate: Option<String>) -> Self {
        self.bitrate = bitrate.filter(|b| !b.trim().is_empty());
        self
    }

    /// The bitrate this job encodes at.
    pub fn effective_bitrate<'a>(&'a self, settings: &'a ConversionSettings) -> &'a str {
        self.bitrate
            .as_deref()
            .unwrap_or_else(|| settings.bitrate_for(self.kind))
    }
}

/// A file produced by an encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub size: u64,
}

/// Capability for turning an [`EncodeJob`] into an output file.
///
/// The server and CLI only talk to this trait, so tests can swap in an
/// encoder that never spawns a process.
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Short name of the encoder, used in logs.
    fn name(&self) -> &str;

    /// Availability information, used by health checks.
    fn check(&self) -> ToolInfo;

    /// Run the conversion and return the produced file.
    async fn run(&self, job: &EncodeJob, settings: &ConversionSettings) -> Result<OutputFile>;
}

/// [`MediaEncoder`] backed by the ffmpeg command-line tool.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEncoder {
    configured_path: Option<PathBuf>,
}

impl FfmpegEncoder {
    /// Create an encoder that uses `path` when it exists, else `PATH`.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            configured_path: path,
        }
    }

    fn program(&self) -> Result<PathBuf> {
        get_tool_path("ffmpeg", self.configured_path.as_deref())
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn check(&self) -> ToolInfo {
        check_ffmpeg(self.configured_path.as_deref())
    }

    async fn run(&self, job: &EncodeJob, settings: &ConversionSettings) -> Result<OutputFile> {
        let program = self.program()?;

        if let Some(parent) = job.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let metadata_path = if job.chapters.is_empty() {
            None
        } else {
            let path = metadata::sidecar_path(&job.output);
            metadata::write_ffmetadata(&path, &job.chapters).await?;
            Some(path)
        };

        tracing::info!(
            "Converting {:?} ({}) to {:?} with {} chapters at {}",
            job.input,
            job.kind,
            job.output,
            job.chapters.len(),
            job.effective_bitrate(settings)
        );

        let result = ToolCommand::new(program)
            .args(build_ffmpeg_args(job, settings, metadata_path.as_deref()))
            .timeout(settings.timeout())
            .execute()
            .await;

        if let Some(path) = &metadata_path {
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::warn!("Failed to remove chapter file {:?}: {}", path, e);
            }
        }

        result?;

        let size = tokio::fs::metadata(&job.output).await?.len();
        tracing::info!("Conversion complete: {:?} ({} bytes)", job.output, size);

        Ok(OutputFile {
            path: job.output.clone(),
            content_type: job.kind.output_content_type(),
            size,
        })
    }
}

/// Build the ffmpeg argument list for a job.
///
/// MP3 sources are re-encoded to the configured audio codec. Playlists keep
/// their video stream and are read with network protocols whitelisted, since
/// their segments usually live on remote servers. When `metadata` is given
/// it is added as a second input and its chapters and tags are mapped.
pub fn build_ffmpeg_args(
    job: &EncodeJob,
    settings: &ConversionSettings,
    metadata: Option<&Path>,
) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into()];

    if job.kind == InputKind::M3u8 {
        args.extend([
            "-protocol_whitelist".into(),
            "file,http,https,tcp,tls,crypto".into(),
        ]);
    }

    args.extend(["-i".into(), path_arg(&job.input)]);

    if let Some(meta) = metadata {
        args.extend(["-i".into(), path_arg(meta)]);
    }

    if job.kind == InputKind::M3u8 {
        args.extend(["-map".into(), "0".into(), "-c:v".into(), "copy".into()]);
    }

    args.extend([
        "-c:a".into(),
        settings.audio_codec.clone(),
        "-b:a".into(),
        job.effective_bitrate(settings).to_string(),
    ]);

    if metadata.is_some() {
        args.extend([
            "-map_metadata".into(),
            "1".into(),
            "-map_chapters".into(),
            "1".into(),
        ]);
    }

    args.push(path_arg(&job.output));
    args
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
