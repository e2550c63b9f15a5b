//! # m4bforge-av
//!
//! External encoder plumbing for m4bforge.
//!
//! This crate provides:
//!
//! - **Encoder capability** ([`MediaEncoder`], [`FfmpegEncoder`]) -- turns an
//!   [`EncodeJob`] into an M4B or MKV file.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Chapter metadata** ([`metadata`]) -- FFMETADATA1 side files.
//! - **Playlist checks** ([`Playlist`]) -- M3U8 validation before encoding.
//! - **Workspace management** ([`Workspace`]) -- temporary directory lifecycle.
//! - **Tool detection** ([`tools`]) -- locating ffmpeg.

pub mod command;
pub mod encoder;
pub mod media;
pub mod metadata;
pub mod playlist;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use encoder::{
    build_ffmpeg_args, ConversionSettings, EncodeJob, FfmpegEncoder, MediaEncoder, OutputFile,
};
pub use media::InputKind;
pub use playlist::{Playlist, PlaylistEntry};
pub use tools::{check_ffmpeg, check_tools, get_tool_path, require_tool, ToolInfo};
pub use workspace::Workspace;
