//! Multipart upload handling.
//!
//! The file part is streamed straight into the request's [`Workspace`];
//! the remaining text fields are collected into an [`UploadForm`].

use super::error::AppError;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use m4bforge_av::{InputKind, Workspace};
use m4bforge_common::Error;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Which upload endpoint is being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRoute {
    /// `/api/mp3-to-m4b`: MP3 only, file in `mp3_file`.
    Mp3Only,
    /// `/api/convert`: MP3 or M3U8, file in `mp3_file` or `source_file`.
    Any,
}

impl UploadRoute {
    fn file_fields(&self) -> &'static [&'static str] {
        match self {
            UploadRoute::Mp3Only => &["mp3_file"],
            UploadRoute::Any => &["mp3_file", "source_file"],
        }
    }

    pub fn missing_message(&self) -> &'static str {
        match self {
            UploadRoute::Mp3Only => "No MP3 file provided",
            UploadRoute::Any => "No source file provided",
        }
    }
}

/// A file stored in the workspace.
#[derive(Debug)]
pub struct Upload {
    pub path: PathBuf,
    pub original_name: String,
    pub kind: InputKind,
    pub size: u64,
}

/// The parsed form of an upload request.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<Upload>,
    /// JSON chapter list.
    pub chapters: Option<String>,
    /// Bitrate override such as "96k".
    pub audio_quality: Option<String>,
    /// Download file name override.
    pub output_name: Option<String>,
}

/// Read all multipart fields, storing the first file part in `workspace`.
pub async fn read_upload_form(
    mut multipart: Multipart,
    workspace: &Workspace,
    route: UploadRoute,
    limit_mb: u64,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit_mb))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if route.file_fields().contains(&name.as_str()) {
            if form.file.is_some() {
                tracing::debug!("Ignoring extra file field {}", name);
                continue;
            }

            let original_name = field.file_name().unwrap_or_default().to_string();
            if original_name.trim().is_empty() {
                return Err(Error::invalid_input("No file selected").into());
            }

            let kind = InputKind::detect(&original_name, field.content_type())?;
            if route == UploadRoute::Mp3Only && kind != InputKind::Mp3 {
                return Err(Error::Unsupported(format!(
                    "{original_name}. Only MP3 files are allowed."
                ))
                .into());
            }

            let path = workspace.input_file(kind);
            let mut file = tokio::fs::File::create(&path).await?;
            let mut size = 0u64;
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| multipart_error(e, limit_mb))?
            {
                size += chunk.len() as u64;
                file.write_all(&chunk).await?;
            }
            file.flush().await?;

            if size == 0 {
                return Err(Error::invalid_input("Uploaded file is empty").into());
            }

            tracing::debug!("Stored upload {} ({} bytes) at {:?}", original_name, size, path);
            form.file = Some(Upload {
                path,
                original_name,
                kind,
                size,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| multipart_error(e, limit_mb))?;
        match name.as_str() {
            "chapters" => form.chapters = Some(value),
            "audio_quality" => form.audio_quality = Some(value),
            "output_name" => form.output_name = Some(value),
            other => tracing::debug!("Ignoring form field {}", other),
        }
    }

    Ok(form)
}

fn multipart_error(e: MultipartError, limit_mb: u64) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge { limit_mb }.into()
    } else {
        Error::invalid_input(e.body_text()).into()
    }
}
