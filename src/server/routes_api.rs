use crate::conversion::{self, output_file_name};
use crate::server::error::AppError;
use crate::server::upload::{read_upload_form, UploadRoute};
use crate::server::AppContext;
use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use m4bforge_av::{EncodeJob, Workspace};
use m4bforge_common::{parse_chapters_json, Error};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/mp3-to-m4b", post(mp3_to_m4b))
        .route("/convert", post(convert))
}

async fn health(State(ctx): State<AppContext>) -> impl IntoResponse {
    let info = ctx.encoder_info().await;

    if info.available {
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "ffmpeg": true,
            "ffmpeg_version": info.version,
        }))
    } else {
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "ffmpeg": false,
            "error": "FFmpeg is not available",
        }))
    }
}

async fn mp3_to_m4b(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    convert_upload(ctx, multipart, UploadRoute::Mp3Only).await
}

async fn convert(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    convert_upload(ctx, multipart, UploadRoute::Any).await
}

async fn convert_upload(
    ctx: AppContext,
    multipart: Result<Multipart, MultipartRejection>,
    route: UploadRoute,
) -> Result<Response, AppError> {
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!("Rejected non-multipart upload: {}", rejection.body_text());
        Error::invalid_input(route.missing_message())
    })?;

    let workspace = ctx.new_workspace()?;
    let limit_mb = ctx.config.server.max_upload_mb;
    let form = read_upload_form(multipart, &workspace, route, limit_mb).await?;

    let upload = form
        .file
        .ok_or_else(|| Error::invalid_input(route.missing_message()))?;

    let chapters = match form.chapters.as_deref().map(str::trim) {
        Some(json) if !json.is_empty() => parse_chapters_json(json)?,
        _ => Vec::new(),
    };

    let file_name = output_file_name(&upload.original_name, form.output_name.as_deref(), upload.kind);

    tracing::info!(
        "Converting upload {} ({}, {} bytes, {} chapters) to {}",
        upload.original_name,
        upload.kind,
        upload.size,
        chapters.len(),
        file_name
    );

    let job = EncodeJob::new(&upload.path, workspace.output_file(&file_name), upload.kind)
        .with_chapters(chapters)
        .with_bitrate(form.audio_quality);

    let produced = conversion::convert(ctx.encoder.as_ref(), &ctx.config.conversion, &job).await?;
    let file = File::open(&produced.path).await?;
    let body = Body::from_stream(WorkspaceFile {
        inner: ReaderStream::new(file),
        _workspace: workspace,
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, produced.content_type)
        .header(header::CONTENT_LENGTH, produced.size.to_string())
        .header(header::CONTENT_DISPOSITION, content_disposition(&file_name))
        .body(body)
        .map_err(|e| Error::Internal(format!("failed to build response: {e}")).into())
}

/// Streams a converted file. The workspace holding it is removed once the
/// body has been sent or the client goes away.
struct WorkspaceFile {
    inner: ReaderStream<File>,
    _workspace: Workspace,
}

impl Stream for WorkspaceFile {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987
/// `filename*` for names outside ASCII.
fn content_disposition(file_name: &str) -> String {
    if file_name.is_ascii() {
        return format!("attachment; filename=\"{file_name}\"");
    }

    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    let encoded: String = file_name
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
