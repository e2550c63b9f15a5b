//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which starts the Axum router on a random port
//! with a [`FakeEncoder`] standing in for ffmpeg.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use m4bforge::config::Config;
use m4bforge::server::{create_router, AppContext};
use m4bforge_av::{ConversionSettings, EncodeJob, MediaEncoder, OutputFile, ToolInfo};
use m4bforge_common::{Error, Result};

/// Encoder that copies the input to the output with a marker prefix and
/// remembers every job it was given.
#[derive(Default)]
pub struct FakeEncoder {
    pub jobs: Mutex<Vec<EncodeJob>>,
    pub bitrates: Mutex<Vec<String>>,
    pub checks: AtomicUsize,
    pub fail_with: Option<String>,
    pub unavailable: bool,
}

impl FakeEncoder {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn last_job(&self) -> Option<EncodeJob> {
        self.jobs.lock().unwrap().last().cloned()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaEncoder for FakeEncoder {
    fn name(&self) -> &str {
        "fake"
    }

    fn check(&self) -> ToolInfo {
        self.checks.fetch_add(1, Ordering::SeqCst);
        ToolInfo {
            name: "fake".to_string(),
            available: !self.unavailable,
            version: (!self.unavailable).then(|| "fake 1.0".to_string()),
            path: None,
        }
    }

    async fn run(&self, job: &EncodeJob, settings: &ConversionSettings) -> Result<OutputFile> {
        self.jobs.lock().unwrap().push(job.clone());
        self.bitrates
            .lock()
            .unwrap()
            .push(job.effective_bitrate(settings).to_string());

        if let Some(message) = &self.fail_with {
            return Err(Error::tool("fake", message.clone()));
        }

        let input = tokio::fs::read(&job.input).await?;
        if let Some(parent) = job.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut body = b"FAKE:".to_vec();
        body.extend_from_slice(&input);
        tokio::fs::write(&job.output, &body).await?;

        Ok(OutputFile {
            path: job.output.clone(),
            content_type: job.kind.output_content_type(),
            size: body.len() as u64,
        })
    }
}

pub struct TestHarness {
    pub encoder: Arc<FakeEncoder>,
    pub addr: SocketAddr,
    _work_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Start a server with default configuration.
    pub async fn start() -> Self {
        Self::start_with(Config::default(), FakeEncoder::default()).await
    }

    /// Start a server with a custom config and encoder.
    pub async fn start_with(mut config: Config, encoder: FakeEncoder) -> Self {
        let work_dir = tempfile::tempdir().expect("failed to create work dir");
        config.server.work_dir = Some(work_dir.path().to_path_buf());

        let encoder = Arc::new(encoder);
        let dyn_encoder: Arc<dyn MediaEncoder> = encoder.clone();
        let app = create_router(AppContext::new(config, dyn_encoder));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            encoder,
            addr,
            _work_dir: work_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Number of request workspaces still on disk.
    pub fn leftover_workspaces(&self) -> usize {
        std::fs::read_dir(self._work_dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Wait for streamed responses to release their workspaces.
    ///
    /// The server drops a response body just after its last byte is written,
    /// so the client can finish reading slightly before cleanup runs.
    pub async fn wait_for_cleanup(&self) -> usize {
        for _ in 0..50 {
            if self.leftover_workspaces() == 0 {
                return 0;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.leftover_workspaces()
    }
}

/// Multipart file part with a name and MIME type.
pub fn file_part(name: &str, mime: &str, bytes: &[u8]) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes.to_vec())
        .file_name(name.to_string())
        .mime_str(mime)
        .expect("valid mime")
}

pub const SAMPLE_PLAYLIST: &str = "#EXTM3U\n#EXT-X-VERSION:3\n#EXTINF:10.0,Part 1\nseg1.ts\n#EXTINF:5.5,\nseg2.ts\n#EXT-X-ENDLIST\n";
