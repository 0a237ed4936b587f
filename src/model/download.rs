//! Downloads for model weights and stored recordings.
//!
//! Storage buckets sometimes reject requests without a browser-like
//! User-Agent, so every request sends one.

use reqwest::blocking::Client;
use reqwest::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Errors that can occur while probing or downloading
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} for {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Failed to create directory: {0}")]
    Directory(String),

    #[error("Failed to write file: {0}")]
    Write(String),
}

/// Response metadata from a HEAD request
#[derive(Debug, Clone)]
pub struct UrlProbe {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

impl UrlProbe {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of a completed download
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub path: PathBuf,
    pub bytes: u64,
    pub content_type: Option<String>,
    pub elapsed: Duration,
}

impl DownloadReport {
    pub fn throughput_mb_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.bytes as f64 / 1_000_000.0 / secs
    }
}

fn client() -> Result<Client, DownloadError> {
    Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .map_err(|e| DownloadError::Network(e.to_string()))
}

/// HEAD the URL and report status and headers. Non-2xx statuses are returned
/// in the probe rather than as errors.
pub fn probe_url(url: &str) -> Result<UrlProbe, DownloadError> {
    let response = client()?
        .head(url)
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .map_err(|e| DownloadError::Network(e.to_string()))?;

    let header = |name: HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let probe = UrlProbe {
        url: url.to_string(),
        status: response.status().as_u16(),
        content_type: header(CONTENT_TYPE),
        content_length: header(CONTENT_LENGTH).and_then(|v| v.parse().ok()),
    };

    debug!("Probe {}: HTTP {}", url, probe.status);
    Ok(probe)
}

/// Download `url` to `dest_path` via a temporary file, timing the transfer
pub fn download_file(url: &str, dest_path: &Path) -> Result<DownloadReport, DownloadError> {
    info!("Downloading from {} to {:?}", url, dest_path);
    let start = Instant::now();

    if let Some(parent) = dest_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| DownloadError::Directory(e.to_string()))?;
        }
    }

    let response = client()?
        .get(url)
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .map_err(|e| DownloadError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(DownloadError::Http {
            status: status.as_u16(),
            url: url.to_string(),
            body: body.chars().take(200).collect(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response
        .bytes()
        .map_err(|e| DownloadError::Network(e.to_string()))?;

    persist(&bytes, dest_path)?;

    let report = DownloadReport {
        path: dest_path.to_path_buf(),
        bytes: bytes.len() as u64,
        content_type,
        elapsed: start.elapsed(),
    };

    info!(
        "Download complete: {:?} ({} bytes in {:.2?})",
        dest_path, report.bytes, report.elapsed
    );
    Ok(report)
}

/// Write `bytes` to a `.download` file next to `dest_path`, then rename it
/// into place. The temporary file is removed if either step fails.
fn persist(bytes: &[u8], dest_path: &Path) -> Result<(), DownloadError> {
    let temp_path = dest_path.with_extension("download");

    let written = File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.flush()
        })
        .and_then(|_| fs::rename(&temp_path, dest_path));

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&temp_path) {
            debug!("Could not remove {:?}: {}", temp_path, cleanup);
        }
        return Err(DownloadError::Write(e.to_string()));
    }
    Ok(())
}

/// Download the model to `dest_path` unless it is already there
pub fn ensure_model(url: &str, dest_path: &Path) -> Result<PathBuf, DownloadError> {
    if dest_path.exists() {
        debug!("Model already exists: {:?}", dest_path);
        return Ok(dest_path.to_path_buf());
    }

    info!("Model not found locally, downloading...");
    download_file(url, dest_path)?;
    Ok(dest_path.to_path_buf())
}
