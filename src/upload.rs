//! UploadClient - submits captured frames to the recognition server.

use std::time::Duration;

use reqwest::multipart::{Form, Part};

use crate::verdict::{UploadReply, Verdict};

/// The environment variable that overrides the server base URL.
pub const SERVER_URL_ENV: &str = "PLATE_SERVER_URL";

/// Default base URL for the recognition server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Route that receives captured images.
pub const UPLOAD_PATH: &str = "/upload";

/// Multipart form field carrying the image bytes.
pub const FORM_FIELD: &str = "image";

/// Filename attached to every uploaded capture.
pub const CAPTURE_FILENAME: &str = "capture.jpg";

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while uploading a capture.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed reply from server: {0}")]
    MalformedReply(String),
}

/// Client for the recognition server's upload endpoint.
pub struct UploadClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl UploadClient {
    /// Create a client with an explicit base URL.
    ///
    /// URL resolution (environment override, config file, default)
    /// happens in the config layer; this takes the resolved value.
    pub fn with_base_url(base_url: String) -> Result<Self, UploadError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload one JPEG capture and parse the server's verdict.
    ///
    /// The image travels as a multipart form with a single part named
    /// `image`, filename `capture.jpg`. The reply body is parsed as
    /// verdict JSON regardless of HTTP status: the server reports
    /// application errors as JSON with a 4xx status, and those must
    /// surface verbatim rather than as a generic failure.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Http` when the request itself fails or the
    /// body is not JSON, and `UploadError::MalformedReply` when the
    /// JSON carries neither an error nor a recognition result.
    pub async fn upload_capture(&self, jpeg: Vec<u8>) -> Result<Verdict, UploadError> {
        let url = format!("{}{}", self.base_url, UPLOAD_PATH);

        let part = Part::bytes(jpeg)
            .file_name(CAPTURE_FILENAME)
            .mime_str("image/jpeg")?;
        let form = Form::new().part(FORM_FIELD, part);

        log::info!("Uploading capture to {}", url);
        let response = self.http_client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Upload endpoint returned status {}", status);
        }

        let reply: UploadReply = response.json().await?;
        reply.into_verdict().ok_or_else(|| {
            UploadError::MalformedReply(
                "reply has neither an error nor a number/status pair".to_string(),
            )
        })
    }
}
