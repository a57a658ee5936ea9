use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::StatusCode;
use tracing::warn;

use crate::utils::http::get_http_client;

pub const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

const DOWNLOAD_MAX_ATTEMPTS: u32 = 3;
const DOWNLOAD_BASE_DELAY_MS: u64 = 400;
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Sniffs an image MIME type from magic bytes, defaulting to JPEG.
pub fn image_mime_type(data: &[u8]) -> &'static str {
    match infer::get(data) {
        Some(kind) if kind.mime_type().starts_with("image/") => kind.mime_type(),
        _ => FALLBACK_IMAGE_MIME,
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

/// Downloads a file, retrying transient failures with exponential backoff.
pub async fn download_media(url: &str) -> Result<Vec<u8>> {
    let client = get_http_client();
    let mut attempt = 0;
    loop {
        attempt += 1;
        match client.get(url).timeout(DOWNLOAD_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => {
                return Ok(response.bytes().await?.to_vec());
            }
            Ok(response) => {
                let status = response.status();
                warn!("Media download failed with status {status} (attempt {attempt}/{DOWNLOAD_MAX_ATTEMPTS})");
                if !is_retryable_status(status) || attempt == DOWNLOAD_MAX_ATTEMPTS {
                    return Err(anyhow!("media download failed with status {status}"));
                }
            }
            Err(err) => {
                warn!(
                    "Media download error: {err} (timeout={}, connect={}, attempt {attempt}/{DOWNLOAD_MAX_ATTEMPTS})",
                    err.is_timeout(),
                    err.is_connect()
                );
                if !(err.is_timeout() || err.is_connect()) || attempt == DOWNLOAD_MAX_ATTEMPTS {
                    return Err(err.into());
                }
            }
        }

        let delay = Duration::from_millis(DOWNLOAD_BASE_DELAY_MS << (attempt - 1));
        tokio::time::sleep(delay).await;
    }
}
