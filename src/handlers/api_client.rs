use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::warn;

use crate::analysis::AnalysisPayload;
use crate::config::CONFIG;
use crate::llm::media::image_mime_type;
use crate::utils::http::get_http_client;

const UPLOAD_FILE_NAME: &str = "face.jpg";

#[derive(Debug, Error)]
pub enum AnalysisRequestError {
    #[error("analysis API rejected the photo quality")]
    BadQuality,
    #[error("analysis API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("analysis API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

fn analyze_url(api_base_url: &str) -> String {
    format!("{}/analyze", api_base_url.trim_end_matches('/'))
}

/// Sends a photo to the analysis API and returns the enriched profile.
pub async fn request_analysis(
    image_bytes: Vec<u8>,
    user_id: &str,
) -> Result<AnalysisPayload, AnalysisRequestError> {
    let mime = image_mime_type(&image_bytes);
    let file = Part::bytes(image_bytes)
        .file_name(UPLOAD_FILE_NAME)
        .mime_str(mime)?;
    let form = Form::new()
        .part("file", file)
        .text("user_id", user_id.to_string());

    let response = get_http_client()
        .post(analyze_url(&CONFIG.api_base_url))
        .timeout(CONFIG.analysis_request_timeout())
        .multipart(form)
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        return Err(AnalysisRequestError::BadQuality);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("Analysis API error: status={status}, body={body}");
        return Err(AnalysisRequestError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json::<AnalysisPayload>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_url_avoids_double_slash() {
        assert_eq!(analyze_url("http://api:8000"), "http://api:8000/analyze");
        assert_eq!(analyze_url("http://api:8000/"), "http://api:8000/analyze");
    }
}
