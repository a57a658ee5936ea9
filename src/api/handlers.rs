use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::warn;

use crate::analysis::pipeline::ANONYMOUS_USER_ID;
use crate::analysis::{AnalysisPayload, ProfileProvider};
use crate::api::error::ApiError;
use crate::api::ApiState;
use crate::llm::media::image_mime_type;
use crate::utils::timing::RequestTimer;

struct AnalyzeForm {
    image: Bytes,
    user_id: String,
}

async fn read_analyze_form(
    multipart: &mut Multipart,
    max_upload_bytes: usize,
) -> Result<AnalyzeForm, ApiError> {
    let mut image: Option<Bytes> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {e}")))?;

                if data.len() > max_upload_bytes {
                    return Err(ApiError::BadRequest(format!(
                        "File too large. Max size is {max_upload_bytes} bytes"
                    )));
                }

                image = Some(data);
            }
            "user_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read user_id: {e}")))?;
                user_id = Some(value);
            }
            _ => {}
        }
    }

    let image = image
        .filter(|data| !data.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing file field".to_string()))?;

    Ok(AnalyzeForm {
        image,
        user_id: user_id.unwrap_or_else(|| ANONYMOUS_USER_ID.to_string()),
    })
}

pub async fn analyze<P: ProfileProvider + 'static>(
    State(state): State<ApiState<P>>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisPayload>, ApiError> {
    let form = read_analyze_form(&mut multipart, state.max_upload_bytes).await?;
    let mut timer = RequestTimer::start("api_analyze", &form.user_id, None);

    let mut payload = match state.analyzer.analyze(&form.image, &form.user_id).await {
        Ok(payload) => payload,
        Err(err) => {
            let status = if err.is_quality() { "rejected" } else { "error" };
            timer.complete(status, Some(&err.to_string()));
            return Err(err.into());
        }
    };

    if let Some(storage) = &state.storage {
        let content_type = image_mime_type(&form.image);
        match storage
            .upload_image(form.image.clone(), &payload.user_id, content_type)
            .await
        {
            Ok(url) => payload.image_url = Some(url),
            Err(err) => warn!("Storing image for analysis {} failed: {err}", payload.id),
        }
    }

    timer.complete("success", None);
    Ok(Json(payload))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}
