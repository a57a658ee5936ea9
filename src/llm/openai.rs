use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::analysis::error::ModelError;
use crate::analysis::metrics::SkinMetrics;
use crate::analysis::pipeline::ProfileProvider;
use crate::analysis::profile::{profile_json_schema, SkinProfile};
use crate::config::{Config, SKIN_ANALYSIS_SYSTEM_PROMPT};
use crate::llm::media::image_mime_type;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

const USER_INSTRUCTION: &str = "Analyze this face for skin profile.";
const ERROR_BODY_LOG_LIMIT: usize = 2000;

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

/// Pulls the provider's error message out of a failed response body.
fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .or_else(|| value.get("message"))
                .and_then(|v| v.as_str())
                .map(|v| v.to_string())
        })
        .unwrap_or_else(|| truncate_for_log(trimmed, ERROR_BODY_LOG_LIMIT))
}

pub fn image_data_url(image_bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        image_mime_type(image_bytes),
        general_purpose::STANDARD.encode(image_bytes)
    )
}

fn build_request_payload(
    model: &str,
    temperature: f32,
    image_bytes: &[u8],
    metrics: &SkinMetrics,
) -> Value {
    json!({
        "model": model,
        "temperature": temperature,
        "response_format": {
            "type": "json_schema",
            "json_schema": profile_json_schema()
        },
        "messages": [
            { "role": "system", "content": SKIN_ANALYSIS_SYSTEM_PROMPT },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": USER_INSTRUCTION },
                    { "type": "image_url", "image_url": { "url": image_data_url(image_bytes) } }
                ]
            },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": format!("Reference metrics: {}", json!(metrics)) }
                ]
            }
        ]
    })
}

fn extract_message_content(response: &Value) -> Option<&str> {
    response
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|content| !content.is_empty())
}

/// Some models wrap JSON output in a Markdown fence despite the response format.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &inner[4..],
        _ => inner,
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

pub fn parse_profile(content: &str) -> Result<SkinProfile, ModelError> {
    let value: Value =
        serde_json::from_str(strip_code_fence(content)).map_err(ModelError::MalformedJson)?;
    serde_json::from_value(value).map_err(ModelError::SchemaViolation)
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> ModelError {
    if err.is_timeout() {
        ModelError::Timeout(timeout)
    } else {
        ModelError::Transport(err)
    }
}

/// Vision model behind an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiProfileClient {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiProfileClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        OpenAiProfileClient {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            temperature,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.openai_model_vision.clone(),
            config.openai_temperature,
            config.model_timeout(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_chat_completions(&self, payload: &Value) -> Result<Value, ModelError> {
        debug!("Chat completion request: model={}", self.model);

        let response = get_http_client()
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|err| transport_error(err, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = summarize_error_body(&body);
            warn!(
                "Model API error: status={}, body={}",
                status,
                truncate_for_log(&body, ERROR_BODY_LOG_LIMIT)
            );
            return Err(ModelError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| transport_error(err, self.timeout))
    }
}

impl ProfileProvider for OpenAiProfileClient {
    async fn request_profile(
        &self,
        image_bytes: &[u8],
        metrics: &SkinMetrics,
    ) -> Result<SkinProfile, ModelError> {
        let payload = build_request_payload(&self.model, self.temperature, image_bytes, metrics);
        let metadata = json!({ "image_bytes": image_bytes.len() });

        log_llm_timing("openai", &self.model, "skin_profile", Some(metadata), || async {
            let response = self.call_chat_completions(&payload).await?;
            let Some(content) = extract_message_content(&response) else {
                warn!(
                    "Model response had no content: {}",
                    truncate_for_log(&response.to_string(), ERROR_BODY_LOG_LIMIT)
                );
                return Err(ModelError::EmptyResponse);
            };
            parse_profile(content).inspect_err(|err| {
                warn!(
                    "Unusable model output ({err}): {}",
                    truncate_for_log(content, ERROR_BODY_LOG_LIMIT)
                );
            })
        })
        .await
    }
}
