use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityIssue {
    TooDark,
    TooFlat,
}

impl QualityIssue {
    pub fn as_str(self) -> &'static str {
        match self {
            QualityIssue::TooDark => "too_dark",
            QualityIssue::TooFlat => "too_flat",
        }
    }
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised by the quality gate when a frame is too dark or too flat to analyse.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("image rejected by quality gate ({issue}): mean_brightness={mean_brightness:.1} variance={variance:.1}")]
pub struct QualityError {
    pub issue: QualityIssue,
    pub mean_brightness: f64,
    pub variance: f64,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
    #[error("model request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("model output is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
    #[error("model output does not match the skin profile schema: {0}")]
    SchemaViolation(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("uploaded bytes are not a decodable image: {0}")]
    InvalidImage(#[from] image::ImageError),
    #[error(transparent)]
    Quality(#[from] QualityError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("image analysis task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl AnalysisError {
    pub fn is_quality(&self) -> bool {
        matches!(self, AnalysisError::Quality(_))
    }
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read product rules at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse product rules at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
