use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use image::RgbImage;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::error::{AnalysisError, ModelError};
use crate::analysis::metrics::{compute_metrics, SkinMetrics};
use crate::analysis::profile::{AnalysisPayload, SkinProfile};
use crate::analysis::quality::{check_quality, QualityStats};
use crate::analysis::rules::RuleTable;

pub const ANONYMOUS_USER_ID: &str = "anon";

/// Source of structured skin profiles, normally a vision-language model.
pub trait ProfileProvider: Send + Sync {
    fn request_profile(
        &self,
        image_bytes: &[u8],
        metrics: &SkinMetrics,
    ) -> impl Future<Output = Result<SkinProfile, ModelError>> + Send;
}

pub fn decode_image(image_bytes: &[u8]) -> Result<RgbImage, image::ImageError> {
    Ok(image::load_from_memory(image_bytes)?.to_rgb8())
}

/// Decode, quality gate and metrics. CPU-bound; callers run it on the blocking pool.
fn inspect_image(image_bytes: &[u8]) -> Result<(QualityStats, SkinMetrics), AnalysisError> {
    let image = decode_image(image_bytes)?;
    let (width, height) = image.dimensions();

    let stats = match check_quality(&image) {
        Ok(stats) => stats,
        Err(err) => {
            info!("Rejected {}x{} upload: {}", width, height, err);
            return Err(err.into());
        }
    };
    debug!(
        "Quality gate passed: {}x{} mean_brightness={:.1} variance={:.1}",
        width, height, stats.mean_brightness, stats.variance
    );

    Ok((stats, compute_metrics(&image)))
}

fn normalize_user_id(user_id: &str) -> String {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        ANONYMOUS_USER_ID.to_string()
    } else {
        trimmed.to_string()
    }
}

pub struct SkinAnalyzer<P> {
    provider: P,
    rules: Arc<RuleTable>,
    model_timeout: Duration,
}

impl<P: ProfileProvider> SkinAnalyzer<P> {
    pub fn new(provider: P, rules: Arc<RuleTable>, model_timeout: Duration) -> Self {
        SkinAnalyzer {
            provider,
            rules,
            model_timeout,
        }
    }

    /// decode -> quality gate -> metrics -> model -> rule merge.
    pub async fn analyze(
        &self,
        image_bytes: &[u8],
        user_id: &str,
    ) -> Result<AnalysisPayload, AnalysisError> {
        let owned_bytes = image_bytes.to_vec();
        let (stats, metrics) =
            tokio::task::spawn_blocking(move || inspect_image(&owned_bytes)).await??;
        debug!(
            "Computed metrics at mean_brightness={:.1}: {:?}",
            stats.mean_brightness, metrics
        );

        let profile = match tokio::time::timeout(
            self.model_timeout,
            self.provider.request_profile(image_bytes, &metrics),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!("Model call exceeded {:?}", self.model_timeout);
                return Err(ModelError::Timeout(self.model_timeout).into());
            }
        };

        let id = Uuid::new_v4();
        let profile = self.rules.merge_rules(profile);
        info!(
            "Analysis {} complete: skin_type={} ingredients={} product_classes={}",
            id,
            profile.skin_type,
            profile.ingredients.len(),
            profile.product_classes.len()
        );

        Ok(AnalysisPayload {
            id,
            user_id: normalize_user_id(user_id),
            profile,
            metrics,
            image_url: None,
        })
    }
}
