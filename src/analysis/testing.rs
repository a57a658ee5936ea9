//! Fakes and fixtures shared by the pipeline and API tests.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::{ImageFormat, Rgb, RgbImage};

use crate::analysis::error::ModelError;
use crate::analysis::metrics::SkinMetrics;
use crate::analysis::pipeline::ProfileProvider;
use crate::analysis::profile::{Routine, SkinProfile};
use crate::analysis::rules::{ProductRule, RuleTable};

pub struct StaticProvider {
    profile: SkinProfile,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn returning(profile: SkinProfile) -> Self {
        StaticProvider {
            profile,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProfileProvider for StaticProvider {
    async fn request_profile(
        &self,
        _image_bytes: &[u8],
        _metrics: &SkinMetrics,
    ) -> Result<SkinProfile, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.profile.clone())
    }
}

/// Always answers with prose instead of JSON.
pub struct ChattyProvider;

impl ProfileProvider for ChattyProvider {
    async fn request_profile(
        &self,
        _image_bytes: &[u8],
        _metrics: &SkinMetrics,
    ) -> Result<SkinProfile, ModelError> {
        let err = serde_json::from_str::<serde_json::Value>("Sure! Here is your profile").unwrap_err();
        Err(ModelError::MalformedJson(err))
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn model_profile(skin_type: &str) -> SkinProfile {
    SkinProfile {
        age_band: "20-29".to_string(),
        skin_type: skin_type.to_string(),
        concerns: strings(&["enlarged pores"]),
        routine: Routine {
            morning: strings(&["gel cleanser", "SPF 50"]),
            evening: strings(&["gentle cleanser"]),
        },
        ingredients: strings(&["salicylic acid"]),
        product_classes: strings(&["gel cleanser"]),
        warning: None,
    }
}

pub fn oily_rules() -> Arc<RuleTable> {
    Arc::new(RuleTable::from_rules([(
        "oily",
        ProductRule {
            ingredients: strings(&["niacinamide"]),
            product_classes: strings(&["oil-free moisturizer"]),
        },
    )]))
}

pub fn png_bytes(image: &RgbImage) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("encode test image");
    cursor.into_inner()
}

pub fn black_photo() -> Vec<u8> {
    png_bytes(&RgbImage::new(100, 100))
}

/// Skin-toned checkerboard: mean luma 122.5, variance 2256.25.
pub fn well_lit_photo() -> Vec<u8> {
    let image = RgbImage::from_fn(48, 48, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([200, 160, 140])
        } else {
            Rgb([90, 70, 60])
        }
    });
    png_bytes(&image)
}
