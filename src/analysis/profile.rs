use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::analysis::metrics::SkinMetrics;

pub const PROFILE_SCHEMA_NAME: &str = "skin_profile";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub morning: Vec<String>,
    pub evening: Vec<String>,
}

/// Structured, non-diagnostic profile returned by the vision model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkinProfile {
    pub age_band: String,
    pub skin_type: String,
    pub concerns: Vec<String>,
    pub routine: Routine,
    pub ingredients: Vec<String>,
    pub product_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Final result handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub id: Uuid,
    pub user_id: String,
    #[serde(flatten)]
    pub profile: SkinProfile,
    pub metrics: SkinMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn string_array() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

/// JSON Schema the model output is constrained to.
pub fn profile_json_schema() -> Value {
    json!({
        "name": PROFILE_SCHEMA_NAME,
        "schema": {
            "type": "object",
            "properties": {
                "age_band": { "type": "string" },
                "skin_type": { "type": "string" },
                "concerns": string_array(),
                "routine": {
                    "type": "object",
                    "properties": {
                        "morning": string_array(),
                        "evening": string_array()
                    },
                    "required": ["morning", "evening"]
                },
                "ingredients": string_array(),
                "product_classes": string_array(),
                "warning": { "type": "string" }
            },
            "required": [
                "age_band",
                "skin_type",
                "concerns",
                "routine",
                "ingredients",
                "product_classes"
            ]
        }
    })
}
