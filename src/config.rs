use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub bucket: String,
    pub endpoint_url: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub public_base_url: Option<String>,
    pub use_path_style: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_bind_addr: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model_vision: String,
    pub openai_temperature: f32,
    pub model_timeout_seconds: u64,
    pub product_rules_path: PathBuf,
    pub max_upload_bytes: usize,
    pub storage: Option<StorageSettings>,
    pub bot_token: String,
    pub api_base_url: String,
    pub terms_url: Option<String>,
    pub privacy_url: Option<String>,
    pub analysis_request_timeout_seconds: u64,
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_env_value<T>(name: &str, raw: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
{
    raw.trim().parse::<T>().unwrap_or_else(|_| {
        warn!("Invalid {name} value '{raw}'; using {default}.");
        default
    })
}

fn env_u64(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(value) => parse_env_value(name, &value, default),
        Err(_) => default,
    }
}

fn env_f32(name: &str, default: f32) -> f32 {
    match env::var(name) {
        Ok(value) => parse_env_value(name, &value, default),
        Err(_) => default,
    }
}

/// Read on its own so logging can start before `CONFIG` is built.
pub fn log_level_from_env() -> String {
    env_string("LOG_LEVEL", "info").trim().to_lowercase()
}

fn load_storage_settings() -> Option<StorageSettings> {
    let bucket = env_optional("STORAGE_BUCKET")?;
    Some(StorageSettings {
        bucket,
        endpoint_url: env_optional("STORAGE_ENDPOINT_URL"),
        access_key: env_string("STORAGE_ACCESS_KEY", ""),
        secret_key: env_string("STORAGE_SECRET_KEY", ""),
        region: env_optional("STORAGE_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        public_base_url: env_optional("STORAGE_PUBLIC_BASE_URL"),
        use_path_style: env_bool("STORAGE_PATH_STYLE", true),
    })
}

impl Config {
    pub fn load() -> Self {
        Config {
            api_bind_addr: env_string("API_BIND_ADDR", "0.0.0.0:8000"),
            openai_api_key: env_string("OPENAI_API_KEY", ""),
            openai_base_url: env_string("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model_vision: env_string("OPENAI_MODEL_VISION", "gpt-4o-mini"),
            openai_temperature: env_f32("OPENAI_TEMPERATURE", 0.2),
            model_timeout_seconds: env_u64("MODEL_TIMEOUT_SECONDS", 60).max(1),
            product_rules_path: PathBuf::from(env_string(
                "PRODUCT_RULES_PATH",
                "rules/product_rules.json",
            )),
            max_upload_bytes: env_u64("MAX_UPLOAD_BYTES", 10 * 1024 * 1024) as usize,
            storage: load_storage_settings(),
            bot_token: env_string("BOT_TOKEN", ""),
            api_base_url: env_string("API_BASE_URL", "")
                .trim()
                .trim_end_matches('/')
                .to_string(),
            terms_url: env_optional("TERMS_URL"),
            privacy_url: env_optional("PRIVACY_URL"),
            analysis_request_timeout_seconds: env_u64("ANALYSIS_REQUEST_TIMEOUT_SECONDS", 120)
                .max(1),
        }
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_seconds)
    }

    pub fn analysis_request_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_request_timeout_seconds)
    }

    pub fn validate_for_api(&self) -> Result<()> {
        if self.openai_api_key.trim().is_empty() {
            return Err(anyhow!("OPENAI_API_KEY is required to run the analysis API"));
        }
        if let Some(storage) = &self.storage {
            if storage.access_key.is_empty() || storage.secret_key.is_empty() {
                return Err(anyhow!(
                    "STORAGE_ACCESS_KEY and STORAGE_SECRET_KEY are required when STORAGE_BUCKET is set"
                ));
            }
        }
        Ok(())
    }

    pub fn validate_for_bot(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            return Err(anyhow!("BOT_TOKEN is required to run the bot"));
        }
        if self.api_base_url.is_empty() {
            return Err(anyhow!("API_BASE_URL is required to run the bot"));
        }
        Ok(())
    }
}

pub const SKIN_ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a careful, non-diagnostic skin analysis assistant. You analyze a selfie to infer approximate skin characteristics and non-medical concerns. You never give medical diagnoses. You return JSON strictly following the schema. If the image is poor (low light, makeup, filters, heavy occlusion), ask for a better photo.

Guidelines:
- Skin type: normal / oily / dry / combination / sensitive (proxy)
- Concerns: pigmentation spots, acne/blemishes, redness, uneven texture, dehydration, enlarged pores (proxy), fine lines.
- Age band: one of ["<20", "20-29", "30-39", "40-49", "50+"] (approximation only)
- Routine: ingredients + steps for morning and evening; always include SPF for morning unless contraindicated.
- Avoid brand names. Suggest product classes only (gel cleanser, non-comedogenic moisturizer, broad-spectrum SPF 50, etc.)
- Flag if a dermatologist visit is advisable (persistent or severe issues) without diagnosing."#;

pub const PRIVACY_DISCLAIMER: &str = "Отправляя фото, ты подтверждаешь, что тебе 16+ и даёшь согласие на обработку изображения для анализа. Мы не храним фото без явного согласия.";
