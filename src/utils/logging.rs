use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use once_cell::sync::Lazy;

use crate::config::{log_level_from_env, CONFIG};

pub const TIMING_TARGET: &str = "skin.timing";

const LOGS_DIR: &str = "logs";

/// Keeps the non-blocking writers flushing until dropped at shutdown.
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

fn parse_log_level(value: &str) -> LevelFilter {
    match value.trim().to_lowercase().as_str() {
        "warning" => LevelFilter::WARN,
        other => other.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO),
    }
}

fn daily_writer(dir: &Path, file_name: &str, guards: &mut Vec<WorkerGuard>) -> NonBlocking {
    let appender = tracing_appender::rolling::daily(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    guards.push(guard);
    writer
}

pub fn init_logging() -> LoggingGuards {
    let logs_dir = Path::new(LOGS_DIR);
    if let Err(err) = fs::create_dir_all(logs_dir) {
        eprintln!("Failed to create logs directory: {err}");
    }

    let mut guards = Vec::with_capacity(4);
    let text_writer = daily_writer(logs_dir, "skin.log", &mut guards);
    let json_writer = daily_writer(logs_dir, "skin.jsonl", &mut guards);
    let timing_writer = daily_writer(logs_dir, "timing.log", &mut guards);
    let json_timing_writer = daily_writer(logs_dir, "timing.jsonl", &mut guards);

    let general_filter = Targets::new()
        .with_default(parse_log_level(&log_level_from_env()))
        .with_target(TIMING_TARGET, LevelFilter::OFF)
        .with_target("hyper", LevelFilter::WARN)
        .with_target("hyper_util", LevelFilter::WARN)
        .with_target("reqwest", LevelFilter::WARN)
        .with_target("aws_config", LevelFilter::WARN)
        .with_target("aws_smithy_runtime", LevelFilter::WARN)
        .with_target("aws_sdk_s3", LevelFilter::WARN);
    let timing_filter = Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target(TIMING_TARGET, LevelFilter::INFO);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(general_filter.clone()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(text_writer)
                .with_ansi(false)
                .with_filter(general_filter.clone()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(json_writer)
                .with_filter(general_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(timing_writer)
                .with_ansi(false)
                .with_filter(timing_filter.clone()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(json_timing_writer)
                .with_filter(timing_filter),
        )
        .init();

    // Built only now so warnings about bad settings reach the subscriber.
    Lazy::force(&CONFIG);

    LoggingGuards { _guards: guards }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_with_info_fallback() {
        assert_eq!(parse_log_level("DEBUG"), LevelFilter::DEBUG);
        assert_eq!(parse_log_level("warning"), LevelFilter::WARN);
        assert_eq!(parse_log_level("off"), LevelFilter::OFF);
        assert_eq!(parse_log_level("verbose"), LevelFilter::INFO);
    }
}
