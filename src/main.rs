use std::error::Error;
use std::sync::Arc;

use anyhow::anyhow;
use dotenvy::dotenv;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

mod analysis;
mod api;
mod config;
mod handlers;
mod llm;
mod storage;
mod utils;

use analysis::{RuleTable, SkinAnalyzer};
use api::ApiState;
use config::CONFIG;
use handlers::{callbacks, commands};
use llm::OpenAiProfileClient;
use storage::ObjectStorage;
use utils::logging::init_logging;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    Start,
}

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Bot,
    Api,
}

fn usage() -> &'static str {
    "Usage: skin_profile_bot [api]\n  (no args)  run the Telegram bot\n  api        run the analysis HTTP API"
}

/// `None` means usage was requested.
fn parse_run_mode(args: &[String]) -> anyhow::Result<Option<RunMode>> {
    match args.get(1).map(|value| value.as_str()) {
        None => Ok(Some(RunMode::Bot)),
        Some("bot") => Ok(Some(RunMode::Bot)),
        Some("api") => Ok(Some(RunMode::Api)),
        Some("--help") | Some("-h") => Ok(None),
        Some(other) => Err(anyhow!("Unknown argument: {other}\n{}", usage())),
    }
}

#[tokio::main]
async fn main() -> HandlerResult {
    dotenv().ok();
    let _guards = init_logging();

    let args: Vec<String> = std::env::args().collect();
    let Some(mode) = parse_run_mode(&args)? else {
        println!("{}", usage());
        return Ok(());
    };

    match mode {
        RunMode::Api => run_api().await?,
        RunMode::Bot => run_bot().await?,
    }
    Ok(())
}

async fn run_api() -> anyhow::Result<()> {
    CONFIG.validate_for_api()?;

    let rules = RuleTable::load(&CONFIG.product_rules_path)?;
    if rules.is_empty() {
        warn!("Product rule table is empty; model suggestions are returned as-is");
    }
    let provider = OpenAiProfileClient::from_config(&CONFIG);
    info!(
        "Starting skin analysis API: model={} rules={} timeout={:?}",
        provider.model(),
        rules.len(),
        CONFIG.model_timeout()
    );

    let analyzer = SkinAnalyzer::new(provider, Arc::new(rules), CONFIG.model_timeout());
    let storage = CONFIG.storage.as_ref().map(ObjectStorage::new);
    if storage.is_none() {
        info!("Object storage not configured; uploads are not persisted");
    }

    let state = ApiState {
        analyzer: Arc::new(analyzer),
        storage,
        max_upload_bytes: CONFIG.max_upload_bytes,
    };
    api::serve(&CONFIG.api_bind_addr, api::router(state)).await
}

async fn run_bot() -> anyhow::Result<()> {
    CONFIG.validate_for_bot()?;

    let bot = Bot::new(CONFIG.bot_token.clone());
    info!("Starting skin profile bot, API at {}", CONFIG.api_base_url);

    let command_handler = dptree::entry()
        .filter_command::<Command>()
        .endpoint(handle_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::filter(|msg: Message| msg.photo().is_some()).endpoint(handle_photo))
        .endpoint(handle_other_message);

    let callback_handler = Update::filter_callback_query().endpoint(handle_callback_query);

    let handler = dptree::entry()
        .branch(message_handler)
        .branch(callback_handler);

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(bot: Bot, message: Message, command: Command) -> HandlerResult {
    match command {
        Command::Start => commands::start_handler(bot, message).await?,
    }
    Ok(())
}

async fn handle_photo(bot: Bot, message: Message) -> HandlerResult {
    tokio::spawn(async move {
        if let Err(err) = commands::photo_handler(bot, message).await {
            error!("photo handler failed: {err}");
        }
    });
    Ok(())
}

async fn handle_other_message(bot: Bot, message: Message) -> HandlerResult {
    commands::fallback_handler(bot, message).await?;
    Ok(())
}

async fn handle_callback_query(bot: Bot, query: CallbackQuery) -> HandlerResult {
    callbacks::report_action_callback(bot, query).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn run_mode_defaults_to_bot() {
        assert_eq!(parse_run_mode(&args(&["bin"])).unwrap(), Some(RunMode::Bot));
        assert_eq!(parse_run_mode(&args(&["bin", "api"])).unwrap(), Some(RunMode::Api));
        assert_eq!(parse_run_mode(&args(&["bin", "--help"])).unwrap(), None);
        assert!(parse_run_mode(&args(&["bin", "serve"])).is_err());
    }
}
