use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{FileId, ParseMode, ReplyParameters};
use tracing::{error, info};

use crate::analysis::pipeline::ANONYMOUS_USER_ID;
use crate::analysis::AnalysisPayload;
use crate::config::CONFIG;
use crate::handlers::api_client::{request_analysis, AnalysisRequestError};
use crate::handlers::messages;
use crate::handlers::report::{build_report, main_actions_keyboard};
use crate::llm::media::download_media;
use crate::utils::telegram::{telegram_file_url, TypingIndicator};
use crate::utils::timing::RequestTimer;

pub async fn start_handler(bot: Bot, message: Message) -> Result<()> {
    bot.send_message(
        message.chat.id,
        format!("{}\n\n{}", messages::INTRO, messages::CONSENT_REMINDER),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

pub async fn fallback_handler(bot: Bot, message: Message) -> Result<()> {
    bot.send_message(message.chat.id, messages::ASK_FOR_PHOTO)
        .reply_parameters(ReplyParameters::new(message.id))
        .await?;
    Ok(())
}

async fn fetch_photo(bot: &Bot, file_id: &FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id.clone()).await?;
    download_media(&telegram_file_url(&CONFIG.bot_token, &file.path)).await
}

async fn analyze_photo(bot: &Bot, file_id: &FileId, user_id: &str) -> Result<AnalysisPayload> {
    let image_bytes = fetch_photo(bot, file_id).await?;
    info!("Downloaded photo for user {}: {} bytes", user_id, image_bytes.len());
    Ok(request_analysis(image_bytes, user_id).await?)
}

pub async fn photo_handler(bot: Bot, message: Message) -> Result<()> {
    // Telegram lists sizes smallest first.
    let Some(photo) = message.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let user_id = message
        .from
        .as_ref()
        .map(|user| user.id.0.to_string())
        .unwrap_or_else(|| ANONYMOUS_USER_ID.to_string());
    let mut timer = RequestTimer::start("bot_photo", &user_id, Some(chat_id.0));

    bot.send_message(chat_id, messages::PROCESSING)
        .reply_parameters(ReplyParameters::new(message.id))
        .await?;

    let typing = TypingIndicator::start(bot.clone(), chat_id);
    let result = analyze_photo(&bot, &photo.file.id, &user_id).await;
    drop(typing);

    let payload = match result {
        Ok(payload) => payload,
        Err(err) => {
            let bad_quality = matches!(
                err.downcast_ref::<AnalysisRequestError>(),
                Some(AnalysisRequestError::BadQuality)
            );
            if bad_quality {
                timer.complete("rejected", Some("bad_quality"));
                bot.send_message(chat_id, messages::BAD_QUALITY).await?;
            } else {
                error!("Photo analysis failed for user {user_id}: {err:#}");
                timer.complete("error", Some(&err.to_string()));
                bot.send_message(chat_id, messages::ERROR).await?;
            }
            return Ok(());
        }
    };

    bot.send_message(chat_id, build_report(&payload))
        .parse_mode(ParseMode::Html)
        .reply_markup(main_actions_keyboard())
        .await?;
    bot.send_message(chat_id, messages::SAVE_PROMPT).await?;

    timer.complete("success", None);
    Ok(())
}
