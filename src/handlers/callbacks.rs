use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{info, warn};
use url::Url;

use crate::config::{CONFIG, PRIVACY_DISCLAIMER};
use crate::handlers::messages;
use crate::handlers::report::ReportAction;
use crate::utils::telegram::escape_html;

fn link_line(label: &str, raw_url: Option<&str>) -> Option<String> {
    let raw_url = raw_url?;
    match Url::parse(raw_url) {
        Ok(url) => Some(format!(
            "• <a href=\"{}\">{}</a>",
            escape_html(url.as_str()),
            label
        )),
        Err(err) => {
            warn!("Ignoring invalid link {raw_url:?}: {err}");
            None
        }
    }
}

/// Terms and privacy links, or the plain disclaimer when neither is usable.
pub fn terms_text(terms_url: Option<&str>, privacy_url: Option<&str>) -> String {
    let lines: Vec<String> = [
        link_line(messages::TERMS_LINK_LABEL, terms_url),
        link_line(messages::PRIVACY_LINK_LABEL, privacy_url),
    ]
    .into_iter()
    .flatten()
    .collect();

    if lines.is_empty() {
        PRIVACY_DISCLAIMER.to_string()
    } else {
        lines.join("\n")
    }
}

pub async fn report_action_callback(bot: Bot, query: CallbackQuery) -> Result<()> {
    bot.answer_callback_query(query.id.clone()).await?;

    let Some(action) = query
        .data
        .as_deref()
        .and_then(ReportAction::from_callback_data)
    else {
        return Ok(());
    };
    let Some(message) = query.message.as_ref() else {
        return Ok(());
    };
    info!(
        "Report action {} from user {}",
        action.callback_data(),
        query.from.id
    );

    let text = match action {
        ReportAction::ShowTerms => {
            terms_text(CONFIG.terms_url.as_deref(), CONFIG.privacy_url.as_deref())
        }
        ReportAction::SaveProfile => messages::SAVE_PROFILE_NOTICE.to_string(),
        ReportAction::SetReminder => messages::REMINDER_NOTICE.to_string(),
    };

    bot.send_message(message.chat().id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_configured_links() {
        let text = terms_text(
            Some("https://example.com/terms"),
            Some("https://example.com/privacy?lang=ru&v=2"),
        );
        assert_eq!(
            text,
            "• <a href=\"https://example.com/terms\">Условия использования</a>\n\
             • <a href=\"https://example.com/privacy?lang=ru&amp;v=2\">Политика конфиденциальности</a>"
        );
    }

    #[test]
    fn falls_back_to_disclaimer() {
        assert_eq!(terms_text(None, None), PRIVACY_DISCLAIMER);
        assert_eq!(terms_text(Some("not a url"), None), PRIVACY_DISCLAIMER);
    }

    #[test]
    fn single_link_is_enough() {
        let text = terms_text(None, Some("https://example.com/privacy"));
        assert!(text.starts_with("• <a href=\"https://example.com/privacy\">"));
        assert!(!text.contains(messages::TERMS_LINK_LABEL));
    }
}
