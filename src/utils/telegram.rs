use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tokio::task::JoinHandle;
use tracing::warn;

const TYPING_REFRESH_INTERVAL: Duration = Duration::from_secs(4);

/// Re-sends "typing" until dropped; Telegram clears the action after ~5s.
pub struct TypingIndicator {
    task: Option<JoinHandle<()>>,
}

impl TypingIndicator {
    pub fn start(bot: Bot, chat_id: ChatId) -> Self {
        let task = tokio::spawn(async move {
            loop {
                if let Err(err) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
                    warn!("send_chat_action failed: {err}");
                }
                tokio::time::sleep(TYPING_REFRESH_INTERVAL).await;
            }
        });
        TypingIndicator { task: Some(task) }
    }
}

impl Drop for TypingIndicator {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn telegram_file_url(bot_token: &str, file_path: &str) -> String {
    format!("https://api.telegram.org/file/bot{bot_token}/{file_path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html_special_characters() {
        assert_eq!(
            escape_html(r#"<b>"SPF" & more</b>"#),
            "&lt;b&gt;&quot;SPF&quot; &amp; more&lt;/b&gt;"
        );
        assert_eq!(escape_html("ниацинамид"), "ниацинамид");
    }

    #[test]
    fn builds_file_download_url() {
        assert_eq!(
            telegram_file_url("123:abc", "photos/file_1.jpg"),
            "https://api.telegram.org/file/bot123:abc/photos/file_1.jpg"
        );
    }
}
