use crate::config::TelegramConfig;
use askama_escape::{escape, Html};
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("не найден токен Telegram: задайте '{0}' в окружении или telegram.bot_token в config")]
    MissingToken(String),
}

pub fn build_bot(cfg: &TelegramConfig) -> Result<Bot, TelegramError> {
    let token = resolve_bot_token(cfg)
        .ok_or_else(|| TelegramError::MissingToken(cfg.bot_token_env.clone()))?;
    Ok(Bot::new(token))
}

pub async fn send_fault_notice(bot: &Bot, cfg: &TelegramConfig, fault: &str) -> usize {
    let text = format_fault_notice(fault);
    let mut sent = 0_usize;

    for chat_id in &cfg.chat_ids {
        if let Err(err) = bot
            .send_message(ChatId(*chat_id), text.clone())
            .parse_mode(ParseMode::Html)
            .await
        {
            warn!(chat_id = *chat_id, error = %err, "не удалось отправить уведомление о сбое");
        } else {
            sent += 1;
        }
    }
    sent
}

pub fn format_fault_notice(fault: &str) -> String {
    format!(
        "⚠ <b>Adaptec report не сформирован</b>\nОтчёт не отправлен.\n<code>{}</code>",
        escape(fault, Html)
    )
}

fn resolve_bot_token(cfg: &TelegramConfig) -> Option<String> {
    if let Ok(v) = std::env::var(&cfg.bot_token_env) {
        if !v.trim().is_empty() {
            return Some(v);
        }
    }
    cfg.bot_token
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_text_is_escaped() {
        let text = format_fault_notice("сбой опроса <srv> & co");
        assert!(text.contains("&lt;srv&gt; &amp; co"));
        assert!(text.starts_with("⚠ <b>Adaptec report"));
    }

    #[test]
    fn token_falls_back_to_config() {
        let cfg = TelegramConfig {
            enabled: true,
            bot_token_env: "ADAPTEC_REPORT_TEST_TG_UNSET".to_string(),
            bot_token: Some("  123:abc ".to_string()),
            chat_ids: vec![1],
        };
        std::env::remove_var(&cfg.bot_token_env);
        assert_eq!(resolve_bot_token(&cfg).as_deref(), Some("123:abc"));
    }

    #[test]
    fn missing_token_is_an_error() {
        let cfg = TelegramConfig {
            enabled: true,
            bot_token_env: "ADAPTEC_REPORT_TEST_TG_MISSING".to_string(),
            bot_token: None,
            chat_ids: vec![1],
        };
        std::env::remove_var(&cfg.bot_token_env);
        assert!(matches!(build_bot(&cfg), Err(TelegramError::MissingToken(_))));
    }
}
