//! Telegram adapter (teloxide).
//!
//! This crate implements the `retg-core` MessagingSink over Telegram Bot API
//! and feeds Telegram updates into the core handler, either by long polling
//! or through a webhook.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{
        InlineQueryResult, InlineQueryResultArticle, InputMessageContent, InputMessageContentText,
    },
};

use std::time::Duration;

use tokio::time::sleep;

pub mod convert;
pub mod router;
pub mod webhook;

use retg_core::{
    domain::{ChatId, MessageId},
    errors::Error,
    messaging::port::MessagingSink,
    suggest::Suggestion,
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match retry_delay(&e, attempts) {
                    Some(after) => {
                        attempts += 1;
                        sleep(after).await;
                    }
                    None => return Err(Self::map_err(e)),
                },
            }
        }
    }
}

/// How long to wait before retrying a failed request, if at all.
///
/// Only flood-control errors are retried, and only once.
fn retry_delay(e: &teloxide::RequestError, attempts: usize) -> Option<Duration> {
    const MAX_RETRIES: usize = 1;
    match e {
        teloxide::RequestError::RetryAfter(after) if attempts < MAX_RETRIES => Some(*after),
        _ => None,
    }
}

/// Inline article for one suggestion.
///
/// Result ids are capped at 64 bytes by Telegram, so the position is used
/// instead of the suggestion text.
pub fn suggestion_article(position: usize, suggestion: &Suggestion) -> InlineQueryResult {
    let content = InputMessageContent::Text(InputMessageContentText::new(
        suggestion.insert_text.clone(),
    ));
    InlineQueryResult::Article(
        InlineQueryResultArticle::new(
            position.to_string(),
            suggestion.matched_alias_token.clone(),
            content,
        )
        .description(suggestion.display.clone()),
    )
}

#[async_trait]
impl MessagingSink for TelegramMessenger {
    async fn send_notice(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.with_retry(|| self.bot.send_message(Self::tg_chat(chat_id), text.to_string()))
            .await?;
        Ok(())
    }

    async fn send_forward(&self, to: ChatId, from: ChatId, message_id: MessageId) -> Result<()> {
        self.with_retry(|| {
            self.bot.forward_message(
                Self::tg_chat(to),
                Self::tg_chat(from),
                Self::tg_msg_id(message_id),
            )
        })
        .await?;
        Ok(())
    }

    async fn send_reply(&self, chat_id: ChatId, in_reply_to: MessageId, text: &str) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .send_message(Self::tg_chat(chat_id), text.to_string())
                .reply_to_message_id(Self::tg_msg_id(in_reply_to))
        })
        .await?;
        Ok(())
    }

    async fn answer_suggestions(&self, query_id: &str, suggestions: &[Suggestion]) -> Result<()> {
        let results: Vec<InlineQueryResult> = suggestions
            .iter()
            .enumerate()
            .map(|(i, s)| suggestion_article(i, s))
            .collect();

        self.with_retry(|| {
            self.bot
                .answer_inline_query(query_id.to_string(), results.clone())
        })
        .await?;
        Ok(())
    }
}
