use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId},
    suggest::Suggestion,
    Result,
};

/// Outbound side of the messenger.
///
/// Telegram is the only implementation; the core only ever talks to this trait.
#[async_trait]
pub trait MessagingSink: Send + Sync {
    async fn send_notice(&self, chat_id: ChatId, text: &str) -> Result<()>;

    async fn send_forward(&self, to: ChatId, from: ChatId, message_id: MessageId) -> Result<()>;

    async fn send_reply(&self, chat_id: ChatId, in_reply_to: MessageId, text: &str) -> Result<()>;

    async fn answer_suggestions(&self, query_id: &str, suggestions: &[Suggestion]) -> Result<()>;
}
