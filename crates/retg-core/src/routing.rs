//! Turns incoming updates into outbound actions.
//!
//! Everything here is a pure function of the chat tree and the update; the
//! actions are executed afterwards by [`crate::handler::Handler`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    domain::ChatId,
    errors::Error,
    messaging::types::{Command, IncomingUpdate, OutboundAction, TextMessage},
    suggest::suggest,
    tags::{any_tagged, tag_list},
    tree::ChatTree,
    Result,
};

const HELP_COMMAND: &str = "help";

/// Routing engine bound to one chat tree and the bot's own handle.
#[derive(Clone, Debug)]
pub struct Engine {
    tree: Arc<ChatTree>,
    bot_username: String,
}

impl Engine {
    /// `bot_username` is the handle without the leading `@`.
    pub fn new(tree: Arc<ChatTree>, bot_username: impl Into<String>) -> Self {
        Self {
            tree,
            bot_username: bot_username.into(),
        }
    }

    /// Actions for one update, in dispatch order.
    pub fn plan(&self, update: &IncomingUpdate) -> Result<Vec<OutboundAction>> {
        match update {
            IncomingUpdate::InlineQuery(q) => Ok(vec![OutboundAction::AnswerSuggestions {
                query_id: q.query_id.clone(),
                suggestions: suggest(&self.tree, &q.query),
            }]),
            IncomingUpdate::Command(cmd) => Ok(self.help_reply(cmd).into_iter().collect()),
            IncomingUpdate::Message(msg) => {
                let mut actions: Vec<OutboundAction> = self.mention_reply(msg).into_iter().collect();
                actions.extend(self.route(msg));
                Ok(actions)
            }
            IncomingUpdate::Unsupported { kind } => Err(Error::UnrecognizedUpdate(kind.clone())),
        }
    }

    /// Relay `msg` to every chat whose aliases it tags.
    ///
    /// Each destination gets a notice, then the replied-to message (if any),
    /// then the message itself. The source chat is a valid destination.
    pub fn route(&self, msg: &TextMessage) -> Vec<OutboundAction> {
        let chats = self.tree.all_chats();
        if !chats.iter().any(|chat| chat.id == msg.chat_id.0) {
            debug!(chat_id = msg.chat_id.0, "message from unconfigured chat ignored");
            return Vec::new();
        }

        let text = msg.text.as_deref();
        let caption = msg.caption.as_deref();
        let title = msg.chat_title.as_deref().unwrap_or_default();

        let mut actions = Vec::new();
        for chat in chats {
            if !any_tagged(&chat.aliases, text, caption) {
                continue;
            }

            let to = ChatId(chat.id);
            info!(from = msg.chat_id.0, to = chat.id, message_id = msg.message_id.0, "relaying tagged message");

            actions.push(OutboundAction::Notice {
                chat_id: to,
                text: notice_text(title),
            });
            if let Some(reply_to) = msg.reply_to {
                actions.push(OutboundAction::Forward {
                    to,
                    from: msg.chat_id,
                    message_id: reply_to,
                });
            }
            actions.push(OutboundAction::Forward {
                to,
                from: msg.chat_id,
                message_id: msg.message_id,
            });
        }

        actions
    }

    /// List every tag when someone mentions the bot.
    pub fn mention_reply(&self, msg: &TextMessage) -> Option<OutboundAction> {
        let handle = format!("@{}", self.bot_username);
        if !msg.mentions().iter().any(|m| *m == handle) {
            return None;
        }

        Some(OutboundAction::Reply {
            chat_id: msg.chat_id,
            in_reply_to: msg.message_id,
            text: format!("Tags: {}", tag_list(&self.tree.all_aliases())),
        })
    }

    /// `/help` (optionally `/help@<this bot>`).
    pub fn help_reply(&self, cmd: &Command) -> Option<OutboundAction> {
        if let Some(addressee) = &cmd.addressee {
            if *addressee != self.bot_username {
                return None;
            }
        }
        if cmd.name != HELP_COMMAND {
            return None;
        }

        Some(OutboundAction::Reply {
            chat_id: cmd.chat_id,
            in_reply_to: cmd.message_id,
            text: help_text(
                &tag_list(&self.tree.all_aliases()),
                &self.tree.help_contacts.join(" "),
                &self.bot_username,
            ),
        })
    }
}

fn notice_text(source_title: &str) -> String {
    format!("Пересилаю повідомлення з чату {source_title}")
}

fn help_text(tags: &str, contacts: &str, bot_username: &str) -> String {
    format!(
        r#"
Щоб переслати повідомлення в інший чат:

(а) Ще не відправлене повідомлення
Додайте до тексту повідомлення тег під час його написання.

(б) Вже відправлене повідомлення
Відповідайте на потрібне повідомлення і додавайте тег до тексту відповіді.
Бот надішле обидва повідомлення в потрібний чат(и): (1) те, на яке ви відповідаєте і (2) безпосередньо вашу відповідь з тегом.

Щоб побачити доступні теги, почніть писати повідомлення з @{bot_username}, і бот запропонує вам список тегів. Також можна тегнути бота у будь-якому повідомленні, і бот надішле список усіх тегів.

To forward a message to another chat, add a tag to it while writing, or reply to an already sent message with a tag: the bot forwards both messages. Start typing @{bot_username} to get tag suggestions, or mention the bot to get the full list.

Доступні такі теги / Available tags:
{tags}

За поясненням до тегів і як працює пересилка, звертайтеся до / For questions contact {contacts}
"#
    )
}
