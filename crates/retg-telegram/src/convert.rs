//! Telegram updates -> core updates.

use teloxide::types::{Message, MessageEntity, MessageEntityKind, Update, UpdateKind};

use retg_core::{
    domain::{ChatId, MessageId},
    messaging::types::{Command, EntityKind, IncomingUpdate, InlineQuery, TextEntity, TextMessage},
};

pub fn convert_update(update: &Update) -> IncomingUpdate {
    match &update.kind {
        UpdateKind::InlineQuery(q) => IncomingUpdate::InlineQuery(InlineQuery {
            query_id: q.id.clone(),
            query: q.query.clone(),
        }),
        UpdateKind::Message(msg) => convert_message(msg),
        other => IncomingUpdate::Unsupported {
            kind: kind_name(other).to_string(),
        },
    }
}

fn kind_name(kind: &UpdateKind) -> &'static str {
    match kind {
        UpdateKind::EditedMessage(_) => "edited_message",
        UpdateKind::ChannelPost(_) => "channel_post",
        UpdateKind::EditedChannelPost(_) => "edited_channel_post",
        UpdateKind::ChosenInlineResult(_) => "chosen_inline_result",
        UpdateKind::CallbackQuery(_) => "callback_query",
        _ => "unknown",
    }
}

/// A message is a command when its first entity is a bot command at offset 0.
fn is_command(msg: &Message) -> bool {
    msg.entities()
        .and_then(|entities| entities.first())
        .is_some_and(|e| e.kind == MessageEntityKind::BotCommand && e.offset == 0)
}

pub fn convert_message(msg: &Message) -> IncomingUpdate {
    let chat_id = ChatId(msg.chat.id.0);
    let message_id = MessageId(msg.id.0);

    if is_command(msg) {
        if let Some(cmd) = msg
            .text()
            .and_then(|text| Command::parse(chat_id, message_id, text))
        {
            return IncomingUpdate::Command(cmd);
        }
    }

    IncomingUpdate::Message(TextMessage {
        chat_id,
        chat_title: msg.chat.title().map(str::to_string),
        message_id,
        sender: msg.from().and_then(|u| u.username.clone()),
        text: msg.text().map(str::to_string),
        caption: msg.caption().map(str::to_string),
        entities: msg
            .entities()
            .unwrap_or_default()
            .iter()
            .map(convert_entity)
            .collect(),
        reply_to: msg.reply_to_message().map(|r| MessageId(r.id.0)),
    })
}

fn convert_entity(entity: &MessageEntity) -> TextEntity {
    let kind = match entity.kind {
        MessageEntityKind::Mention => EntityKind::Mention,
        MessageEntityKind::BotCommand => EntityKind::BotCommand,
        _ => EntityKind::Other,
    };
    TextEntity {
        kind,
        offset: entity.offset,
        length: entity.length,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // `Update` only decodes its kind from text input, so go through a string.
    fn update(body: serde_json::Value) -> Update {
        serde_json::from_str(&body.to_string()).unwrap()
    }

    #[test]
    fn converts_raw_webhook_body() {
        let raw = br#"{"update_id": 7, "inline_query": {"id": "q7", "from": {"id": 5, "is_bot": false, "first_name": "Petro"}, "query": "*Tw", "offset": ""}}"#;
        let upd: Update = serde_json::from_slice(raw).unwrap();

        assert_eq!(
            convert_update(&upd),
            IncomingUpdate::InlineQuery(InlineQuery {
                query_id: "q7".to_string(),
                query: "*Tw".to_string(),
            })
        );
    }

    fn group_message(extra: serde_json::Value) -> serde_json::Value {
        let mut msg = json!({
            "message_id": 612,
            "date": 1_700_000_000,
            "chat": {"id": -1001, "type": "group", "title": "First chat"},
            "from": {"id": 5, "is_bot": false, "first_name": "Petro", "username": "petro"}
        });
        if let (Some(base), Some(extra)) = (msg.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        msg
    }

    #[test]
    fn converts_inline_queries() {
        let upd = update(json!({
            "update_id": 1,
            "inline_query": {
                "id": "q1",
                "from": {"id": 5, "is_bot": false, "first_name": "Petro"},
                "query": "Some text *Se",
                "offset": ""
            }
        }));
        assert_eq!(
            convert_update(&upd),
            IncomingUpdate::InlineQuery(InlineQuery {
                query_id: "q1".to_string(),
                query: "Some text *Se".to_string(),
            })
        );
    }

    #[test]
    fn converts_messages_with_mentions_and_replies() {
        let upd = update(json!({
            "update_id": 2,
            "message": group_message(json!({
                "text": "hey @reTGanslatorBot *second",
                "entities": [{"type": "mention", "offset": 4, "length": 16}],
                "reply_to_message": {
                    "message_id": 152,
                    "date": 1_700_000_000,
                    "chat": {"id": -1001, "type": "group", "title": "First chat"},
                    "text": "original"
                }
            }))
        }));

        let IncomingUpdate::Message(msg) = convert_update(&upd) else {
            panic!("expected a message");
        };
        assert_eq!(msg.chat_id, ChatId(-1001));
        assert_eq!(msg.chat_title.as_deref(), Some("First chat"));
        assert_eq!(msg.message_id, MessageId(612));
        assert_eq!(msg.sender.as_deref(), Some("petro"));
        assert_eq!(msg.reply_to, Some(MessageId(152)));
        assert_eq!(msg.mentions(), vec!["@reTGanslatorBot".to_string()]);
    }

    #[test]
    fn converts_leading_bot_command() {
        let upd = update(json!({
            "update_id": 3,
            "message": group_message(json!({
                "text": "/help@reTGanslatorBot",
                "entities": [{"type": "bot_command", "offset": 0, "length": 21}]
            }))
        }));

        assert_eq!(
            convert_update(&upd),
            IncomingUpdate::Command(Command {
                chat_id: ChatId(-1001),
                message_id: MessageId(612),
                name: "help".to_string(),
                addressee: Some("reTGanslatorBot".to_string()),
            })
        );
    }

    #[test]
    fn command_not_at_start_is_a_plain_message() {
        let upd = update(json!({
            "update_id": 4,
            "message": group_message(json!({
                "text": "see /help *second",
                "entities": [{"type": "bot_command", "offset": 4, "length": 5}]
            }))
        }));
        assert!(matches!(convert_update(&upd), IncomingUpdate::Message(_)));
    }

    #[test]
    fn edited_messages_are_unsupported() {
        let upd = update(json!({
            "update_id": 5,
            "edited_message": group_message(json!({"text": "fixed *second", "edit_date": 1_700_000_100}))
        }));
        assert_eq!(
            convert_update(&upd),
            IncomingUpdate::Unsupported {
                kind: "edited_message".to_string()
            }
        );
    }
}
