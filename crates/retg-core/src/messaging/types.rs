use crate::{
    domain::{ChatId, MessageId},
    suggest::Suggestion,
};

/// Messenger-agnostic incoming update.
///
/// Telegram-specific fields stay in the Telegram adapter.
#[derive(Clone, Debug, PartialEq)]
pub enum IncomingUpdate {
    InlineQuery(InlineQuery),
    Command(Command),
    Message(TextMessage),
    /// Anything the engines do not understand (edited messages, callbacks, ...).
    Unsupported { kind: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct InlineQuery {
    pub query_id: String,
    pub query: String,
}

/// `/name@addressee`; the addressee is absent for plain `/name`.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub name: String,
    pub addressee: Option<String>,
}

impl Command {
    /// Parse the leading command token of `text` (`/help@bot args`).
    ///
    /// Returns `None` when the text does not start with `/`.
    pub fn parse(chat_id: ChatId, message_id: MessageId, text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let body = token.strip_prefix('/')?;
        let (name, addressee) = match body.split_once('@') {
            Some((name, at)) => (name, Some(at.to_string())),
            None => (body, None),
        };

        Some(Self {
            chat_id,
            message_id,
            name: name.to_lowercase(),
            addressee,
        })
    }
}

/// A regular message (text and/or captioned media).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub chat_title: Option<String>,
    pub message_id: MessageId,
    pub sender: Option<String>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub entities: Vec<TextEntity>,
    pub reply_to: Option<MessageId>,
}

impl TextMessage {
    /// Texts of the mention entities, e.g. `@someone`.
    pub fn mentions(&self) -> Vec<String> {
        let Some(text) = self.text.as_deref() else {
            return Vec::new();
        };
        self.entities
            .iter()
            .filter(|e| e.kind == EntityKind::Mention)
            .filter_map(|e| e.resolve(text))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Mention,
    BotCommand,
    Other,
}

/// Annotated span of message text.
///
/// Offsets and lengths count UTF-16 code units, as Telegram reports them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextEntity {
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

impl TextEntity {
    /// The annotated substring, or `None` if the span lies outside `text`.
    pub fn resolve(&self, text: &str) -> Option<String> {
        let units: Vec<u16> = text.encode_utf16().collect();
        let end = self.offset.checked_add(self.length)?;
        let span = units.get(self.offset..end)?;
        String::from_utf16(span).ok()
    }
}

/// One unit of work for the messaging transport.
#[derive(Clone, Debug, PartialEq)]
pub enum OutboundAction {
    Notice {
        chat_id: ChatId,
        text: String,
    },
    Forward {
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    },
    Reply {
        chat_id: ChatId,
        in_reply_to: MessageId,
        text: String,
    },
    AnswerSuggestions {
        query_id: String,
        suggestions: Vec<Suggestion>,
    },
}
