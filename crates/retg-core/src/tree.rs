//! Chat hierarchy: the routing configuration and the views derived from it.
//!
//! The tree is loaded once at startup and never mutated afterwards, so every
//! view below is a pure read and safe to compute from concurrent handlers.

use std::{
    collections::{BTreeSet, HashSet, VecDeque},
    fs,
    path::Path,
};

use serde::Deserialize;

use crate::{domain::ChatId, errors::Error, Result};

/// One destination conversation and the chats nested under it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Chat {
    pub id: i64,
    pub aliases: Vec<String>,
    pub child_chats: Vec<Chat>,
}

impl Chat {
    pub fn new(id: i64, aliases: &[&str]) -> Self {
        Self {
            id,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            child_chats: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Chat>) -> Self {
        self.child_chats = children;
        self
    }

    pub fn chat_id(&self) -> ChatId {
        ChatId(self.id)
    }

    /// Name used in human-readable reports: the first alias, or the id.
    pub fn display_name(&self) -> String {
        self.aliases
            .first()
            .cloned()
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// Root chats plus the contacts listed by `/help`.
///
/// Mirrors the persisted JSON document: unknown fields are ignored and
/// missing ones fall back to empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatTree {
    pub chats: Vec<Chat>,
    pub help_contacts: Vec<String>,
}

impl ChatTree {
    pub fn new(chats: Vec<Chat>, help_contacts: Vec<String>) -> Self {
        Self {
            chats,
            help_contacts,
        }
    }

    /// Read, parse and validate the chat document at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let tree = Self::from_json(&raw)?;
        tree.validate()?;
        Ok(tree)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reject configurations that would deliver the same message twice.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let mut duplicates = BTreeSet::new();
        for chat in self.all_chats() {
            if !seen.insert(chat.id) {
                duplicates.insert(chat.id);
            }
        }

        if duplicates.is_empty() {
            return Ok(());
        }

        let ids = duplicates
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(Error::Config(format!(
            "chat ids must be unique, duplicated: {ids}"
        )))
    }

    /// Breadth-first flatten of the forest.
    ///
    /// Parents always precede their descendants and every chat at depth `d`
    /// precedes every chat at depth `d + 1`.
    pub fn all_chats(&self) -> Vec<&Chat> {
        let mut out = Vec::new();
        let mut queue: VecDeque<&Chat> = self.chats.iter().collect();

        while let Some(chat) = queue.pop_front() {
            out.push(chat);
            queue.extend(chat.child_chats.iter());
        }

        out
    }

    /// Every alias in the tree, deduplicated by exact value and sorted
    /// case-insensitively.
    pub fn all_aliases(&self) -> Vec<String> {
        let unique: BTreeSet<&str> = self
            .all_chats()
            .into_iter()
            .flat_map(|chat| chat.aliases.iter().map(String::as_str))
            .collect();

        let mut aliases: Vec<String> = unique.into_iter().map(str::to_string).collect();
        aliases.sort_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });
        aliases
    }

    pub fn find_chat(&self, chat_id: ChatId) -> Option<&Chat> {
        self.all_chats().into_iter().find(|chat| chat.id == chat_id.0)
    }
}
