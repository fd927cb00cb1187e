use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::message::Message;

pub const UNTITLED: &str = "New conversation";

/// A stored conversation. The title is fixed when the entry is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    pub messages: Vec<Message>,
    pub timestamp: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: i64, messages: Vec<Message>) -> Self {
        let title = derive_title(&messages);
        Self {
            id,
            title,
            messages,
            timestamp: Utc::now(),
        }
    }

    /// Replace the message list and refresh the timestamp; the title stays.
    pub fn with_messages(&self, messages: Vec<Message>) -> Self {
        Self {
            messages,
            timestamp: Utc::now(),
            ..self.clone()
        }
    }
}

pub fn derive_title(messages: &[Message]) -> String {
    messages
        .first()
        .map(|m| m.content.trim())
        .filter(|content| !content.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Millisecond id that does not collide with any existing entry.
pub fn next_conversation_id(history: &[Conversation], now: DateTime<Utc>) -> i64 {
    let mut id = now.timestamp_millis();
    while history.iter().any(|c| c.id == id) {
        id += 1;
    }
    id
}
