//! Append-only message log for one session.

use std::fmt;

use chrono::{DateTime, Local};

use super::attachment::EncodedImage;
use crate::models::AssistantPayload;

/// Unique message identifier, strictly increasing in append order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u64);

impl MessageId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Assistant,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::User => "You",
            Origin::Assistant => "Assistant",
        }
    }
}

/// A timeline entry. Never changes after it is appended.
#[derive(Debug, Clone)]
pub struct Message {
    id: MessageId,
    origin: Origin,
    text: String,
    attachment: Option<EncodedImage>,
    created_at: DateTime<Local>,
    payload: Option<AssistantPayload>,
}

impl Message {
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Message text; empty for attachment-only submissions.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attachment(&self) -> Option<&EncodedImage> {
        self.attachment.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn payload(&self) -> Option<&AssistantPayload> {
        self.payload.as_ref()
    }
}

/// Ordered log of everything exchanged in the session. Append-only.
#[derive(Debug, Default)]
pub struct Timeline {
    messages: Vec<Message>,
    next_id: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message written by the user.
    pub fn push_user(&mut self, text: String, attachment: Option<EncodedImage>) -> MessageId {
        self.append(Origin::User, text, attachment, None)
    }

    /// Append an assistant message. Empty payloads are not stored.
    pub fn push_assistant(
        &mut self,
        text: String,
        payload: Option<AssistantPayload>,
    ) -> MessageId {
        let payload = payload.filter(|p| !p.is_empty());
        self.append(Origin::Assistant, text, None, payload)
    }

    fn append(
        &mut self,
        origin: Origin,
        text: String,
        attachment: Option<EncodedImage>,
        payload: Option<AssistantPayload>,
    ) -> MessageId {
        self.next_id += 1;
        let id = MessageId(self.next_id);
        self.messages.push(Message {
            id,
            origin,
            text,
            attachment,
            created_at: Local::now(),
            payload,
        });
        id
    }

    /// All messages in append order. The iterator can be cloned to restart.
    pub fn all(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages
            .binary_search_by_key(&id, |m| m.id)
            .ok()
            .map(|idx| &self.messages[idx])
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
