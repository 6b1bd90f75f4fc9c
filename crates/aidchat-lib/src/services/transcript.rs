// Transcript Store
// Append-only, insertion-ordered message history for one session.

use crate::models::Message;

/// Ordered conversation history.
///
/// Only `append` mutates it; there is no insert, remove, sort or dedupe.
/// The whole transcript is dropped with its session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return the new length
    pub fn append(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages appended after the first `seen` entries
    pub fn since(&self, seen: usize) -> &[Message] {
        self.messages.get(seen..).unwrap_or(&[])
    }
}
