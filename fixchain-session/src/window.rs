use fixchain_core::{Message, Role};

use crate::estimate_message_tokens;

pub const DEFAULT_MAX_MESSAGES: usize = 50;
pub const DEFAULT_MAX_TOKENS: usize = 100_000;

/// Bounds on how much earlier conversation a run is given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryWindow {
    pub max_messages: usize,
    pub max_tokens: usize,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl HistoryWindow {
    pub fn new(max_messages: usize, max_tokens: usize) -> Self {
        Self {
            max_messages,
            max_tokens,
        }
    }

    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages;
        self
    }

    /// System messages always survive and come first. Of the rest, the newest
    /// `max_messages` are kept, then the oldest are dropped while the estimate
    /// exceeds `max_tokens`, never going below one conversation message.
    pub fn trim(&self, messages: Vec<Message>) -> Vec<Message> {
        if messages.is_empty() {
            return messages;
        }
        let (system, mut conversation): (Vec<Message>, Vec<Message>) = messages
            .into_iter()
            .partition(|message| message.role == Role::System);

        if conversation.len() > self.max_messages {
            let excess = conversation.len() - self.max_messages;
            tracing::debug!(
                from = conversation.len(),
                to = self.max_messages,
                "trimming conversation history"
            );
            conversation.drain(..excess);
        }

        let mut tokens = total_tokens(&system, &conversation);
        let mut dropped = 0;
        while tokens > self.max_tokens && conversation.len() - dropped > 1 {
            dropped += 1;
            tokens = total_tokens(&system, &conversation[dropped..]);
        }
        conversation.drain(..dropped);

        if tokens > self.max_tokens {
            tracing::warn!(
                tokens,
                max_tokens = self.max_tokens,
                "history still exceeds the token budget after trimming"
            );
        }

        let mut trimmed = system;
        trimmed.extend(conversation);
        trimmed
    }
}

fn total_tokens(system: &[Message], conversation: &[Message]) -> usize {
    // Framing for the reply is counted once, not per slice.
    estimate_message_tokens(system) + estimate_message_tokens(conversation) - 2
}
