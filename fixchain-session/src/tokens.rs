//! Token estimates without a tokenizer: whitespace words scaled by 1.33.

use fixchain_core::{Message, Role};

const TOKENS_PER_WORD: f64 = 1.33;
const TOKENS_PER_MESSAGE: usize = 4;
const TOKENS_PER_REPLY: usize = 2;

/// Rounded down, so a single short word still counts as one token.
pub fn estimate_tokens(text: &str) -> usize {
    (text.split_whitespace().count() as f64 * TOKENS_PER_WORD) as usize
}

/// Estimate for a prompt made of `messages`, including per-message framing
/// and the reply primer.
pub fn estimate_message_tokens(messages: &[Message]) -> usize {
    messages
        .iter()
        .map(|message| {
            TOKENS_PER_MESSAGE
                + estimate_tokens(role_label(&message.role))
                + estimate_tokens(&message.content)
        })
        .sum::<usize>()
        + TOKENS_PER_REPLY
}

fn role_label(role: &Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}
