//! History append-and-trim policy.
//!
//! A conversation turn is always appended as a (user, assistant) pair, then the
//! sequence is trimmed to the most recent [`MAX_HISTORY_MESSAGES`] entries. The
//! function is pure: output depends only on its inputs, and re-applying it with
//! no new entries yields the same sequence.

use fleetbot_core::ChatMessage;

/// Maximum number of messages retained per chat session.
pub const MAX_HISTORY_MESSAGES: usize = 1000;

/// Appends the user and assistant messages in order, then keeps the suffix of
/// at most [`MAX_HISTORY_MESSAGES`] entries (oldest dropped first).
pub fn append_and_trim(
    existing: Vec<ChatMessage>,
    user_msg: ChatMessage,
    assistant_msg: ChatMessage,
) -> Vec<ChatMessage> {
    let mut history = existing;
    history.push(user_msg);
    history.push(assistant_msg);

    let overflow = history.len().saturating_sub(MAX_HISTORY_MESSAGES);
    if overflow > 0 {
        history.drain(..overflow);
    }
    history
}
