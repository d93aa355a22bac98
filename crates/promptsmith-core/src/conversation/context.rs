//! Context assembly: turning retrieved history plus a new message into
//! the ordered message sequence handed to the generation provider.

use promptsmith_types::conversation::ConversationRecord;
use promptsmith_types::llm::Message;

/// Assemble the ordered conversational context for a generation call.
///
/// `history` arrives newest-first (the retrieval order). Turn-groups are
/// reversed to oldest-first -- the order of messages *within* a group
/// (user then assistant) is preserved -- then flattened, and the new user
/// message is appended last. The output is strict chronological order of
/// the underlying exchanges, ending with the newest user message.
///
/// Pure function: same inputs, same output. An empty history yields a
/// single-element sequence containing only the new message.
pub fn assemble_context(history: &[ConversationRecord], new_message: &str) -> Vec<Message> {
    let mut messages: Vec<Message> = Vec::with_capacity(history.len() * 2 + 1);

    for record in history.iter().rev() {
        messages.extend(record.messages.iter().cloned());
    }

    messages.push(Message::user(new_message));
    messages
}
