use crate::llm::ChatMessage;
use crate::session::ChatTurn;

/// Turns of prior conversation included in the prompt.
pub const HISTORY_WINDOW_TURNS: usize = 5;

/// Retrieved passages included in the context block.
pub const CONTEXT_PASSAGE_LIMIT: usize = 3;

const CONTEXT_PREAMBLE: &str = "Additional reference material from the uploaded document:";

const NO_CONTEXT_MARKER: &str =
    "No additional documents have been uploaded. Answer from general knowledge and say so \
     when the question needs document-specific details.";

/// Assembles the message list for one generation call: persona, a context
/// block built from retrieved passages, the most recent turns, then the
/// user's query.
pub fn build_messages(
    system_prompt: &str,
    passages: &[String],
    history: &[ChatTurn],
    query: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2 * HISTORY_WINDOW_TURNS + 3);
    messages.push(ChatMessage::new("system", system_prompt));
    messages.push(ChatMessage::new("system", context_message(passages)));

    let window_start = history.len().saturating_sub(HISTORY_WINDOW_TURNS);
    for turn in &history[window_start..] {
        messages.push(ChatMessage::new("user", turn.user.clone()));
        messages.push(ChatMessage::new("assistant", turn.assistant.clone()));
    }

    messages.push(ChatMessage::new("user", query));
    messages
}

fn context_message(passages: &[String]) -> String {
    if passages.is_empty() {
        return NO_CONTEXT_MARKER.to_string();
    }
    let block = passages
        .iter()
        .take(CONTEXT_PASSAGE_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{}\n\n{}", CONTEXT_PREAMBLE, block)
}
