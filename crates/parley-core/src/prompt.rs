//! Prompt rendering — flattens a turn history into completion-style text.

use crate::message::Turn;

/// Cue that asks the completion backend to continue as the assistant.
pub const ASSISTANT_CUE: &str = "assistant:";

/// Render `history` plus the incoming user text into a single prompt.
///
/// Each historical turn becomes a `role: content` line. The prompt ends with
/// `user: <new_user_text>\nassistant:` and no trailing newline, leaving the
/// backend to write the assistant's line.
pub fn render(history: &[Turn], new_user_text: &str) -> String {
    let mut prompt = String::new();
    for turn in history {
        prompt.push_str(turn.role().as_str());
        prompt.push_str(": ");
        prompt.push_str(turn.content());
        prompt.push('\n');
    }
    prompt.push_str("user: ");
    prompt.push_str(new_user_text);
    prompt.push('\n');
    prompt.push_str(ASSISTANT_CUE);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history() {
        assert_eq!(render(&[], "hi"), "user: hi\nassistant:");
    }

    #[test]
    fn test_history_lines_in_order() {
        let history = vec![Turn::user("hi"), Turn::assistant("hello")];
        assert_eq!(
            render(&history, "how are you?"),
            "user: hi\nassistant: hello\nuser: how are you?\nassistant:"
        );
    }

    #[test]
    fn test_empty_input_accepted() {
        let prompt = render(&[Turn::assistant("")], "");
        assert_eq!(prompt, "assistant: \nuser: \nassistant:");
    }

    #[test]
    fn test_render_is_deterministic() {
        let history = vec![Turn::user("a"), Turn::assistant("b")];
        let first = render(&history, "c");
        assert_eq!(first, render(&history, "c"));
        assert!(first.ends_with("user: c\nassistant:"));
    }
}
