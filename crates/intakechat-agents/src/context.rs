use intakechat_common::{ChatTurn, SourceContent};

use crate::providers::ChatMessage;

/// Number of most recent turns replayed into each prompt.
pub const HISTORY_WINDOW: usize = 5;

const GREETINGS: &[&str] = &[
    "hi",
    "hii",
    "hello",
    "hey",
    "hola",
    "good morning",
    "good afternoon",
    "good evening",
];

/// Exact (trimmed, case-insensitive) match against the greeting set.
/// Substrings do not count: "hi there" is a question.
pub fn is_greeting(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    GREETINGS.contains(&normalized.as_str())
}

/// Assemble the role-tagged prompt for one question.
///
/// Layout: one system message with `persona`, then a user/assistant pair for
/// each of the last [`HISTORY_WINDOW`] turns in conversation order, then a
/// single user message carrying both sources and the question.
pub fn build_prompt(
    question: &str,
    source: &SourceContent,
    history: &[ChatTurn],
    persona: &str,
) -> Vec<ChatMessage> {
    let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];

    let mut messages = Vec::with_capacity(2 + recent.len() * 2);
    messages.push(ChatMessage::system(persona));
    for turn in recent {
        messages.push(ChatMessage::user(turn.user_text.as_str()));
        messages.push(ChatMessage::assistant(turn.bot_text.as_str()));
    }
    messages.push(ChatMessage::user(grounded_question(question, source)));
    messages
}

fn grounded_question(question: &str, source: &SourceContent) -> String {
    format!(
        "Website Content:\n{}\n\nPDF Content:\n{}\n\nQuestion: {}",
        source.page_text, source.document_text, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ChatRole;
    use intakechat_common::TurnOutcome;

    fn source() -> SourceContent {
        SourceContent {
            document_text: "Brochure: Python 101".to_string(),
            page_text: "Site: we teach ML".to_string(),
        }
    }

    fn turns(n: usize) -> Vec<ChatTurn> {
        (0..n)
            .map(|i| ChatTurn::new(format!("q{i}"), format!("a{i}"), TurnOutcome::Answered))
            .collect()
    }

    #[test]
    fn empty_history_yields_system_and_question() {
        let messages = build_prompt("What courses do you offer?", &source(), &[], "persona");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::system("persona"));
        assert_eq!(messages[1].role, ChatRole::User);
        assert!(messages[1].content.contains("What courses do you offer?"));
        assert!(messages[1].content.contains("Brochure: Python 101"));
        assert!(messages[1].content.contains("Site: we teach ML"));
    }

    #[test]
    fn length_follows_window_formula() {
        for n in 0..9 {
            let messages = build_prompt("q", &source(), &turns(n), "p");
            assert_eq!(messages.len(), 1 + 2 * n.min(HISTORY_WINDOW) + 1, "history {n}");
            assert_eq!(messages.first().unwrap().role, ChatRole::System);
            assert_eq!(messages.last().unwrap().role, ChatRole::User);
        }
    }

    #[test]
    fn keeps_only_last_five_turns_in_order() {
        let messages = build_prompt("next", &source(), &turns(7), "p");
        let replayed: Vec<&str> = messages[1..messages.len() - 1]
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            replayed,
            ["q2", "a2", "q3", "a3", "q4", "a4", "q5", "a5", "q6", "a6"]
        );
    }

    #[test]
    fn history_roles_alternate_user_then_assistant() {
        let messages = build_prompt("q", &source(), &turns(3), "p");
        let roles: Vec<ChatRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [
                ChatRole::System,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User,
            ]
        );
    }

    #[test]
    fn duplicate_questions_are_not_deduplicated() {
        let history = vec![
            ChatTurn::new("fees?", "100", TurnOutcome::Answered),
            ChatTurn::new("fees?", "100", TurnOutcome::Answered),
        ];
        let messages = build_prompt("fees?", &source(), &history, "p");
        assert_eq!(messages.len(), 6);
    }

    #[test]
    fn greeting_match_is_exact_and_case_insensitive() {
        assert!(is_greeting("hi"));
        assert!(is_greeting("HI"));
        assert!(is_greeting("  Hello "));
        assert!(is_greeting("Good Morning"));
        assert!(!is_greeting("hi there"));
        assert!(!is_greeting("which"));
        assert!(!is_greeting(""));
    }
}
