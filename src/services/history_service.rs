//! Conversion of the active message list into immutable archived sessions.

use chrono::{Local, Utc};
use uuid::Uuid;

use crate::models::{ChatSession, Message, Role};

const TITLE_MAX_CHARS: usize = 30;

/// Title for a new archive: the first user message truncated to 30
/// characters, or a date-based default when the session has none.
fn derive_title(messages: &[Message]) -> String {
    match messages.iter().find(|m| m.role == Role::User) {
        Some(first) => {
            let title: String = first.text.chars().take(TITLE_MAX_CHARS).collect();
            if first.text.chars().count() > TITLE_MAX_CHARS {
                format!("{}...", title)
            } else {
                title
            }
        }
        None => format!("گفتگو {}", Local::now().format("%Y-%m-%d")),
    }
}

/// Archive the active conversation: moves `messages` into a fresh session
/// prepended to `history` (most-recent-first) and leaves the active list
/// empty. No-op when there is nothing to archive. Returns the new session id.
pub fn archive_current(
    messages: &mut Vec<Message>,
    history: &mut Vec<ChatSession>,
) -> Option<String> {
    if messages.is_empty() {
        return None;
    }

    let session = ChatSession {
        id: Uuid::new_v4().to_string(),
        title: derive_title(messages),
        messages: std::mem::take(messages),
        created_at: Utc::now(),
    };
    let id = session.id.clone();
    history.insert(0, session);

    Some(id)
}

/// Remove one session by id, leaving the others in their original relative
/// order. Returns whether anything was removed.
pub fn delete_session(history: &mut Vec<ChatSession>, session_id: &str) -> bool {
    let before = history.len();
    history.retain(|s| s.id != session_id);
    history.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_messages() -> Vec<Message> {
        vec![
            Message::user("پوشش سرقت کلی چیست؟"),
            Message::model("سرقت کلی یعنی..."),
            Message::user("و خسارت حادثه؟"),
        ]
    }

    #[test]
    fn test_archive_moves_messages_into_one_session() {
        let mut messages = sample_messages();
        let expected = messages.clone();
        let mut history = Vec::new();

        let id = archive_current(&mut messages, &mut history).unwrap();

        assert!(messages.is_empty());
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
        assert_eq!(history[0].messages, expected);
    }

    #[test]
    fn test_archive_empty_list_is_noop() {
        let mut messages = Vec::new();
        let mut history = vec![ChatSession {
            id: "a".to_string(),
            title: "t".to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }];

        assert!(archive_current(&mut messages, &mut history).is_none());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_archive_prepends_most_recent_first() {
        let mut history = Vec::new();

        let mut first = vec![Message::user("first")];
        archive_current(&mut first, &mut history);
        let mut second = vec![Message::user("second")];
        archive_current(&mut second, &mut history);

        assert_eq!(history[0].title, "second");
        assert_eq!(history[1].title, "first");
    }

    #[test]
    fn test_title_truncates_long_first_question() {
        let long = "a".repeat(45);
        let mut messages = vec![Message::user(&long)];
        let mut history = Vec::new();

        archive_current(&mut messages, &mut history);

        assert_eq!(history[0].title, format!("{}...", "a".repeat(30)));
    }

    #[test]
    fn test_title_defaults_without_user_message() {
        let mut messages = vec![Message::model("unsolicited")];
        let mut history = Vec::new();

        archive_current(&mut messages, &mut history);

        assert!(history[0].title.starts_with("گفتگو "));
    }

    #[test]
    fn test_delete_preserves_relative_order() {
        let mut history = Vec::new();
        for text in ["one", "two", "three"] {
            let mut messages = vec![Message::user(text)];
            archive_current(&mut messages, &mut history);
        }
        let target = history[1].id.clone();

        assert!(delete_session(&mut history, &target));

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].title, "three");
        assert_eq!(history[1].title, "one");
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let mut history = Vec::new();
        let mut messages = vec![Message::user("keep me")];
        archive_current(&mut messages, &mut history);

        assert!(!delete_session(&mut history, "missing"));
        assert_eq!(history.len(), 1);
    }
}
