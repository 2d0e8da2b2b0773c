//! Chat operations: sending, retrying, archival, and bookmarks.
//!
//! Sending is fire-and-forget with a generation fence: the request runs on a
//! spawned task and reports back through a completion channel, and the
//! result is discarded if a newer request (or a new chat) superseded it.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::app::App;
use crate::error::{Error, Result};
use crate::models::{ChatSession, Message, Role, VisitStatus};
use crate::services::llm_client::Answer;
use crate::services::{ai_service, auth_service, config_service, history_service, usage_service};

/// Outcome of one answer request, tagged with the generation it belongs to
pub struct AnswerCompletion {
    pub generation: u64,
    pub result: Result<Answer>,
}

/// Issue a question to the answering service. Appends the user message (on a
/// fresh send), counts the request, and spawns the generation task. Returns
/// the request's generation number.
pub fn send_message(
    app: &mut App,
    text: &str,
    is_retry: bool,
    completions: &UnboundedSender<AnswerCompletion>,
) -> Result<u64> {
    if auth_service::api_key()?.is_none() {
        return Err(Error::Auth(
            "API key not configured. Run `bimehyar auth set-key` first.".to_string(),
        ));
    }

    // History snapshot excludes the question being sent
    let mut history: Vec<Message> = app
        .messages
        .iter()
        .filter(|m| !m.is_error)
        .cloned()
        .collect();

    if is_retry {
        // a retried question is already the last message; don't double it
        if history.last().map(|m| m.role == Role::User).unwrap_or(false) {
            history.pop();
        }
    } else {
        app.messages.push(Message::user(text));
        app.save_messages();
    }

    let (_, model, _) = config_service::get_effective_config()?;
    usage_service::record_request(&mut app.usage, &model, usage_service::now_ms());
    app.save_usage();

    let generation = app.next_generation();
    let sources = app.sources.clone();
    let question = text.to_string();
    let completions = completions.clone();

    info!(generation, model = %model, "sending question");
    tokio::spawn(async move {
        let result = ai_service::generate_answer(&history, &question, &sources).await;
        // receiver dropped means the session is over; nothing to deliver
        let _ = completions.send(AnswerCompletion { generation, result });
    });

    Ok(generation)
}

/// Apply a finished request to the conversation. Stale completions (an older
/// generation than the current one) are dropped. Returns whether the
/// conversation changed.
pub fn apply_completion(app: &mut App, completion: AnswerCompletion) -> bool {
    if completion.generation != app.generation() {
        debug!(
            generation = completion.generation,
            current = app.generation(),
            "discarding superseded answer"
        );
        return false;
    }

    match completion.result {
        Ok(answer) => {
            app.messages.push(Message::model(&answer.text));
            app.push_visitor_log(&answer.model, VisitStatus::Success);
        }
        Err(err) => {
            let status = if err.is_rate_limited() {
                VisitStatus::RateLimited
            } else {
                VisitStatus::Error
            };
            app.messages.push(Message::model_error(&err.to_string()));
            app.push_visitor_log("-", status);
        }
    }

    app.save_messages();
    true
}

/// Resubmit the last user question: everything after it is dropped from the
/// conversation first. No-op when no user message exists.
pub fn retry_last(
    app: &mut App,
    completions: &UnboundedSender<AnswerCompletion>,
) -> Result<Option<u64>> {
    let Some(index) = app.messages.iter().rposition(|m| m.role == Role::User) else {
        return Ok(None);
    };

    let text = app.messages[index].text.clone();
    app.messages.truncate(index + 1);
    app.save_messages();

    send_message(app, &text, true, completions).map(Some)
}

/// Archive the active conversation and start a clean one. Any in-flight
/// answer is fenced off. Returns the archived session id, if any.
pub fn new_chat(app: &mut App) -> Option<String> {
    let archived = history_service::archive_current(&mut app.messages, &mut app.history);

    if archived.is_some() {
        app.next_generation();
        app.save_messages();
        app.save_history();
    }

    archived
}

/// Replace the active conversation with an archived session's messages,
/// archiving the current conversation first if it has any.
pub fn load_chat(app: &mut App, session_id: &str) -> Result<()> {
    let session: &ChatSession = app
        .history
        .iter()
        .find(|s| s.id == session_id)
        .ok_or_else(|| Error::Store(format!("chat session not found: {}", session_id)))?;
    let messages = session.messages.clone();

    new_chat(app);
    app.messages = messages;
    app.next_generation();
    app.save_messages();

    Ok(())
}

pub fn delete_chat(app: &mut App, session_id: &str) -> Result<()> {
    if !history_service::delete_session(&mut app.history, session_id) {
        return Err(Error::Store(format!(
            "chat session not found: {}",
            session_id
        )));
    }
    app.save_history();
    Ok(())
}

pub fn clear_history(app: &mut App) {
    app.clear_history();
}

pub fn toggle_bookmark(app: &mut App, message_id: &str) -> Result<bool> {
    let message = app
        .messages
        .iter_mut()
        .find(|m| m.id == message_id)
        .ok_or_else(|| Error::Store(format!("message not found: {}", message_id)))?;

    message.is_bookmarked = !message.is_bookmarked;
    let bookmarked = message.is_bookmarked;
    app.save_messages();
    Ok(bookmarked)
}

pub fn set_bookmark_note(app: &mut App, message_id: &str, note: &str) -> Result<()> {
    let message = app
        .messages
        .iter_mut()
        .find(|m| m.id == message_id)
        .ok_or_else(|| Error::Store(format!("message not found: {}", message_id)))?;

    message.bookmark_note = Some(note.to_string());
    app.save_messages();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store_service::StateStore;
    use tempfile::TempDir;

    fn test_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let app = App::with_store(StateStore::with_root(dir.path()));
        (dir, app)
    }

    fn completion(generation: u64, text: &str) -> AnswerCompletion {
        AnswerCompletion {
            generation,
            result: Ok(Answer {
                text: text.to_string(),
                model: "gemini-2.0-flash".to_string(),
            }),
        }
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let (_dir, mut app) = test_app();
        app.next_generation(); // request 1
        app.next_generation(); // request 2 supersedes it

        assert!(!apply_completion(&mut app, completion(1, "stale answer")));
        assert!(app.messages.is_empty());
    }

    #[test]
    fn test_current_completion_is_applied() {
        let (_dir, mut app) = test_app();
        let generation = app.next_generation();

        assert!(apply_completion(&mut app, completion(generation, "fresh answer")));
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].text, "fresh answer");
        assert_eq!(app.visitor_logs.len(), 1);
        assert_eq!(app.visitor_logs[0].status, VisitStatus::Success);
    }

    #[test]
    fn test_failed_completion_becomes_error_message() {
        let (_dir, mut app) = test_app();
        let generation = app.next_generation();

        let failed = AnswerCompletion {
            generation,
            result: Err(Error::Api {
                status: 429,
                message: "quota".to_string(),
            }),
        };

        assert!(apply_completion(&mut app, failed));
        assert!(app.messages[0].is_error);
        assert_eq!(app.visitor_logs[0].status, VisitStatus::RateLimited);
    }

    #[test]
    fn test_new_chat_archives_and_fences() {
        let (_dir, mut app) = test_app();
        app.messages.push(Message::user("a question"));
        let pending = app.next_generation();

        let archived = new_chat(&mut app);

        assert!(archived.is_some());
        assert!(app.messages.is_empty());
        assert_eq!(app.history.len(), 1);
        // the pending answer now belongs to a dead generation
        assert!(!apply_completion(&mut app, completion(pending, "late answer")));
    }

    #[test]
    fn test_new_chat_on_empty_conversation_is_noop() {
        let (_dir, mut app) = test_app();
        assert!(new_chat(&mut app).is_none());
        assert!(app.history.is_empty());
    }

    #[test]
    fn test_load_chat_restores_messages() {
        let (_dir, mut app) = test_app();
        app.messages.push(Message::user("old question"));
        new_chat(&mut app);
        let session_id = app.history[0].id.clone();

        load_chat(&mut app, &session_id).unwrap();

        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].text, "old question");
    }

    #[tokio::test]
    async fn test_retry_truncates_after_last_user_message() {
        let (_dir, mut app) = test_app();
        app.messages.push(Message::user("q1"));
        app.messages.push(Message::model("a1"));
        app.messages.push(Message::user("q2"));
        app.messages.push(Message::model_error("boom"));

        // no API key configured in the test store, so the resend is refused,
        // but the truncation must already have happened
        let result = retry_last(&mut app, &tokio::sync::mpsc::unbounded_channel().0);
        assert!(result.is_err() || result.unwrap().is_some());
        assert_eq!(app.messages.len(), 3);
        assert_eq!(app.messages.last().unwrap().text, "q2");
    }

    #[test]
    fn test_bookmark_toggle_and_note() {
        let (_dir, mut app) = test_app();
        app.messages.push(Message::model("worth keeping"));
        let id = app.messages[0].id.clone();

        assert!(toggle_bookmark(&mut app, &id).unwrap());
        set_bookmark_note(&mut app, &id, "important clause").unwrap();
        assert!(!toggle_bookmark(&mut app, &id).unwrap());

        assert_eq!(app.messages[0].bookmark_note.as_deref(), Some("important clause"));
        assert!(!app.messages[0].is_bookmarked);
    }
}
