use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub is_bookmarked: bool,
    #[serde(default)]
    pub bookmark_note: Option<String>,
}

impl Message {
    fn new(role: Role, text: &str, is_error: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.to_string(),
            timestamp: Utc::now(),
            is_error,
            is_bookmarked: false,
            bookmark_note: None,
        }
    }

    pub fn user(text: &str) -> Self {
        Self::new(Role::User, text, false)
    }

    pub fn model(text: &str) -> Self {
        Self::new(Role::Model, text, false)
    }

    /// A failed generation, rendered inline in the conversation
    pub fn model_error(text: &str) -> Self {
        Self::new(Role::Model, text, true)
    }
}
