/// Chat transcript types
///
/// Messages exchanged with the coding assistant. Assistant replies are
/// structured (feedback, up to two hints, an optional code snippet); the
/// transcript keeps them structured and only flattens them to text when the
/// history is sent back to a model.

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Maximum number of hints a reply may carry
pub const MAX_HINTS: usize = 2;

/// Snippet languages the code viewer can highlight
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "c", "cpp", "csharp", "cs", "dart", "elixir", "erlang", "go", "java", "javascript", "jsonp",
    "jsx", "php", "python", "racket", "rkt", "ruby", "rb", "rust", "scala", "sql", "swift",
    "typescript", "tsx",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Function,
    System,
    User,
    Assistant,
    Data,
    Tool,
}

/// Structured reply from the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programming_language: Option<String>,
}

impl ChatReply {
    pub fn text(feedback: impl Into<String>) -> Self {
        Self {
            feedback: feedback.into(),
            hints: Vec::new(),
            snippet: None,
            programming_language: None,
        }
    }

    /// Check the reply against the output contract
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.hints.len() > MAX_HINTS {
            return Err(DomainError::Validation {
                message: format!(
                    "You can only provide up to {} hints, got {}",
                    MAX_HINTS,
                    self.hints.len()
                ),
            });
        }

        if let Some(language) = &self.programming_language {
            let known = SUPPORTED_LANGUAGES
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(language));
            if !known {
                return Err(DomainError::InvalidValue {
                    message: format!("Unsupported programming language '{}'", language),
                });
            }
        }

        Ok(())
    }
}

/// Message body: plain text or a structured assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatContent {
    Text(String),
    Reply(ChatReply),
}

impl ChatContent {
    /// Text form sent back to models; structured replies become JSON
    pub fn to_plain_text(&self) -> String {
        match self {
            ChatContent::Text(text) => text.clone(),
            ChatContent::Reply(reply) => {
                serde_json::to_string(reply).unwrap_or_else(|_| reply.feedback.clone())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: ChatContent,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: ChatContent::Text(text.into()),
        }
    }

    pub fn assistant(reply: ChatReply) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: ChatContent::Reply(reply),
        }
    }
}

/// A message with its content flattened to text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Flatten a transcript for a model request
pub fn flatten_history(history: &[ChatMessage]) -> Vec<PlainMessage> {
    history
        .iter()
        .map(|message| PlainMessage {
            role: message.role,
            content: message.content.to_plain_text(),
        })
        .collect()
}

/// One page of a transcript, newest messages last
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPage {
    pub total_message_count: usize,
    pub messages: Vec<ChatMessage>,
}
