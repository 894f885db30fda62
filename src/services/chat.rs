/// Chat transcript storage and the model contract
///
/// Transcripts are kept per problem. Only the three most recently saved
/// problems survive; saving a fourth evicts the oldest save.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{flatten_history, ChatMessage, ChatPage, ChatReply, DomainError, PlainMessage};
use crate::storage::{ChatStorage, StorageError};

/// How many problem transcripts are kept
pub const MAX_TRANSCRIPTS: usize = 3;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Model request failed: {0}")]
    Model(String),

    #[error("Invalid model output: {0}")]
    InvalidOutput(#[from] DomainError),

    #[error("Transcript storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Everything a model needs to answer one prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    pub system_prompt: String,
    pub history: Vec<PlainMessage>,
    pub extracted_code: Option<String>,
}

/// External chat-completion service
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<ChatReply, ChatError>;
}

pub struct TranscriptStore<S> {
    storage: Arc<S>,
}

impl<S: ChatStorage> TranscriptStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub async fn save_history(
        &self,
        problem_name: &str,
        history: &[ChatMessage],
    ) -> Result<(), StorageError> {
        self.storage.put_transcript(problem_name, history).await?;

        let problems = self.storage.list_problems().await?;
        let excess = problems.len().saturating_sub(MAX_TRANSCRIPTS);
        for evicted in problems.iter().take(excess) {
            tracing::debug!("Evicting chat transcript for '{}'", evicted);
            self.storage.delete_transcript(evicted).await?;
        }

        Ok(())
    }

    /// A page of the transcript counted back from the newest message
    ///
    /// `offset` skips the newest messages, `limit` bounds the page size.
    pub async fn fetch_history(
        &self,
        problem_name: &str,
        limit: usize,
        offset: usize,
    ) -> Result<ChatPage, StorageError> {
        let Some(history) = self.storage.get_transcript(problem_name).await? else {
            return Ok(ChatPage {
                total_message_count: 0,
                messages: Vec::new(),
            });
        };

        let total = history.len();
        let end = total.saturating_sub(offset);
        let start = end.saturating_sub(limit);

        Ok(ChatPage {
            total_message_count: total,
            messages: history[start..end].to_vec(),
        })
    }

    pub async fn clear_history(&self, problem_name: &str) -> Result<bool, StorageError> {
        self.storage.delete_transcript(problem_name).await
    }

    /// Stored problem names, least recently saved first
    pub async fn list_problems(&self) -> Result<Vec<String>, StorageError> {
        self.storage.list_problems().await
    }

    /// Send `prompt` with the stored transcript and record the exchange
    pub async fn ask<M: ChatModel + ?Sized>(
        &self,
        model: &M,
        problem_name: &str,
        prompt: &str,
        system_prompt: &str,
        extracted_code: Option<String>,
    ) -> Result<ChatReply, ChatError> {
        let mut history = self
            .storage
            .get_transcript(problem_name)
            .await?
            .unwrap_or_default();

        let request = GenerateRequest {
            prompt: prompt.to_string(),
            system_prompt: system_prompt.to_string(),
            history: flatten_history(&history),
            extracted_code,
        };

        let reply = model.generate(request).await?;
        reply.validate()?;

        history.push(ChatMessage::user(prompt));
        history.push(ChatMessage::assistant(reply.clone()));
        self.save_history(problem_name, &history).await?;

        Ok(reply)
    }
}
