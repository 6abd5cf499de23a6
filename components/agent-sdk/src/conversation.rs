//! Append-only conversation history with optional persistence.
//!
//! The history is serialized as a pretty-printed JSON array of [`Message`],
//! which is also the format of the `.convo` log files.

use crate::error::ConversationError;
use crate::types::Message;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name pattern for persisted conversations.
pub const LOG_FILE_PATTERN: &str = "analyst-%Y%m%d-%H%M%S.convo";

/// Ordered message log shared between the model and the orchestrator.
///
/// Messages can only be appended; nothing removes or reorders them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    /// Creates an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a fresh conversation with a system prompt and the first question.
    pub fn fresh(system_prompt: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(question)],
        }
    }

    /// Continues `prior` with a new user question.
    ///
    /// An empty prior conversation is seeded fresh instead, so the model
    /// always sees the system prompt.
    pub fn resume(
        prior: Self,
        system_prompt: impl Into<String>,
        question: impl Into<String>,
    ) -> Self {
        if prior.is_empty() {
            return Self::fresh(system_prompt, question);
        }
        let mut state = prior;
        state.push(Message::user(question));
        state
    }

    /// Appends a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns the messages in order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the last message, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Writes the conversation to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConversationError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConversationError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads a conversation previously written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a conversation.
    pub fn load(path: &Path) -> Result<Self, ConversationError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConversationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Writes the conversation to a timestamped file inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn persist_timestamped(&self, dir: &Path) -> Result<PathBuf, ConversationError> {
        let name = chrono::Local::now().format(LOG_FILE_PATTERN).to_string();
        let path = dir.join(name);
        self.save(&path)?;
        Ok(path)
    }
}

impl<'a> IntoIterator for &'a ConversationState {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
