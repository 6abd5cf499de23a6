//! Reasoning loop state.

use crate::conversation::ConversationState;
use crate::types::ToolCall;
use std::path::PathBuf;

/// Position of the reasoning loop in its state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    /// Waiting for the next model response.
    AwaitingModel,
    /// Executing the tool calls of the last response, in order.
    DispatchingTools(Vec<ToolCall>),
    /// The model produced a final answer.
    FinishedAnswer(String),
    /// The step budget ran out.
    FinishedMaxSteps,
    /// The model asked for a tool that does not exist.
    FinishedUnknownTool(String),
}

impl LoopState {
    /// Returns `true` for the three finished states.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoopState::FinishedAnswer(_)
                | LoopState::FinishedMaxSteps
                | LoopState::FinishedUnknownTool(_)
        )
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Final answer text, possibly empty.
    Answer(String),
    /// No answer within the step budget.
    MaxStepsReached,
    /// Session aborted on an unregistered tool.
    UnknownTool {
        /// Name the model used.
        name: String,
    },
}

/// Result of one reasoning session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Terminal outcome.
    pub outcome: SessionOutcome,
    /// Full conversation, for the next turn.
    pub conversation: ConversationState,
    /// Number of model calls made.
    pub steps: u32,
    /// Where the conversation was written, if it was.
    pub persisted: Option<PathBuf>,
}

impl SessionReport {
    /// Returns the final answer, if the session produced one.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        match &self.outcome {
            SessionOutcome::Answer(text) => Some(text),
            _ => None,
        }
    }
}

/// Mutable state of the session in progress.
pub(crate) struct AgentState {
    pub(crate) conversation: ConversationState,
    pub(crate) step: u32,
}

impl AgentState {
    pub(crate) fn new(conversation: ConversationState) -> Self {
        Self {
            conversation,
            step: 0,
        }
    }
}
