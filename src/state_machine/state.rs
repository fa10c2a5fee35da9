//! Conversation state types

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A user submission waiting for its reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTurn {
    /// Id of the user message this turn answers
    pub message_id: String,
    pub text: String,
}

impl PendingTurn {
    pub fn new(message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            text: text.into(),
        }
    }
}

/// Conversation state.
///
/// At most one turn is being resolved at a time. Submissions that arrive
/// meanwhile wait in `queued` and are answered in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    #[default]
    Idle,
    AwaitingReply {
        current: PendingTurn,
        #[serde(default)]
        queued: VecDeque<PendingTurn>,
    },
}

impl ConvState {
    /// The assistant is composing a reply
    pub fn is_composing(&self) -> bool {
        matches!(self, ConvState::AwaitingReply { .. })
    }

    /// Turns still owed a reply, including the one in flight
    pub fn pending_turns(&self) -> usize {
        match self {
            ConvState::Idle => 0,
            ConvState::AwaitingReply { queued, .. } => queued.len() + 1,
        }
    }
}

/// Immutable per-conversation context
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub conversation_id: String,
}

impl ConvContext {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
        }
    }
}
