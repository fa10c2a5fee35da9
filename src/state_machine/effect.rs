//! Effects produced by state transitions

use super::PendingTurn;
use crate::message::Sender;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the conversation log
    PersistMessage {
        message_id: String,
        sender: Sender,
        text: String,
        in_reply_to: Option<String>,
    },

    /// Persist the new state and tell clients
    PersistState,

    /// Resolve a reply for this turn after the artificial delay
    RequestReply { turn: PendingTurn },

    /// Tell clients the assistant has nothing left to say
    NotifyReplyDone,
}

impl Effect {
    pub fn persist_user_message(message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Effect::PersistMessage {
            message_id: message_id.into(),
            sender: Sender::User,
            text: text.into(),
            in_reply_to: None,
        }
    }

    /// Assistant ids are derived from the triggering message id
    pub fn persist_assistant_message(in_reply_to: &str, text: impl Into<String>) -> Self {
        Effect::PersistMessage {
            message_id: format!("{in_reply_to}-reply"),
            sender: Sender::Assistant,
            text: text.into(),
            in_reply_to: Some(in_reply_to.to_string()),
        }
    }
}
