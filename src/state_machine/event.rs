//! Events that can occur in a conversation

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage {
        text: String,
        message_id: String,
    },

    // Resolution events
    ReplyReady {
        in_reply_to: String,
        text: String,
    },
    /// The resolution task itself died before producing text
    ReplyFailed {
        in_reply_to: String,
        error: String,
    },
}
