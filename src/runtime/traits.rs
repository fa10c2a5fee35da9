//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::message::{Message, Sender};
use crate::state_machine::ConvState;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Storage failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
}

/// Storage for conversation messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message to the conversation log
    async fn add_message(
        &self,
        conv_id: &str,
        message_id: &str,
        sender: Sender,
        text: &str,
        in_reply_to: Option<&str>,
    ) -> Result<Message, StoreError>;

    /// Get all messages for a conversation
    async fn get_messages(&self, conv_id: &str) -> Result<Vec<Message>, StoreError>;
}

/// Storage for conversation state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Update the conversation state
    async fn update_state(&self, conv_id: &str, state: &ConvState) -> Result<(), StoreError>;

    /// Get the current conversation state
    async fn get_state(&self, conv_id: &str) -> Result<ConvState, StoreError>;
}

/// Combined storage trait for convenience
pub trait Storage: MessageStore + StateStore {}
impl<T: MessageStore + StateStore> Storage for T {}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: MessageStore + ?Sized> MessageStore for Arc<T> {
    async fn add_message(
        &self,
        conv_id: &str,
        message_id: &str,
        sender: Sender,
        text: &str,
        in_reply_to: Option<&str>,
    ) -> Result<Message, StoreError> {
        (**self)
            .add_message(conv_id, message_id, sender, text, in_reply_to)
            .await
    }

    async fn get_messages(&self, conv_id: &str) -> Result<Vec<Message>, StoreError> {
        (**self).get_messages(conv_id).await
    }
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn update_state(&self, conv_id: &str, state: &ConvState) -> Result<(), StoreError> {
        (**self).update_state(conv_id, state).await
    }

    async fn get_state(&self, conv_id: &str) -> Result<ConvState, StoreError> {
        (**self).get_state(conv_id).await
    }
}
