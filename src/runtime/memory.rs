//! In-process conversation store
//!
//! Nothing outlives the process; a restart starts every visitor over.

use super::traits::{MessageStore, StateStore, StoreError};
use crate::message::{Conversation, Message, Sender};
use crate::state_machine::ConvState;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug)]
struct ConversationRecord {
    conversation: Conversation,
    messages: Vec<Message>,
    state: ConvState,
}

/// Conversations, their logs and states, keyed by conversation id
#[derive(Debug, Default)]
pub struct MemoryStore {
    conversations: RwLock<HashMap<String, ConversationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, empty conversation
    pub async fn create_conversation(&self, id: &str) -> Conversation {
        let conversation = Conversation {
            id: id.to_string(),
            created_at: Utc::now(),
        };
        self.conversations.write().await.insert(
            id.to_string(),
            ConversationRecord {
                conversation: conversation.clone(),
                messages: Vec::new(),
                state: ConvState::Idle,
            },
        );
        conversation
    }

    pub async fn get_conversation(&self, id: &str) -> Result<Conversation, StoreError> {
        self.conversations
            .read()
            .await
            .get(id)
            .map(|r| r.conversation.clone())
            .ok_or_else(|| StoreError::ConversationNotFound(id.to_string()))
    }

    /// Messages with a sequence number greater than `after`
    pub async fn get_messages_after(
        &self,
        conv_id: &str,
        after: u64,
    ) -> Result<Vec<Message>, StoreError> {
        let conversations = self.conversations.read().await;
        let record = conversations
            .get(conv_id)
            .ok_or_else(|| StoreError::ConversationNotFound(conv_id.to_string()))?;
        Ok(record
            .messages
            .iter()
            .filter(|m| m.sequence > after)
            .cloned()
            .collect())
    }

    /// Forget a conversation and its log. Returns whether it existed.
    pub async fn remove_conversation(&self, id: &str) -> bool {
        self.conversations.write().await.remove(id).is_some()
    }

    pub async fn conversation_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn add_message(
        &self,
        conv_id: &str,
        message_id: &str,
        sender: Sender,
        text: &str,
        in_reply_to: Option<&str>,
    ) -> Result<Message, StoreError> {
        let mut conversations = self.conversations.write().await;
        let record = conversations
            .get_mut(conv_id)
            .ok_or_else(|| StoreError::ConversationNotFound(conv_id.to_string()))?;

        let message = Message {
            id: message_id.to_string(),
            conversation_id: conv_id.to_string(),
            sequence: record.messages.len() as u64 + 1,
            text: text.to_string(),
            sender,
            in_reply_to: in_reply_to.map(str::to_string),
            timestamp: Utc::now(),
        };
        record.messages.push(message.clone());
        Ok(message)
    }

    async fn get_messages(&self, conv_id: &str) -> Result<Vec<Message>, StoreError> {
        self.get_messages_after(conv_id, 0).await
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn update_state(&self, conv_id: &str, state: &ConvState) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        let record = conversations
            .get_mut(conv_id)
            .ok_or_else(|| StoreError::ConversationNotFound(conv_id.to_string()))?;
        record.state = state.clone();
        Ok(())
    }

    async fn get_state(&self, conv_id: &str) -> Result<ConvState, StoreError> {
        self.conversations
            .read()
            .await
            .get(conv_id)
            .map(|r| r.state.clone())
            .ok_or_else(|| StoreError::ConversationNotFound(conv_id.to_string()))
    }
}
