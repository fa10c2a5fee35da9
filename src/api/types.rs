//! API request and response types

use crate::lead::FieldError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Response for chat action
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub queued: bool,
    pub message_id: String,
}

/// Response with a single conversation
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub conversation: serde_json::Value,
}

/// Response with conversation and messages
#[derive(Debug, Serialize)]
pub struct ConversationWithMessagesResponse {
    pub conversation: serde_json::Value,
    pub messages: Vec<serde_json::Value>,
    pub composing: bool,
    pub last_sequence: u64,
}

/// Where replies come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverMode {
    Remote,
    Local,
}

/// What the chat widget needs before the first message
#[derive(Debug, Serialize)]
pub struct ChatInfoResponse {
    pub greeting: &'static str,
    pub suggestions: &'static [&'static str],
    pub mode: ResolverMode,
}

/// Response for an accepted lead
#[derive(Debug, Serialize)]
pub struct LeadResponse {
    pub submitted: bool,
    pub confirmation_ms: u64,
    pub visible_until: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            fields: None,
        }
    }

    pub fn with_fields(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
        Self {
            error: message.into(),
            fields: Some(fields),
        }
    }
}
