//! HTTP request handlers

use super::assets;
use super::sse::sse_stream;
use super::types::{
    ChatInfoResponse, ChatRequest, ChatResponse, ConversationResponse,
    ConversationWithMessagesResponse, ErrorResponse, LeadResponse, ResolverMode,
};
use super::AppState;
use crate::lead::{Confirmation, LeadForm, ValidationErrors};
use crate::runtime::{MessageStore, RuntimeError, SseEvent, StateStore, StoreError};
use crate::state_machine::Event;
use crate::system_prompt::{GREETING, SUGGESTED_QUESTIONS};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Site pages
        .route("/", get(serve_landing))
        .route("/contact", get(serve_contact))
        // Static assets (embedded or filesystem fallback)
        .route("/assets/*path", get(serve_asset))
        // Chat widget bootstrap
        .route("/api/chat", get(chat_info))
        // Conversations
        .route("/api/conversations/new", post(create_conversation))
        .route("/api/conversations/:id", get(get_conversation))
        .route("/api/conversations/:id/stream", get(stream_conversation))
        .route("/api/conversations/:id/chat", post(send_chat))
        // Lead intake
        .route("/api/leads", post(submit_lead))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Site Pages
// ============================================================

async fn serve_landing() -> Response {
    assets::serve("index.html")
}

async fn serve_contact() -> Response {
    assets::serve("contact.html")
}

async fn serve_asset(Path(path): Path<String>) -> Response {
    assets::serve(&format!("assets/{path}"))
}

// ============================================================
// Chat Widget
// ============================================================

async fn chat_info(State(state): State<AppState>) -> Json<ChatInfoResponse> {
    let mode = if state.runtime.remote_enabled() {
        ResolverMode::Remote
    } else {
        ResolverMode::Local
    };
    Json(ChatInfoResponse {
        greeting: GREETING,
        suggestions: SUGGESTED_QUESTIONS,
        mode,
    })
}

async fn create_conversation(State(state): State<AppState>) -> Json<ConversationResponse> {
    let conversation = state.runtime.create_conversation().await;
    let conversations = state.runtime.store().conversation_count().await;
    tracing::info!(conv_id = %conversation.id, conversations, "Conversation created");

    Json(ConversationResponse {
        conversation: serde_json::to_value(conversation).unwrap_or(Value::Null),
    })
}

/// Conversation, messages, and whether a reply is being composed
async fn snapshot(
    state: &AppState,
    id: &str,
) -> Result<ConversationWithMessagesResponse, AppError> {
    let store = state.runtime.store();
    let conversation = store.get_conversation(id).await?;
    let messages = store.get_messages(id).await?;
    let conv_state = store.get_state(id).await?;

    let last_sequence = messages.last().map_or(0, |m| m.sequence);
    let json_msgs: Vec<Value> = messages
        .iter()
        .map(|m| serde_json::to_value(m).unwrap_or(Value::Null))
        .collect();

    Ok(ConversationWithMessagesResponse {
        conversation: serde_json::to_value(&conversation).unwrap_or(Value::Null),
        messages: json_msgs,
        composing: conv_state.is_composing(),
        last_sequence,
    })
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationWithMessagesResponse>, AppError> {
    Ok(Json(snapshot(&state, &id).await?))
}

async fn stream_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // Subscribe before the snapshot so nothing falls between the two
    let broadcast_rx = state.runtime.subscribe(&id).await?;
    let snapshot = snapshot(&state, &id).await?;

    let init_event = SseEvent::Init {
        conversation: snapshot.conversation,
        messages: snapshot.messages,
        composing: snapshot.composing,
        last_sequence: snapshot.last_sequence,
        greeting: GREETING,
        suggestions: SUGGESTED_QUESTIONS,
    };

    Ok(sse_stream(init_event, broadcast_rx))
}

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Message text is empty".to_string()));
    }

    let message_id = uuid::Uuid::new_v4().to_string();
    let event = Event::UserMessage {
        text: req.text,
        message_id: message_id.clone(),
    };

    state.runtime.send_event(&id, event).await?;

    Ok(Json(ChatResponse {
        queued: true,
        message_id,
    }))
}

// ============================================================
// Lead Intake
// ============================================================

async fn submit_lead(Json(form): Json<LeadForm>) -> Result<Json<LeadResponse>, AppError> {
    let lead = form.validate()?;

    tracing::info!(
        name = %lead.name,
        email = %lead.email,
        company = %lead.company,
        license_type = %lead.license_type,
        origin = ?lead.origin,
        message = %lead.message,
        "Lead submitted"
    );

    let confirmation = Confirmation::new(lead.origin, Utc::now());
    Ok(Json(LeadResponse {
        submitted: true,
        confirmation_ms: u64::try_from(confirmation.window.as_millis()).unwrap_or(u64::MAX),
        visible_until: confirmation.visible_until(),
    }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Validation(ValidationErrors),
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConversationNotFound(_) => AppError::NotFound(e.to_string()),
        }
    }
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::Store(e) => e.into(),
            RuntimeError::Stopped(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(e: ValidationErrors) -> Self {
        AppError::Validation(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg)),
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::with_fields(errors.to_string(), errors.0),
            ),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg))
            }
        };

        (status, Json(body)).into_response()
    }
}
