//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::memory::MemoryStore;
use super::traits::MessageStore;
use super::{ConversationRuntime, ReplyDelay, SseEvent};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::message::Message;
use crate::resolver::ReplySource;
use crate::state_machine::{ConvContext, ConvState, Event};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Mock Reply Sources
// ============================================================================

/// Reply source that answers from a queue, optionally after a delay
pub struct MockReplySource {
    replies: Mutex<VecDeque<(String, Duration)>>,
    fallback: String,
    /// Messages asked about, in call order
    pub calls: Mutex<Vec<String>>,
}

impl MockReplySource {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: fallback.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_reply(&self, text: impl Into<String>, delay: Duration) {
        self.replies
            .lock()
            .unwrap()
            .push_back((text.into(), delay));
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySource for MockReplySource {
    async fn reply(&self, message: &str) -> String {
        self.calls.lock().unwrap().push(message.to_string());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some((text, delay)) => {
                tokio::time::sleep(delay).await;
                text
            }
            None => self.fallback.clone(),
        }
    }
}

/// Reply source that fails in an unplanned way
pub struct PanickingReplySource;

#[async_trait]
impl ReplySource for PanickingReplySource {
    async fn reply(&self, _message: &str) -> String {
        panic!("reply source exploded")
    }
}

// ============================================================================
// Test Runtime Builder
// ============================================================================

/// Helper for building test runtimes with minimal boilerplate
pub struct TestRuntime<R: ReplySource + 'static> {
    pub storage: Arc<MemoryStore>,
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_rx: broadcast::Receiver<SseEvent>,
    pub replies: Arc<R>,
    conv_id: String,
    runtime_handle: tokio::task::JoinHandle<()>,
}

impl<R: ReplySource + 'static> TestRuntime<R> {
    /// Start a runtime for a fresh conversation with no artificial delay
    pub async fn start(replies: R) -> Self {
        let conv_id = "test-conv".to_string();
        let storage = Arc::new(MemoryStore::new());
        storage.create_conversation(&conv_id).await;
        let replies = Arc::new(replies);

        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, broadcast_rx) = broadcast::channel(128);

        let runtime = ConversationRuntime::new(
            ConvContext::new(&conv_id),
            ConvState::Idle,
            storage.clone(),
            replies.clone(),
            ReplyDelay::none(),
            event_rx,
            broadcast_tx,
        );

        let handle = tokio::spawn(async move {
            runtime.run().await;
        });

        Self {
            storage,
            event_tx,
            broadcast_rx,
            replies,
            conv_id,
            runtime_handle: handle,
        }
    }

    /// Send user message to the runtime, returning its id
    pub async fn send_message(&self, text: &str) -> String {
        let message_id = uuid::Uuid::new_v4().to_string();
        self.event_tx
            .send(Event::UserMessage {
                text: text.to_string(),
                message_id: message_id.clone(),
            })
            .await
            .expect("Failed to send message");
        message_id
    }

    /// Wait for `ReplyDone` with timeout
    pub async fn wait_for_done(&mut self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.broadcast_rx.recv()).await {
                Ok(Ok(SseEvent::ReplyDone)) => return true,
                _ => continue,
            }
        }
        false
    }

    /// Wait for the next broadcast error with timeout
    pub async fn wait_for_error(&mut self, timeout: Duration) -> Option<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.broadcast_rx.recv()).await {
                Ok(Ok(SseEvent::Error { message })) => return Some(message),
                _ => continue,
            }
        }
        None
    }

    /// Get all messages from storage
    pub async fn messages(&self) -> Vec<Message> {
        self.storage
            .get_messages(&self.conv_id)
            .await
            .expect("test conversation exists")
    }

    /// Drop the only sender and wait for the runtime task to finish
    pub async fn close(self, timeout: Duration) -> bool {
        let Self {
            event_tx,
            runtime_handle,
            ..
        } = self;
        drop(event_tx);
        tokio::time::timeout(timeout, runtime_handle).await.is_ok()
    }

    pub async fn state(&self) -> ConvState {
        use super::traits::StateStore;
        self.storage
            .get_state(&self.conv_id)
            .await
            .expect("test conversation exists")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ResolverConfig, Usage};
    use crate::message::Sender;
    use crate::resolver::{KeywordTable, ResponseResolver};
    use crate::system_prompt::{CONNECTION_TROUBLE_REPLY, DEFAULT_REPLY};

    fn keyed_resolver(mock: Arc<MockLlmClient>) -> ResponseResolver {
        let config = ResolverConfig {
            api_key: Some("sk-test".to_string()),
            ..ResolverConfig::default()
        };
        ResponseResolver::with_service(&config, KeywordTable::brokerage().unwrap(), mock)
    }

    #[tokio::test]
    async fn test_mock_llm_client() {
        let mock = MockLlmClient::new("test-model");
        mock.queue_response(LlmResponse {
            text: "Hello".to_string(),
            finish_reason: Some("stop".to_string()),
            usage: Usage::default(),
        });

        let request = LlmRequest {
            system: vec![],
            messages: vec![crate::llm::LlmMessage::user("Hi")],
            max_tokens: None,
            temperature: None,
        };

        let first = mock.complete(&request).await.unwrap();
        assert_eq!(first.text, "Hello");

        // Queue exhausted
        assert!(mock.complete(&request).await.is_err());
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.model_id(), "test-model");
    }

    /// Integration test: one submission appends the visitor's message and a reply
    #[tokio::test]
    async fn test_submission_appends_two_entries() {
        let mut rt = TestRuntime::start(MockReplySource::new("Sure thing.")).await;
        let id = rt.send_message("Hi").await;

        assert!(rt.wait_for_done(Duration::from_secs(2)).await);

        let msgs = rt.messages().await;
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].sender, Sender::User);
        assert_eq!(msgs[0].text, "Hi");
        assert_eq!(msgs[1].sender, Sender::Assistant);
        assert_eq!(msgs[1].text, "Sure thing.");
        assert_eq!(msgs[1].in_reply_to.as_deref(), Some(id.as_str()));
        assert_eq!(rt.state().await, ConvState::Idle);
    }

    #[tokio::test]
    async fn test_blank_submission_is_ignored() {
        let mut rt = TestRuntime::start(MockReplySource::new("unused")).await;
        rt.send_message("   ").await;

        assert!(rt.wait_for_error(Duration::from_secs(2)).await.is_some());
        assert!(rt.messages().await.is_empty());
        assert!(rt.replies.recorded_calls().is_empty());
        assert_eq!(rt.state().await, ConvState::Idle);
    }

    /// A panicking reply source still yields a reply and leaves the
    /// conversation ready for more input
    #[tokio::test]
    async fn test_unexpected_failure_appends_trouble_reply() {
        let mut rt = TestRuntime::start(PanickingReplySource).await;
        rt.send_message("What licenses do you buy?").await;

        assert!(rt.wait_for_done(Duration::from_secs(2)).await);

        let msgs = rt.messages().await;
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].sender, Sender::Assistant);
        assert_eq!(msgs[1].text, CONNECTION_TROUBLE_REPLY);
        assert_eq!(rt.state().await, ConvState::Idle);
    }

    /// Back-to-back submissions get replies in submission order even when
    /// the first reply is slower
    #[tokio::test]
    async fn test_queued_submissions_reply_in_order() {
        let source = MockReplySource::new("fallback");
        source.queue_reply("first answer", Duration::from_millis(200));
        source.queue_reply("second answer", Duration::ZERO);

        let mut rt = TestRuntime::start(source).await;
        let first = rt.send_message("one").await;
        let second = rt.send_message("two").await;

        assert!(rt.wait_for_done(Duration::from_secs(3)).await);

        let msgs = rt.messages().await;
        assert_eq!(msgs.len(), 4);
        let order: Vec<(Sender, &str)> = msgs.iter().map(|m| (m.sender, m.text.as_str())).collect();
        assert_eq!(
            order,
            vec![
                (Sender::User, "one"),
                (Sender::User, "two"),
                (Sender::Assistant, "first answer"),
                (Sender::Assistant, "second answer"),
            ]
        );
        assert_eq!(msgs[2].in_reply_to.as_deref(), Some(first.as_str()));
        assert_eq!(msgs[3].in_reply_to.as_deref(), Some(second.as_str()));
        assert_eq!(rt.replies.recorded_calls(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_remote_success_through_runtime() {
        let mock = Arc::new(MockLlmClient::new("test-model"));
        mock.queue_response(LlmResponse {
            text: "We usually pay within 3 business days.".to_string(),
            finish_reason: Some("stop".to_string()),
            usage: Usage::default(),
        });

        let mut rt = TestRuntime::start(keyed_resolver(mock.clone())).await;
        rt.send_message("When do I get paid?").await;
        assert!(rt.wait_for_done(Duration::from_secs(2)).await);

        let msgs = rt.messages().await;
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].text, "We usually pay within 3 business days.");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_through_runtime_falls_back() {
        let mock = Arc::new(MockLlmClient::new("test-model"));
        mock.queue_error(LlmError::server_error("HTTP 503"));

        let mut rt = TestRuntime::start(keyed_resolver(mock.clone())).await;
        rt.send_message("Tell me a joke").await;
        assert!(rt.wait_for_done(Duration::from_secs(2)).await);

        let msgs = rt.messages().await;
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].text, DEFAULT_REPLY);
        assert_eq!(mock.call_count(), 1);
    }

    /// With no sender left and nothing in flight the runtime task ends
    #[tokio::test]
    async fn test_runtime_stops_without_senders() {
        let rt = TestRuntime::start(MockReplySource::new("unused")).await;
        assert!(rt.close(Duration::from_secs(1)).await);
    }

    /// Replies already owed are still written before the runtime stops
    #[tokio::test]
    async fn test_in_flight_replies_land_after_senders_drop() {
        let source = MockReplySource::new("fallback");
        source.queue_reply("first answer", Duration::from_millis(100));
        source.queue_reply("second answer", Duration::ZERO);

        let rt = TestRuntime::start(source).await;
        rt.send_message("one").await;
        rt.send_message("two").await;
        let storage = rt.storage.clone();

        assert!(rt.close(Duration::from_secs(2)).await);

        let replies: Vec<String> = storage
            .get_messages("test-conv")
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.sender == Sender::Assistant)
            .map(|m| m.text)
            .collect();
        assert_eq!(replies, vec!["first answer", "second answer"]);
    }
}
