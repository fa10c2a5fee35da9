//! Runtime for executing conversations
//!
//! One task per conversation owns its state and applies events in order.

mod executor;
mod memory;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;
pub use memory::MemoryStore;
pub use traits::*;

use crate::message::Conversation;
use crate::resolver::ResponseResolver;
use crate::settings::read_or;
use crate::state_machine::{ConvContext, ConvState, Event};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const DEFAULT_DELAY_MIN_MS: u64 = 1000;
const DEFAULT_DELAY_MAX_MS: u64 = 2000;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = ConversationRuntime<Arc<MemoryStore>, Arc<ResponseResolver>>;

/// Window the artificial "thinking" pause is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyDelay {
    min: Duration,
    max: Duration,
}

impl ReplyDelay {
    /// Bounds are swapped if given in the wrong order
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    #[cfg(test)]
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::new(
            Duration::from_millis(read_or(
                &lookup,
                "SOFTSELL_REPLY_DELAY_MIN_MS",
                DEFAULT_DELAY_MIN_MS,
            )),
            Duration::from_millis(read_or(
                &lookup,
                "SOFTSELL_REPLY_DELAY_MAX_MS",
                DEFAULT_DELAY_MAX_MS,
            )),
        )
    }

    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Default for ReplyDelay {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_DELAY_MIN_MS),
            Duration::from_millis(DEFAULT_DELAY_MAX_MS),
        )
    }
}

/// Runtime failures surfaced to the API
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Conversation runtime stopped: {0}")]
    Stopped(String),
}

/// Manager for all conversation runtimes
pub struct RuntimeManager {
    store: Arc<MemoryStore>,
    resolver: Arc<ResponseResolver>,
    reply_delay: ReplyDelay,
    runtimes: RwLock<HashMap<String, RuntimeEntry>>,
}

struct RuntimeEntry {
    handle: ConversationHandle,
    last_active: Instant,
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        conversation: serde_json::Value,
        messages: Vec<serde_json::Value>,
        composing: bool,
        last_sequence: u64,
        greeting: &'static str,
        suggestions: &'static [&'static str],
    },
    Message {
        message: serde_json::Value,
    },
    StateChange {
        state: serde_json::Value,
    },
    ReplyDone,
    Error {
        message: String,
    },
}

impl RuntimeManager {
    pub fn new(resolver: Arc<ResponseResolver>, reply_delay: ReplyDelay) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            resolver,
            reply_delay,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Create a conversation and start its runtime
    pub async fn create_conversation(&self) -> Conversation {
        let id = uuid::Uuid::new_v4().to_string();
        let conversation = self.store.create_conversation(&id).await;

        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);

        let runtime: ProductionRuntime = ConversationRuntime::new(
            ConvContext::new(&id),
            ConvState::Idle,
            self.store.clone(),
            self.resolver.clone(),
            self.reply_delay,
            event_rx,
            broadcast_tx.clone(),
        );

        self.runtimes.write().await.insert(
            id.clone(),
            RuntimeEntry {
                handle: ConversationHandle {
                    event_tx,
                    broadcast_tx,
                },
                last_active: Instant::now(),
            },
        );

        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(conv_id = %id, "Conversation runtime finished");
        });

        conversation
    }

    /// Get the handle of a running conversation and mark it as used
    async fn touch(&self, conversation_id: &str) -> Result<ConversationHandle, RuntimeError> {
        let mut runtimes = self.runtimes.write().await;
        let entry = runtimes
            .get_mut(conversation_id)
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))?;
        entry.last_active = Instant::now();
        Ok(entry.handle.clone())
    }

    /// Send an event to a conversation
    pub async fn send_event(&self, conversation_id: &str, event: Event) -> Result<(), RuntimeError> {
        let handle = self.touch(conversation_id).await?;
        handle
            .event_tx
            .send(event)
            .await
            .map_err(|e| RuntimeError::Stopped(e.to_string()))
    }

    /// Subscribe to conversation updates
    pub async fn subscribe(
        &self,
        conversation_id: &str,
    ) -> Result<broadcast::Receiver<SseEvent>, RuntimeError> {
        let handle = self.touch(conversation_id).await?;
        Ok(handle.broadcast_tx.subscribe())
    }

    /// Drop conversations untouched for at least `max_idle`.
    ///
    /// A conversation still composing a reply is kept. Dropping the handle
    /// closes the runtime's inbox, so its task stops and open streams end.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut runtimes = self.runtimes.write().await;

        let idle: Vec<String> = runtimes
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_active) >= max_idle)
            .map(|(id, _)| id.clone())
            .collect();

        let mut evicted = 0;
        for id in idle {
            if matches!(self.store.get_state(&id).await, Ok(state) if state.is_composing()) {
                continue;
            }
            runtimes.remove(&id);
            self.store.remove_conversation(&id).await;
            evicted += 1;
        }

        if evicted > 0 {
            tracing::info!(evicted, remaining = runtimes.len(), "Evicted idle conversations");
        }
        evicted
    }

    /// Periodically evict idle conversations until the manager is dropped
    pub fn spawn_idle_sweeper(self: &Arc<Self>, max_idle: Duration) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        let period = max_idle.clamp(Duration::from_secs(1), Duration::from_secs(60));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.evict_idle(max_idle).await;
            }
        })
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Whether replies may come from the remote completion endpoint
    pub fn remote_enabled(&self) -> bool {
        self.resolver.has_remote()
    }
}
