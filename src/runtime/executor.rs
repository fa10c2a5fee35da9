//! Conversation runtime executor

use super::traits::Storage;
use super::{ReplyDelay, SseEvent};

use crate::resolver::ReplySource;
use crate::state_machine::{transition, ConvContext, ConvState, Effect, Event, PendingTurn};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// The single resolution currently being worked on
struct InFlightReply {
    message_id: String,
    task: JoinHandle<String>,
}

/// Generic conversation runtime that can work with any storage and reply source
///
/// The runtime stops once every sender of its event channel is dropped and
/// no reply is in flight.
pub struct ConversationRuntime<S, R>
where
    S: Storage + Clone + 'static,
    R: ReplySource + 'static,
{
    context: ConvContext,
    state: ConvState,
    storage: S,
    replies: Arc<R>,
    reply_delay: ReplyDelay,
    in_flight: Option<InFlightReply>,
    event_rx: mpsc::Receiver<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
}

impl<S, R> ConversationRuntime<S, R>
where
    S: Storage + Clone + 'static,
    R: ReplySource + 'static,
{
    pub fn new(
        context: ConvContext,
        state: ConvState,
        storage: S,
        replies: R,
        reply_delay: ReplyDelay,
        event_rx: mpsc::Receiver<Event>,
        broadcast_tx: broadcast::Sender<SseEvent>,
    ) -> Self {
        Self {
            context,
            state,
            storage,
            replies: Arc::new(replies),
            reply_delay,
            in_flight: None,
            event_rx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(conv_id = %self.context.conversation_id, "Starting conversation runtime");

        loop {
            let awaiting = self.in_flight.is_some();
            tokio::select! {
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event).await;
                }
                event = settle_in_flight(&mut self.in_flight), if awaiting => {
                    self.handle_event(event).await;
                }
                else => break,
            }
        }

        tracing::info!(conv_id = %self.context.conversation_id, "Conversation runtime stopped");
    }

    async fn handle_event(&mut self, event: Event) {
        if let Err(e) = self.process_event(event).await {
            tracing::warn!(
                conv_id = %self.context.conversation_id,
                error = %e,
                "Error handling event"
            );
            let _ = self.broadcast_tx.send(SseEvent::Error { message: e });
        }
    }

    async fn process_event(&mut self, event: Event) -> Result<(), String> {
        if let Event::ReplyFailed { in_reply_to, error } = &event {
            tracing::error!(
                conv_id = %self.context.conversation_id,
                message_id = %in_reply_to,
                error = %error,
                "Reply resolution failed"
            );
        }

        // Pure state transition
        let result =
            transition(&self.state, &self.context, event).map_err(|e| e.to_string())?;

        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect).await?;
        }

        Ok(())
    }

    /// Execute an effect
    async fn execute_effect(&mut self, effect: Effect) -> Result<(), String> {
        match effect {
            Effect::PersistMessage {
                message_id,
                sender,
                text,
                in_reply_to,
            } => {
                let msg = self
                    .storage
                    .add_message(
                        &self.context.conversation_id,
                        &message_id,
                        sender,
                        &text,
                        in_reply_to.as_deref(),
                    )
                    .await
                    .map_err(|e| e.to_string())?;

                let msg_json = serde_json::to_value(&msg).unwrap_or(Value::Null);
                let _ = self
                    .broadcast_tx
                    .send(SseEvent::Message { message: msg_json });
                Ok(())
            }

            Effect::PersistState => {
                self.storage
                    .update_state(&self.context.conversation_id, &self.state)
                    .await
                    .map_err(|e| e.to_string())?;

                tracing::debug!(
                    conv_id = %self.context.conversation_id,
                    pending = self.state.pending_turns(),
                    "State persisted"
                );

                let state_json = serde_json::to_value(&self.state).unwrap_or(Value::Null);
                let _ = self
                    .broadcast_tx
                    .send(SseEvent::StateChange { state: state_json });
                Ok(())
            }

            Effect::RequestReply { turn } => {
                self.spawn_reply(turn);
                Ok(())
            }

            Effect::NotifyReplyDone => {
                let _ = self.broadcast_tx.send(SseEvent::ReplyDone);
                Ok(())
            }
        }
    }

    /// Sleep the artificial delay, then resolve in a separate task so a panic
    /// inside the reply source surfaces as a `JoinError`.
    fn spawn_reply(&mut self, turn: PendingTurn) {
        let replies = self.replies.clone();
        let delay = self.reply_delay.sample();
        let PendingTurn { message_id, text } = turn;

        tracing::debug!(
            conv_id = %self.context.conversation_id,
            message_id = %message_id,
            delay_ms = %delay.as_millis(),
            "Scheduling reply"
        );

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            replies.reply(&text).await
        });

        self.in_flight = Some(InFlightReply { message_id, task });
    }
}

/// Wait for the in-flight resolution and turn its outcome into an event.
///
/// Cancel safe: if the caller stops polling, the task stays in `in_flight`.
async fn settle_in_flight(in_flight: &mut Option<InFlightReply>) -> Event {
    let Some(reply) = in_flight.as_mut() else {
        return std::future::pending().await;
    };

    let resolution = (&mut reply.task).await;
    let in_reply_to = reply.message_id.clone();
    *in_flight = None;

    match resolution {
        Ok(text) => Event::ReplyReady { in_reply_to, text },
        Err(e) => Event::ReplyFailed {
            in_reply_to,
            error: e.to_string(),
        },
    }
}
