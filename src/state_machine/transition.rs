//! Pure state transition function

use super::{ConvContext, ConvState, Effect, Event, PendingTurn};
use crate::system_prompt::CONNECTION_TROUBLE_REPLY;
use std::collections::VecDeque;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Reply for {0} does not match the turn being answered")]
    UnexpectedReply(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; all I/O is
/// described by the returned effects.
pub fn transition(
    state: &ConvState,
    _context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Blank submissions never touch the log
        (_, Event::UserMessage { text, .. }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyMessage)
        }

        // Idle + UserMessage -> AwaitingReply
        (ConvState::Idle, Event::UserMessage { text, message_id }) => {
            let turn = PendingTurn::new(message_id.clone(), text.clone());
            Ok(TransitionResult::new(ConvState::AwaitingReply {
                current: turn.clone(),
                queued: VecDeque::new(),
            })
            .with_effect(Effect::persist_user_message(message_id, text))
            .with_effect(Effect::PersistState)
            .with_effect(Effect::RequestReply { turn }))
        }

        // Busy + UserMessage -> queue behind the turn in flight
        (ConvState::AwaitingReply { current, queued }, Event::UserMessage { text, message_id }) => {
            let mut queued = queued.clone();
            queued.push_back(PendingTurn::new(message_id.clone(), text.clone()));
            Ok(TransitionResult::new(ConvState::AwaitingReply {
                current: current.clone(),
                queued,
            })
            .with_effect(Effect::persist_user_message(message_id, text))
            .with_effect(Effect::PersistState))
        }

        (ConvState::AwaitingReply { current, queued }, Event::ReplyReady { in_reply_to, text })
            if in_reply_to == current.message_id =>
        {
            Ok(settle(current, queued, text))
        }

        (ConvState::AwaitingReply { current, queued }, Event::ReplyFailed { in_reply_to, .. })
            if in_reply_to == current.message_id =>
        {
            Ok(settle(current, queued, CONNECTION_TROUBLE_REPLY.to_string()))
        }

        (_, Event::ReplyReady { in_reply_to, .. } | Event::ReplyFailed { in_reply_to, .. }) => {
            Err(TransitionError::UnexpectedReply(in_reply_to))
        }
    }
}

/// Append the reply for `current`, then start the next queued turn or go idle
fn settle(current: &PendingTurn, queued: &VecDeque<PendingTurn>, text: String) -> TransitionResult {
    let reply = Effect::persist_assistant_message(&current.message_id, text);
    let mut queued = queued.clone();

    match queued.pop_front() {
        Some(next) => TransitionResult::new(ConvState::AwaitingReply {
            current: next.clone(),
            queued,
        })
        .with_effect(reply)
        .with_effect(Effect::PersistState)
        .with_effect(Effect::RequestReply { turn: next }),
        None => TransitionResult::new(ConvState::Idle)
            .with_effect(reply)
            .with_effect(Effect::PersistState)
            .with_effect(Effect::NotifyReplyDone),
    }
}
