//! Property-based tests for the state machine
//!
//! Drives random interleavings of submissions and settled replies through
//! `transition` and checks the log the effects would build.

use super::transition::TransitionError;
use super::*;
use crate::message::Sender;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Submit(String),
    /// Settle the turn in flight, successfully or not
    Settle(bool),
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-zA-Z?]{1,12}",
        1 => "[ \t]{0,4}",
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        arb_text().prop_map(Step::Submit),
        any::<bool>().prop_map(Step::Settle),
    ]
}

/// Log entries as (sender, `in_reply_to`, id)
type Log = Vec<(Sender, Option<String>, String)>;

fn apply(state: &mut ConvState, log: &mut Log, requested: &mut Vec<String>, event: Event) {
    if let Ok(result) = transition(state, &ConvContext::new("prop"), event) {
        *state = result.new_state;
        for effect in result.effects {
            match effect {
                Effect::PersistMessage {
                    message_id,
                    sender,
                    in_reply_to,
                    ..
                } => log.push((sender, in_reply_to, message_id)),
                Effect::RequestReply { turn } => requested.push(turn.message_id),
                Effect::PersistState | Effect::NotifyReplyDone => {}
            }
        }
    }
}

fn settle_event(state: &ConvState, ok: bool) -> Option<Event> {
    let ConvState::AwaitingReply { current, .. } = state else {
        return None;
    };
    let in_reply_to = current.message_id.clone();
    Some(if ok {
        Event::ReplyReady {
            in_reply_to,
            text: "reply".to_string(),
        }
    } else {
        Event::ReplyFailed {
            in_reply_to,
            error: "boom".to_string(),
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_every_submission_gets_exactly_one_reply_in_order(
        steps in proptest::collection::vec(arb_step(), 0..40)
    ) {
        let mut state = ConvState::Idle;
        let mut log = Log::new();
        let mut requested = Vec::new();
        let mut accepted = 0usize;

        for (i, step) in steps.into_iter().enumerate() {
            match step {
                Step::Submit(text) => {
                    let before = log.len();
                    let blank = text.trim().is_empty();
                    apply(&mut state, &mut log, &mut requested, Event::UserMessage {
                        text,
                        message_id: format!("m{i}"),
                    });
                    if blank {
                        prop_assert_eq!(log.len(), before);
                    } else {
                        prop_assert_eq!(log.len(), before + 1);
                        accepted += 1;
                    }
                }
                Step::Settle(ok) => {
                    if let Some(event) = settle_event(&state, ok) {
                        apply(&mut state, &mut log, &mut requested, event);
                    }
                }
            }
            // Never more than one resolution in flight
            let in_flight = requested.len()
                - log.iter().filter(|(s, _, _)| *s == Sender::Assistant).count();
            prop_assert!(in_flight <= 1);
        }

        // Drain whatever is still owed
        while let Some(event) = settle_event(&state, true) {
            apply(&mut state, &mut log, &mut requested, event);
        }

        prop_assert_eq!(state, ConvState::Idle);

        let users: Vec<&String> = log.iter().filter(|(s, _, _)| *s == Sender::User).map(|(_, _, id)| id).collect();
        let replies: Vec<&String> = log
            .iter()
            .filter(|(s, _, _)| *s == Sender::Assistant)
            .filter_map(|(_, to, _)| to.as_ref())
            .collect();

        prop_assert_eq!(users.len(), accepted);
        prop_assert_eq!(replies.len(), accepted);
        // Replies answer user messages in submission order
        prop_assert_eq!(&users, &replies);
        prop_assert_eq!(requested.len(), accepted);
    }

    #[test]
    fn prop_blank_never_changes_state(ws in "[ \t\n]{0,8}", busy in any::<bool>()) {
        let mut state = ConvState::Idle;
        if busy {
            state = transition(&state, &ConvContext::new("prop"), Event::UserMessage {
                text: "hi".to_string(),
                message_id: "m0".to_string(),
            }).unwrap().new_state;
        }
        let result = transition(&state, &ConvContext::new("prop"), Event::UserMessage {
            text: ws,
            message_id: "m1".to_string(),
        });
        prop_assert_eq!(result.unwrap_err(), TransitionError::EmptyMessage);
    }
}
