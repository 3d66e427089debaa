//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::{APOLOGY_TEXT, NO_RESPONSE_TEXT};
use super::*;
use crate::history::{SessionIdentity, Turn};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

/// Drives the pure transition function the way the runtime does, minus I/O
#[derive(Debug, Default)]
struct Model {
    state: ChatState,
    context: ChatContext,
    history: Vec<Turn>,
    input: String,
    requests: usize,
    archived: usize,
}

impl Model {
    fn apply(&mut self, event: Event) -> Result<(), TransitionError> {
        let result = transition(&self.state, &self.context, event)?;
        self.state = result.new_state;
        for effect in result.effects {
            match effect {
                Effect::SetIdentity { identity } => self.context.identity = identity,
                Effect::ReplaceHistory { turns } => self.history = turns,
                Effect::SetInput { text } => self.input = text,
                Effect::ClearInput => self.input.clear(),
                Effect::RequestReply { .. } => self.requests += 1,
                Effect::AppendTurn { turn } => self.history.push(turn),
                Effect::ArchiveTurn { .. } => self.archived += 1,
                Effect::LoadHistory | Effect::PersistHistory => {}
            }
        }
        Ok(())
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_identity() -> impl Strategy<Value = Option<SessionIdentity>> {
    prop::option::of("[a-z]{1,8}@example\\.com".prop_map(SessionIdentity::new))
}

fn arb_blank() -> impl Strategy<Value = String> {
    "[ \t\n]{0,6}"
}

fn arb_text() -> impl Strategy<Value = String> {
    "[ ]{0,2}[a-zA-Z0-9?!]{1,20}[ \n]{0,2}"
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_identity().prop_map(|identity| Event::IdentityResolved { identity }),
        Just(Event::HistoryLoaded { turns: vec![] }),
        arb_text().prop_map(|text| Event::InputChanged { text }),
        arb_text().prop_map(|text| Event::Submit { text }),
        arb_blank().prop_map(|text| Event::Submit { text }),
        prop::option::of("[a-z ]{0,10}").prop_map(|text| Event::ReplyReceived {
            text,
            at: Utc::now(),
        }),
        "[a-z ]{1,10}".prop_map(|message| Event::ReplyFailed {
            message,
            at: Utc::now(),
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Non-empty input grows history by exactly one once the reply settles
    #[test]
    fn prop_accepted_submit_appends_one_turn(
        text in arb_text(),
        reply in prop::option::of("[a-z]{0,10}"),
        fail in any::<bool>(),
    ) {
        let mut model = Model::default();
        model.apply(Event::Submit { text: text.clone() }).unwrap();
        prop_assert!(model.state.is_sending());
        prop_assert!(model.input.is_empty());

        let at = Utc.timestamp_opt(0, 0).unwrap();
        let settle = if fail {
            Event::ReplyFailed { message: "boom".to_string(), at }
        } else {
            Event::ReplyReceived { text: reply.clone(), at }
        };
        model.apply(settle).unwrap();

        prop_assert_eq!(model.state.clone(), ChatState::Idle);
        prop_assert_eq!(model.history.len(), 1);
        prop_assert_eq!(model.history[0].user_input.as_str(), text.trim());

        let expected = if fail {
            APOLOGY_TEXT.to_string()
        } else {
            reply
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string())
        };
        prop_assert_eq!(model.history[0].response.clone(), expected);
    }

    // Blank input never changes anything and never reaches the network
    #[test]
    fn prop_blank_submit_is_noop(text in arb_blank(), typed in arb_text()) {
        let mut model = Model::default();
        model.apply(Event::InputChanged { text: typed.clone() }).unwrap();

        prop_assert_eq!(
            model.apply(Event::Submit { text }),
            Err(TransitionError::EmptyInput)
        );
        prop_assert_eq!(model.state.clone(), ChatState::Idle);
        prop_assert_eq!(model.requests, 0);
        prop_assert_eq!(model.input.clone(), typed);
    }

    // Repeated submits while sending never double-append
    #[test]
    fn prop_no_double_submit(first in arb_text(), extra in prop::collection::vec(arb_text(), 1..5)) {
        let mut model = Model::default();
        model.apply(Event::Submit { text: first }).unwrap();

        for text in extra {
            prop_assert_eq!(
                model.apply(Event::Submit { text }),
                Err(TransitionError::AlreadySending)
            );
        }
        prop_assert_eq!(model.requests, 1);

        model
            .apply(Event::ReplyReceived { text: Some("ok".to_string()), at: Utc::now() })
            .unwrap();
        prop_assert_eq!(model.history.len(), 1);
    }

    // Under any event sequence: history only grows by appends (once an
    // identity load has replaced it), every request settles into exactly one
    // turn, and archived turns never outnumber settled ones
    #[test]
    fn prop_random_sequences_keep_invariants(events in prop::collection::vec(arb_event(), 0..40)) {
        let mut model = Model::default();
        let mut settled = 0usize;

        for event in events {
            let before = model.history.clone();
            let was_sending = model.state.is_sending();
            let replaces = matches!(
                (&model.state, &event),
                (ChatState::Idle | ChatState::LoadingHistory, Event::IdentityResolved { .. })
                    | (ChatState::LoadingHistory, Event::HistoryLoaded { .. })
            );

            if model.apply(event).is_err() {
                prop_assert_eq!(&model.history, &before);
                continue;
            }

            if replaces {
                continue;
            }

            if was_sending && !model.state.is_sending() {
                prop_assert_eq!(model.history.len(), before.len() + 1);
                prop_assert_eq!(&model.history[..before.len()], &before[..]);
                settled += 1;
            } else {
                prop_assert_eq!(&model.history, &before);
            }
        }

        prop_assert!(model.archived <= settled);
        let in_flight = usize::from(model.state.is_sending());
        prop_assert_eq!(model.requests, settled + in_flight);
    }
}
