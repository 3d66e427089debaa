//! Pure state transition function

use super::{ChatContext, ChatState, Effect, Event};
use crate::backend::format_prompt;
use crate::history::Turn;
use thiserror::Error;

/// Substituted when a reply carries no text or an empty string
pub const NO_RESPONSE_TEXT: &str = "No response";

/// Substituted when the primary exchange fails for any reason
pub const APOLOGY_TEXT: &str = "Sorry, I encountered an error. Please try again later.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Rejected events. The runtime treats all of these as no-ops.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Input is empty")]
    EmptyInput,
    #[error("A message is already being sent")]
    AlreadySending,
    #[error("History is still loading")]
    HistoryLoading,
    #[error("Session is busy, identity change ignored")]
    Busy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs this always produces the same outputs. Timestamps
/// arrive on the events, so no clock is read here.
pub fn transition(
    state: &ChatState,
    context: &ChatContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Input buffer tracks keystrokes in every state
        (_, Event::InputChanged { text }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::SetInput { text }))
        }

        // ============================================================
        // History loading
        // ============================================================
        (ChatState::Sending { .. }, Event::IdentityResolved { .. }) => Err(TransitionError::Busy),

        (
            ChatState::Idle | ChatState::LoadingHistory,
            Event::IdentityResolved {
                identity: Some(identity),
            },
        ) => Ok(TransitionResult::new(ChatState::LoadingHistory).with_effects([
            Effect::SetIdentity {
                identity: Some(identity),
            },
            Effect::LoadHistory,
        ])),

        // No identity: nothing to read, straight back to idle
        (ChatState::Idle | ChatState::LoadingHistory, Event::IdentityResolved { identity: None }) => {
            Ok(TransitionResult::new(ChatState::Idle).with_effects([
                Effect::SetIdentity { identity: None },
                Effect::ReplaceHistory { turns: vec![] },
            ]))
        }

        (ChatState::LoadingHistory, Event::HistoryLoaded { turns }) => {
            Ok(TransitionResult::new(ChatState::Idle).with_effect(Effect::ReplaceHistory { turns }))
        }

        // ============================================================
        // Submitting
        // ============================================================
        (ChatState::Idle, Event::Submit { text }) => {
            let user_input = text.trim();
            if user_input.is_empty() {
                return Err(TransitionError::EmptyInput);
            }

            let prompt = format_prompt(user_input);
            Ok(TransitionResult::new(ChatState::Sending {
                user_input: user_input.to_string(),
            })
            .with_effect(Effect::ClearInput)
            .with_effect(Effect::request_reply(prompt)))
        }

        (ChatState::Sending { .. }, Event::Submit { .. }) => Err(TransitionError::AlreadySending),

        (ChatState::LoadingHistory, Event::Submit { .. }) => Err(TransitionError::HistoryLoading),

        // ============================================================
        // Settling the exchange: exactly one turn either way
        // ============================================================
        (ChatState::Sending { user_input }, Event::ReplyReceived { text, at }) => {
            let response = text
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string());
            let turn = Turn::new(user_input.clone(), response, at);

            let archive = context.identity.clone().map(|identity| Effect::ArchiveTurn {
                identity,
                turn: turn.clone(),
            });

            Ok(TransitionResult::new(ChatState::Idle)
                .with_effect(Effect::append_turn(turn))
                .with_effect(Effect::PersistHistory)
                .with_effects(archive))
        }

        (ChatState::Sending { user_input }, Event::ReplyFailed { at, .. }) => {
            let turn = Turn::new(user_input.clone(), APOLOGY_TEXT, at);
            Ok(TransitionResult::new(ChatState::Idle)
                .with_effect(Effect::append_turn(turn))
                .with_effect(Effect::PersistHistory))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{} in state {}",
            event.name(),
            state.name()
        ))),
    }
}
