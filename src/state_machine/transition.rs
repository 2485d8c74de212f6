//! Pure state transition function
//!
//! The oracle is the sole authority for phase logic. `transition` never
//! re-derives a phase; it executes the decision and does the bookkeeping
//! around it.

use super::{Decision, Effect, Message, RequiredAction, SessionState};

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Search query requested by this transition, if any
    #[cfg(test)]
    pub fn search_query(&self) -> Option<&str> {
        self.effects.iter().find_map(|e| match e {
            Effect::RunSearch { query } => Some(query.as_str()),
            _ => None,
        })
    }
}

/// Apply an oracle decision to the session.
///
/// Given the same inputs this always produces the same state and effects,
/// with no I/O. The `busy` flag and the upload affordance are left to the
/// runtime, which owns the turn lifecycle.
pub fn transition(state: &SessionState, decision: Decision) -> TransitionResult {
    let mut new_state = state.clone();
    new_state.push(Message::assistant(decision.user_message.clone()));
    new_state.phase = decision.phase;

    let phase_effect = (state.phase != decision.phase).then_some(Effect::NotifyPhaseChange {
        from: state.phase,
        to: decision.phase,
    });

    let action_effect = match decision.action {
        RequiredAction::AskImage => Some(Effect::RequestImage),
        RequiredAction::CallSearchTool => Some(Effect::run_search(search_query(state, &decision))),
        // Try-on only runs from an explicit UI gesture (`invoke_action`),
        // never automatically from an oracle decision.
        RequiredAction::CallVtonTool | RequiredAction::CallEvalTool | RequiredAction::None => None,
    };

    TransitionResult::new(new_state).with_effects(phase_effect.into_iter().chain(action_effect))
}

/// Oracle query, else the latest user text, else the latest message text
fn search_query(state: &SessionState, decision: &Decision) -> String {
    decision
        .search_query()
        .or_else(|| state.last_user_text())
        .or_else(|| state.last_message().map(|m| m.text.as_str()))
        .unwrap_or_default()
        .to_string()
}
