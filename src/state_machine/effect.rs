//! Effects produced by state transitions

use crate::state_machine::state::Phase;

/// Obligations the runtime must resolve after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Surface the "please upload a photo" affordance
    RequestImage,

    /// Run the search executor and fold its products into a new message
    RunSearch { query: String },

    /// Tell subscribers the phase moved
    NotifyPhaseChange { from: Phase, to: Phase },
}

impl Effect {
    pub fn run_search(query: impl Into<String>) -> Self {
        Effect::RunSearch {
            query: query.into(),
        }
    }
}
