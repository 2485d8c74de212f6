//! Core shopping conversation state machine
//!
//! Implements the Elm Architecture pattern: an oracle [`Decision`] is
//! applied to a [`SessionState`] by a pure function that returns the next
//! state plus the [`Effect`]s the runtime still has to perform.

pub mod decision;
mod effect;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use decision::{Decision, DecisionError, RequiredAction};
pub use effect::Effect;
pub use state::{Evaluation, ImageData, Message, Phase, Product, Role, SessionState, TryOnResult};
pub use transition::transition;
