//! Decisions produced by the oracle
//!
//! A [`Decision`] is validated against the closed [`Phase`] and
//! [`RequiredAction`] sets while it is decoded, so an unknown control value
//! never reaches the state machine.

use super::state::Phase;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side effect the runtime must perform after a decision is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequiredAction {
    #[default]
    None,
    AskImage,
    CallSearchTool,
    CallVtonTool,
    CallEvalTool,
}

impl RequiredAction {
    pub const ALL: [RequiredAction; 5] = [
        RequiredAction::None,
        RequiredAction::AskImage,
        RequiredAction::CallSearchTool,
        RequiredAction::CallVtonTool,
        RequiredAction::CallEvalTool,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RequiredAction::None => "NONE",
            RequiredAction::AskImage => "ASK_IMAGE",
            RequiredAction::CallSearchTool => "CALL_SEARCH_TOOL",
            RequiredAction::CallVtonTool => "CALL_VTON_TOOL",
            RequiredAction::CallEvalTool => "CALL_EVAL_TOOL",
        }
    }
}

/// Optional tool arguments chosen by the oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ToolParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vton_prompt: Option<String>,
}

/// Structured output of one oracle call. Immutable once received.
///
/// Field names follow the oracle's wire schema; every field except
/// `tool_parameters` is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "thought")]
    pub rationale: String,
    pub user_message: String,
    #[serde(rename = "current_phase")]
    pub phase: Phase,
    #[serde(rename = "required_action")]
    pub action: RequiredAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_parameters: Option<ToolParameters>,
}

/// Decoding failure for a raw oracle payload
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("Decision payload is not valid JSON: {0}")]
    Syntax(String),
    #[error("Decision violates schema: {0}")]
    Schema(String),
}

impl Decision {
    pub fn new(phase: Phase, action: RequiredAction, user_message: impl Into<String>) -> Self {
        Self {
            rationale: String::new(),
            user_message: user_message.into(),
            phase,
            action,
            tool_parameters: None,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    #[cfg(test)]
    pub fn with_search_query(mut self, query: impl Into<String>) -> Self {
        self.tool_parameters
            .get_or_insert_with(ToolParameters::default)
            .search_query = Some(query.into());
        self
    }

    #[cfg(test)]
    pub fn with_vton_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.tool_parameters
            .get_or_insert_with(ToolParameters::default)
            .vton_prompt = Some(prompt.into());
        self
    }

    /// Safe decision used when the oracle fails: keeps the phase, runs nothing
    pub fn fallback(current_phase: Phase, apology: impl Into<String>) -> Self {
        Self::new(current_phase, RequiredAction::None, apology)
            .with_rationale("oracle unavailable; fallback decision")
    }

    /// Decode and validate a raw oracle payload.
    ///
    /// Unknown `current_phase`/`required_action` values and missing mandatory
    /// fields are schema violations.
    pub fn from_json(raw: &str) -> Result<Self, DecisionError> {
        serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
            if e.is_syntax() || e.is_eof() {
                DecisionError::Syntax(e.to_string())
            } else {
                DecisionError::Schema(e.to_string())
            }
        })
    }

    /// Search query chosen by the oracle, if it is non-blank
    pub fn search_query(&self) -> Option<&str> {
        self.tool_parameters
            .as_ref()
            .and_then(|p| p.search_query.as_deref())
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// Models occasionally wrap JSON mode output in a markdown fence
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}
