//! Decision oracle
//!
//! Turns the conversation so far plus the current user turn into a
//! validated [`Decision`]. The Gemini adapter asks for JSON under a fixed
//! response schema; anything that does not decode into the closed
//! phase/action sets is an [`OracleError`].

mod prompt;

use crate::llm::{ContentBlock, LlmError, LlmMessage, LlmRequest, LlmService};
use crate::locale::Locale;
use crate::runtime::DecisionOracle;
use crate::state_machine::{Decision, DecisionError, ImageData, Message, Role};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

const DECISION_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("oracle transport failed: {0}")]
    Transport(#[from] LlmError),

    #[error("oracle returned an invalid decision: {0}")]
    InvalidDecision(String),

    #[error("oracle returned no text")]
    EmptyResponse,
}

impl From<DecisionError> for OracleError {
    fn from(e: DecisionError) -> Self {
        OracleError::InvalidDecision(e.to_string())
    }
}

/// One prior message as the oracle sees it: role and text, no attachments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}

/// The turn being decided
#[derive(Debug, Clone, PartialEq)]
pub struct UserTurn {
    pub text: String,
    pub image: Option<ImageData>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub history: Vec<HistoryEntry>,
    pub turn: UserTurn,
}

impl OracleRequest {
    /// Strip attachments from `history`; only the current turn carries an image
    pub fn new(history: &[Message], turn: UserTurn) -> Self {
        Self {
            history: history
                .iter()
                .map(|m| HistoryEntry {
                    role: m.role,
                    text: m.text.clone(),
                })
                .collect(),
            turn,
        }
    }
}

/// Oracle backed by a JSON-mode Gemini model
pub struct GeminiOracle {
    llm: Arc<dyn LlmService>,
    system_instruction: String,
}

impl GeminiOracle {
    pub fn new(llm: Arc<dyn LlmService>, locale: Locale) -> Self {
        Self {
            llm,
            system_instruction: prompt::system_instruction(locale),
        }
    }

    fn build_request(&self, request: &OracleRequest) -> LlmRequest {
        let mut messages: Vec<LlmMessage> = request
            .history
            .iter()
            .filter(|entry| !entry.text.is_empty())
            .map(|entry| match entry.role {
                Role::User => LlmMessage::user_text(entry.text.clone()),
                Role::Assistant => LlmMessage::assistant_text(entry.text.clone()),
            })
            .collect();

        let mut turn = vec![ContentBlock::text(request.turn.text.clone())];
        if let Some(image) = &request.turn.image {
            turn.push(ContentBlock::image(image.clone()));
        }
        messages.push(LlmMessage::user(turn));

        LlmRequest::new(messages)
            .with_system(self.system_instruction.clone())
            .with_json_schema(prompt::decision_schema())
            .with_temperature(DECISION_TEMPERATURE)
    }
}

#[async_trait]
impl DecisionOracle for GeminiOracle {
    async fn decide(&self, request: &OracleRequest) -> Result<Decision, OracleError> {
        let response = self.llm.complete(&self.build_request(request)).await?;

        let text = response.text();
        if text.trim().is_empty() {
            return Err(OracleError::EmptyResponse);
        }

        let decision = Decision::from_json(&text)?;
        tracing::debug!(
            phase = %decision.phase,
            action = decision.action.as_str(),
            rationale = %decision.rationale,
            "Oracle decision"
        );
        Ok(decision)
    }
}
