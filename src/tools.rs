//! Tool executors
//!
//! Each executor wraps one external capability behind the same
//! `run(input) -> Result<Output, ToolError>` contract. Executors never retry;
//! a single failure is terminal and the runtime picks the fallback.

mod evaluation;
mod search;
mod try_on;

pub use evaluation::{FitEvaluator, StaticEvaluator};
pub use search::{placeholder_products, GeminiProductSearch};
pub use try_on::{GeminiTryOn, TryOnRequest};

use crate::llm::LlmError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a single tool run
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("provider error: {0}")]
    Provider(#[from] LlmError),

    #[error("malformed provider output: {0}")]
    MalformedOutput(String),

    #[error("undecodable image: {0}")]
    UndecodableImage(String),

    #[error("provider returned no image")]
    NoImageReturned,
}

/// Uniform executor contract
#[async_trait]
pub trait Tool: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    /// Name used in logs and failure events
    fn name(&self) -> &'static str;

    async fn run(&self, input: Self::Input) -> Result<Self::Output, ToolError>;
}

#[async_trait]
impl<T: Tool + ?Sized> Tool for Arc<T> {
    type Input = T::Input;
    type Output = T::Output;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn run(&self, input: Self::Input) -> Result<Self::Output, ToolError> {
        (**self).run(input).await
    }
}
