//! Trait abstractions for runtime I/O
//!
//! The runtime only sees these seams, so tests can drive it with scripted
//! collaborators.

use crate::oracle::{OracleError, OracleRequest};
use crate::state_machine::Decision;
use async_trait::async_trait;
use std::sync::Arc;

/// Pluggable source of decisions
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn decide(&self, request: &OracleRequest) -> Result<Decision, OracleError>;
}

#[async_trait]
impl<T: DecisionOracle + ?Sized> DecisionOracle for Arc<T> {
    async fn decide(&self, request: &OracleRequest) -> Result<Decision, OracleError> {
        (**self).decide(request).await
    }
}
