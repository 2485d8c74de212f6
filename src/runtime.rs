//! Session runtime
//!
//! One [`ShoppingRuntime`] owns one [`SessionState`] and is its only
//! mutator. The [`SessionManager`] keeps every live session and hands the
//! HTTP layer a lock per session plus read-only views of its state.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{ShoppingRuntime, UiAction};
pub use traits::*;

use crate::llm::LlmService;
use crate::locale::Locale;
use crate::oracle::GeminiOracle;
use crate::state_machine::{Phase, SessionState};
use crate::tools::{FitEvaluator, GeminiProductSearch, GeminiTryOn, StaticEvaluator};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex, RwLock};

/// Runtime wired to the live providers
pub type ProductionRuntime = ShoppingRuntime<
    Arc<dyn DecisionOracle>,
    Arc<GeminiProductSearch>,
    Arc<GeminiTryOn>,
    Arc<dyn FitEvaluator>,
>;

const EVENT_CHANNEL_CAPACITY: usize = 64;
const DEFAULT_IDLE_TIMEOUT_MINUTES: i64 = 60;

/// Where a failure was swallowed and replaced with fallback content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPoint {
    Oracle,
    Search,
    TryOn,
}

/// Operator-facing record of a suppressed failure
#[derive(Debug, Clone, Serialize)]
pub struct FallbackEvent {
    pub session_id: String,
    pub point: FallbackPoint,
    pub detail: String,
    pub at: DateTime<Utc>,
}

/// Events published to session subscribers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// State after a checkpoint
    Snapshot(Arc<SessionState>),
    PhaseChanged { from: Phase, to: Phase },
    Fallback(FallbackEvent),
}

/// Read-only views of a session that never wait on an in-flight turn
#[derive(Clone)]
pub struct SessionHandle {
    pub runtime: Arc<Mutex<ProductionRuntime>>,
    snapshots: watch::Receiver<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// State as of the last checkpoint
    pub fn snapshot(&self) -> SessionState {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Time of the newest message in the last checkpoint
    fn last_activity(&self) -> DateTime<Utc> {
        self.snapshots
            .borrow()
            .last_message()
            .map_or(DateTime::<Utc>::MIN_UTC, |m| m.created_at)
    }

    fn is_running(&self) -> bool {
        self.runtime.try_lock().is_err()
    }
}

/// Live provider clients shared by every session
#[derive(Clone)]
pub struct Providers {
    pub decision: Arc<dyn LlmService>,
    pub search: Arc<dyn LlmService>,
    pub image: Arc<dyn LlmService>,
    pub search_results: usize,
}

/// Manager for all session runtimes.
///
/// Sessions live in memory only. Idle ones are swept whenever a new session
/// is created, so the map stays bounded by recent traffic.
pub struct SessionManager {
    locale: Locale,
    oracle: Arc<dyn DecisionOracle>,
    search: Arc<GeminiProductSearch>,
    renderer: Arc<GeminiTryOn>,
    evaluator: Arc<dyn FitEvaluator>,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(providers: Providers, locale: Locale) -> Self {
        Self {
            locale,
            oracle: Arc::new(GeminiOracle::new(providers.decision, locale)),
            search: Arc::new(GeminiProductSearch::new(providers.search, providers.search_results)),
            renderer: Arc::new(GeminiTryOn::new(providers.image)),
            evaluator: Arc::new(StaticEvaluator::new(locale)),
            idle_timeout: Duration::minutes(DEFAULT_IDLE_TIMEOUT_MINUTES),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Start a fresh session and return its handle
    pub async fn create(&self) -> SessionHandle {
        self.prune_idle(Utc::now()).await;

        let id = uuid::Uuid::new_v4().to_string();
        let runtime = ShoppingRuntime::new(
            SessionState::new(&id, self.locale.greeting()),
            self.locale,
            self.oracle.clone(),
            self.search.clone(),
            self.renderer.clone(),
            self.evaluator.clone(),
        );

        let handle = SessionHandle {
            snapshots: runtime.watch(),
            events: runtime.event_sender(),
            runtime: Arc::new(Mutex::new(runtime)),
        };

        self.sessions
            .write()
            .await
            .insert(id.clone(), handle.clone());
        tracing::info!(session_id = %id, "Created session");
        handle
    }

    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop sessions with no message newer than the idle timeout.
    ///
    /// A session with a turn in flight is kept whatever its age. Returns the
    /// number of sessions dropped.
    pub async fn prune_idle(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.idle_timeout;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| handle.is_running() || handle.last_activity() > cutoff);

        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
        pruned
    }
}
