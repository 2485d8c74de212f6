//! Mock implementations for testing
//!
//! These mocks let the runtime, oracle and executors run without real I/O.

use super::executor::ShoppingRuntime;
use super::traits::DecisionOracle;
use crate::llm::{ContentBlock, LlmError, LlmRequest, LlmResponse, LlmService, Usage};
use crate::locale::Locale;
use crate::oracle::{OracleError, OracleRequest};
use crate::state_machine::{Decision, ImageData, Product, SessionState};
use crate::tools::{StaticEvaluator, Tool, ToolError, TryOnRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Smallest payloads that pass magic-byte sniffing
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\x0d";
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

pub type TestRuntime = ShoppingRuntime<ScriptedOracle, StubSearch, StubRenderer, StaticEvaluator>;

/// Fresh Japanese-locale session driven by the given mocks
pub fn test_runtime(
    oracle: ScriptedOracle,
    search: StubSearch,
    renderer: StubRenderer,
) -> TestRuntime {
    let locale = Locale::Ja;
    ShoppingRuntime::new(
        SessionState::new("test-session", locale.greeting()),
        locale,
        oracle,
        search,
        renderer,
        StaticEvaluator::new(locale),
    )
}

// ============================================================================
// Mock LLM Service
// ============================================================================

/// LLM service that answers every request with the same canned result
pub struct RecordingLlm {
    response: Result<LlmResponse, LlmError>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl RecordingLlm {
    fn new(response: Result<LlmResponse, LlmError>) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_text(text: &str) -> Self {
        Self::new(Ok(LlmResponse {
            content: vec![ContentBlock::text(text)],
            usage: Usage::default(),
        }))
    }

    pub fn with_image(image: ImageData) -> Self {
        Self::new(Ok(LlmResponse {
            content: vec![ContentBlock::text("done"), ContentBlock::image(image)],
            usage: Usage::default(),
        }))
    }

    pub fn failing(error: LlmError) -> Self {
        Self::new(Err(error))
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for RecordingLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.response.clone()
    }

    fn model_id(&self) -> &str {
        "recording-mock"
    }
}

// ============================================================================
// Scripted Oracle
// ============================================================================

/// Oracle that replays queued decisions; an empty queue is a failure
#[derive(Clone, Default)]
pub struct ScriptedOracle {
    script: Arc<Mutex<VecDeque<Result<Decision, OracleError>>>>,
    requests: Arc<Mutex<Vec<OracleRequest>>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, decision: Decision) -> Self {
        self.script.lock().unwrap().push_back(Ok(decision));
        self
    }

    pub fn then_err(self, error: OracleError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DecisionOracle for ScriptedOracle {
    async fn decide(&self, request: &OracleRequest) -> Result<Decision, OracleError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(OracleError::EmptyResponse))
    }
}

// ============================================================================
// Stub Executors
// ============================================================================

/// Search executor with a fixed outcome; records every query
#[derive(Clone)]
pub struct StubSearch {
    outcome: Result<Vec<Product>, ToolError>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl StubSearch {
    /// Succeeds with no products
    pub fn new() -> Self {
        Self {
            outcome: Ok(Vec::new()),
            queries: Arc::default(),
        }
    }

    pub fn returning(mut self, products: Vec<Product>) -> Self {
        self.outcome = Ok(products);
        self
    }

    pub fn failing(mut self, error: ToolError) -> Self {
        self.outcome = Err(error);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for StubSearch {
    type Input = String;
    type Output = Vec<Product>;

    fn name(&self) -> &'static str {
        "stub_search"
    }

    async fn run(&self, query: String) -> Result<Vec<Product>, ToolError> {
        self.queries.lock().unwrap().push(query);
        self.outcome.clone()
    }
}

/// Try-on renderer with a fixed outcome; records every request
#[derive(Clone)]
pub struct StubRenderer {
    outcome: Result<ImageData, ToolError>,
    requests: Arc<Mutex<Vec<TryOnRequest>>>,
}

impl StubRenderer {
    /// Renders a fixed JPEG
    pub fn new() -> Self {
        Self {
            outcome: Ok(ImageData::new("image/jpeg", JPEG_BYTES.to_vec())),
            requests: Arc::default(),
        }
    }

    pub fn returning(mut self, image: ImageData) -> Self {
        self.outcome = Ok(image);
        self
    }

    pub fn failing(mut self, error: ToolError) -> Self {
        self.outcome = Err(error);
        self
    }

    pub fn requests(&self) -> Vec<TryOnRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for StubRenderer {
    type Input = TryOnRequest;
    type Output = ImageData;

    fn name(&self) -> &'static str {
        "stub_renderer"
    }

    async fn run(&self, request: TryOnRequest) -> Result<ImageData, ToolError> {
        self.requests.lock().unwrap().push(request);
        self.outcome.clone()
    }
}
