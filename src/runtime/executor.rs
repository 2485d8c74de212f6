//! Session runtime executor

use super::traits::DecisionOracle;
use super::{FallbackEvent, FallbackPoint, SessionEvent, EVENT_CHANNEL_CAPACITY};

use crate::locale::Locale;
use crate::oracle::{OracleRequest, UserTurn};
use crate::state_machine::{
    transition, Decision, Effect, ImageData, Message, Product, SessionState, TryOnResult,
};
use crate::tools::{placeholder_products, FitEvaluator, Tool, TryOnRequest};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Direct actions the UI may trigger without consulting the oracle
#[derive(Debug, Clone)]
pub enum UiAction {
    TryOn { product: Product },
}

/// Generic runtime that can work with any oracle, executor and evaluator
pub struct ShoppingRuntime<O, S, R, E>
where
    O: DecisionOracle,
    S: Tool<Input = String, Output = Vec<Product>>,
    R: Tool<Input = TryOnRequest, Output = ImageData>,
    E: FitEvaluator,
{
    state: SessionState,
    locale: Locale,
    oracle: O,
    search: S,
    renderer: R,
    evaluator: E,
    snapshot_tx: watch::Sender<SessionState>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl<O, S, R, E> ShoppingRuntime<O, S, R, E>
where
    O: DecisionOracle,
    S: Tool<Input = String, Output = Vec<Product>>,
    R: Tool<Input = TryOnRequest, Output = ImageData>,
    E: FitEvaluator,
{
    pub fn new(
        state: SessionState,
        locale: Locale,
        oracle: O,
        search: S,
        renderer: R,
        evaluator: E,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(state.clone());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state,
            locale,
            oracle,
            search,
            renderer,
            evaluator,
            snapshot_tx,
            event_tx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Watch the state as of each checkpoint
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.snapshot_tx.subscribe()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<SessionEvent> {
        self.event_tx.clone()
    }

    /// Process one user turn to completion.
    ///
    /// Always returns with `busy` cleared; oracle and search failures are
    /// replaced by fallback content.
    pub async fn submit_user_turn(&mut self, text: String, image: Option<ImageData>) {
        let session_id = self.state.id.clone();
        tracing::info!(
            session_id = %session_id,
            phase = %self.state.phase,
            has_image = image.is_some(),
            "User turn"
        );

        self.state.busy = true;
        let text = if text.trim().is_empty() && image.is_some() {
            self.locale.photo_upload_caption().to_string()
        } else {
            text
        };

        let history_len = self.state.messages.len();
        self.state.push(Message::user(text.clone(), image.clone()));
        if let Some(image) = &image {
            self.state.reference_image = Some(image.clone());
            self.state.upload_requested = false;
        }
        self.checkpoint();

        let turn = UserTurn { text, image };
        let request = OracleRequest::new(&self.state.messages[..history_len], turn);
        let decision = match self.oracle.decide(&request).await {
            Ok(decision) => decision,
            Err(e) => {
                self.report_fallback(FallbackPoint::Oracle, e.to_string());
                Decision::fallback(self.state.phase, self.locale.apology())
            }
        };

        let result = transition(&self.state, decision);
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect).await;
        }

        self.state.busy = false;
        self.checkpoint();
    }

    /// Handle a UI-triggered action, bypassing the oracle
    pub async fn invoke_action(&mut self, action: UiAction) {
        match action {
            UiAction::TryOn { product } => self.try_on(product).await,
        }
    }

    async fn try_on(&mut self, product: Product) {
        let session_id = self.state.id.clone();

        let Some(reference) = self.state.reference_image.clone() else {
            tracing::info!(
                session_id = %session_id,
                product = %product.name,
                "Try-on requested without a reference image"
            );
            let text = self.locale.ask_photo_for_try_on();
            self.state.push(Message::assistant(text));
            self.state.upload_requested = true;
            self.checkpoint();
            return;
        };

        let request = self.locale.try_on_request(&product.name);
        self.state.push(Message::user(request, None));
        self.state.busy = true;
        self.checkpoint();

        let request = TryOnRequest::for_product(reference.clone(), &product);
        let rendered = match self.renderer.run(request).await {
            Ok(image) => image,
            Err(e) => {
                let detail = format!("{}: {e}", self.renderer.name());
                self.report_fallback(FallbackPoint::TryOn, detail);
                reference
            }
        };

        let evaluation = self.evaluator.evaluate(&rendered, &product).await;
        let text = self.locale.try_on_ready(&product.name);
        let result = TryOnResult::new(rendered, evaluation);
        let reply = Message::assistant(text).with_try_on(result);
        self.state.push(reply);

        self.state.busy = false;
        self.checkpoint();
    }

    async fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::NotifyPhaseChange { from, to } => {
                tracing::info!(session_id = %self.state.id, %from, %to, "Phase changed");
                self.publish(SessionEvent::PhaseChanged { from, to });
            }

            Effect::RequestImage => {
                self.state.upload_requested = true;
            }

            Effect::RunSearch { query } => {
                self.state.upload_requested = false;
                // Let subscribers see the oracle's reply while the search runs
                self.checkpoint();

                tracing::info!(
                    session_id = %self.state.id,
                    query = %query,
                    "Running product search"
                );
                let products = match self.search.run(query).await {
                    Ok(products) => products,
                    Err(e) => {
                        let detail = format!("{}: {e}", self.search.name());
                        self.report_fallback(FallbackPoint::Search, detail);
                        placeholder_products()
                    }
                };

                let summary = self.locale.products_found(products.len());
                let offer = Message::assistant(summary).with_products(products);
                self.state.push(offer);
            }
        }
    }

    fn report_fallback(&self, point: FallbackPoint, detail: String) {
        tracing::warn!(
            session_id = %self.state.id,
            point = ?point,
            error = %detail,
            "Falling back after failure"
        );
        self.publish(SessionEvent::Fallback(FallbackEvent {
            session_id: self.state.id.clone(),
            point,
            detail,
            at: Utc::now(),
        }));
    }

    fn checkpoint(&self) {
        self.snapshot_tx.send_replace(self.state.clone());
        self.publish(SessionEvent::Snapshot(Arc::new(self.state.clone())));
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
