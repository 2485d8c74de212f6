//! Visual shopping assistant server
//!
//! Guides a shopper from "what do you want" to a rendered try-on, with a
//! generative model deciding each conversational step.

mod api;
mod config;
mod llm;
mod locale;
mod oracle;
mod runtime;
mod state_machine;
mod tools;

use api::{create_router, AppState};
use config::{Config, LlmConfig};
use llm::{GeminiService, LlmService, LoggingService};
use runtime::{Providers, SessionManager};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with JSON output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visual_shopper=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env();

    if config.llm.has_credentials() {
        tracing::info!(
            decision_model = %config.llm.decision_model,
            search_model = %config.llm.search_model,
            image_model = %config.llm.image_model,
            gateway = config.llm.gateway.is_some(),
            "Gemini providers configured"
        );
    } else {
        tracing::warn!(
            "No Gemini credentials configured. Set GEMINI_API_KEY or LLM_GATEWAY; \
             every turn will use fallback content."
        );
    }

    let providers = Providers {
        decision: provider(&config.llm, &config.llm.decision_model),
        search: provider(&config.llm, &config.llm.search_model),
        image: provider(&config.llm, &config.llm.image_model),
        search_results: config.search_results,
    };

    let sessions = SessionManager::new(providers, config.locale)
        .with_idle_timeout(chrono::Duration::minutes(config.session_idle_minutes));
    let state = AppState::new(sessions);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state).layer(cors).layer(compression);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(locale = ?config.locale, "Visual shopper listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn provider(config: &LlmConfig, model: &str) -> Arc<dyn LlmService> {
    let gemini = GeminiService::new(config.effective_api_key(), model, config.gateway.as_deref());
    Arc::new(LoggingService::new(Arc::new(gemini)))
}
