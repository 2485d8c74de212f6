//! Environment-driven configuration

use crate::locale::Locale;

const DEFAULT_DECISION_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_SEARCH_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_SEARCH_RESULTS: usize = 4;
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_SESSION_IDLE_MINUTES: i64 = 60;
const MAX_SESSION_IDLE_MINUTES: i64 = 7 * 24 * 60;

/// Configuration for the Gemini-backed providers
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub gemini_api_key: Option<String>,
    /// Gateway base URL; when set the gateway handles authentication
    pub gateway: Option<String>,
    pub decision_model: String,
    pub search_model: String,
    pub image_model: String,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: env_nonempty("GEMINI_API_KEY"),
            gateway: env_nonempty("LLM_GATEWAY"),
            decision_model: env_nonempty("SHOPPER_DECISION_MODEL")
                .unwrap_or_else(|| DEFAULT_DECISION_MODEL.to_string()),
            search_model: env_nonempty("SHOPPER_SEARCH_MODEL")
                .unwrap_or_else(|| DEFAULT_SEARCH_MODEL.to_string()),
            image_model: env_nonempty("SHOPPER_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
        }
    }

    /// Key to hand to providers: `"implicit"` in gateway mode, empty when missing
    pub fn effective_api_key(&self) -> String {
        if self.gateway.is_some() {
            "implicit".to_string()
        } else {
            self.gemini_api_key.clone().unwrap_or_default()
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.gateway.is_some() || self.gemini_api_key.is_some()
    }
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub locale: Locale,
    pub search_results: usize,
    /// Sessions without a new message for this long are dropped
    pub session_idle_minutes: i64,
    pub llm: LlmConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let locale = env_nonempty("SHOPPER_LOCALE")
            .and_then(|raw| match raw.parse() {
                Ok(locale) => Some(locale),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring SHOPPER_LOCALE");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            port: env_parse("SHOPPER_PORT").unwrap_or(DEFAULT_PORT),
            locale,
            search_results: env_parse("SHOPPER_SEARCH_RESULTS")
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_SEARCH_RESULTS),
            session_idle_minutes: env_parse::<i64>("SHOPPER_SESSION_IDLE_MINUTES")
                .filter(|n| (1..=MAX_SESSION_IDLE_MINUTES).contains(n))
                .unwrap_or(DEFAULT_SESSION_IDLE_MINUTES),
            llm: LlmConfig::from_env(),
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_nonempty(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_key_is_implicit() {
        let config = LlmConfig {
            gemini_api_key: Some("secret".to_string()),
            gateway: Some("http://gateway".to_string()),
            ..LlmConfig::default()
        };
        assert_eq!(config.effective_api_key(), "implicit");
    }

    #[test]
    fn test_missing_key_is_empty() {
        let config = LlmConfig::default();
        assert_eq!(config.effective_api_key(), "");
        assert!(!config.has_credentials());
    }
}
