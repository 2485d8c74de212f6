//! Product search executor
//!
//! Asks a search-grounded model for real products and backfills whatever
//! the provider left out, so every returned [`Product`] is fully populated.

use super::{Tool, ToolError};
use crate::llm::{LlmMessage, LlmRequest, LlmService};
use crate::state_machine::decision::strip_code_fence;
use crate::state_machine::Product;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const PLACEHOLDER_IMAGE_BASE: &str = "https://picsum.photos/300/400";
const FALLBACK_SEARCH_ENGINE: &str = "https://www.google.com/search";
const DEFAULT_SOURCE: &str = "Online Store";

pub struct GeminiProductSearch {
    llm: Arc<dyn LlmService>,
    results: usize,
}

impl GeminiProductSearch {
    pub fn new(llm: Arc<dyn LlmService>, results: usize) -> Self {
        Self { llm, results }
    }

    fn build_request(&self, query: &str) -> LlmRequest {
        let prompt = format!(
            "Find {count} real fashion/furniture products for: \"{query}\".\n\
             Return ONLY a JSON array.\n\
             IMPORTANT: Try to include the real 'link' and 'source' (e.g. Amazon, Rakuten, Uniqlo) if found via grounding.\n\
             Each object must have: id, name, price, imageUrl, description, link, source.",
            count = self.results,
        );

        LlmRequest::new(vec![LlmMessage::user_text(prompt)])
            .with_search_grounding()
            .with_json_schema(product_list_schema())
    }
}

#[async_trait]
impl Tool for GeminiProductSearch {
    type Input = String;
    type Output = Vec<Product>;

    fn name(&self) -> &'static str {
        "product_search"
    }

    async fn run(&self, query: String) -> Result<Vec<Product>, ToolError> {
        let response = self.llm.complete(&self.build_request(&query)).await?;
        parse_products(&response.text())
    }
}

fn product_list_schema() -> Value {
    let string = json!({"type": "STRING"});
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": string,
                "name": string,
                "price": string,
                "imageUrl": string,
                "description": string,
                "link": string,
                "source": string,
            }
        }
    })
}

/// Decode the provider's JSON array and backfill each entry
pub(crate) fn parse_products(raw: &str) -> Result<Vec<Product>, ToolError> {
    let raw_products: Vec<RawProduct> = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| ToolError::MalformedOutput(format!("expected a product array: {e}")))?;

    Ok(raw_products
        .into_iter()
        .enumerate()
        .map(|(index, raw)| raw.backfill(index))
        .collect())
}

/// Scalar the provider may send for a text field
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// Product as the provider returned it; every field may be absent
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    #[serde(default)]
    id: Option<Scalar>,
    #[serde(default)]
    name: Option<Scalar>,
    #[serde(default)]
    price: Option<Scalar>,
    #[serde(default)]
    image_url: Option<Scalar>,
    #[serde(default)]
    description: Option<Scalar>,
    #[serde(default)]
    link: Option<Scalar>,
    #[serde(default)]
    source: Option<Scalar>,
}

impl RawProduct {
    fn named(name: &str, price: &str, description: &str, source: &str) -> Self {
        let text = |s: &str| Some(Scalar::Text(s.to_string()));
        Self {
            name: text(name),
            price: text(price),
            description: text(description),
            source: text(source),
            ..Self::default()
        }
    }

    /// Fill missing or empty fields with deterministic values keyed by `index`
    pub fn backfill(self, index: usize) -> Product {
        let name = non_empty(self.name).unwrap_or_default();

        let image_url = non_empty(self.image_url)
            .filter(|url| url.starts_with("http"))
            .unwrap_or_else(|| format!("{PLACEHOLDER_IMAGE_BASE}?random={index}"));

        let link = non_empty(self.link).unwrap_or_else(|| search_link(&name));

        Product {
            id: non_empty(self.id).unwrap_or_else(|| format!("prod-{index}")),
            price: non_empty(self.price).unwrap_or_default(),
            description: non_empty(self.description).unwrap_or_default(),
            source: Some(non_empty(self.source).unwrap_or_else(|| DEFAULT_SOURCE.to_string())),
            link: Some(link),
            image_url,
            name,
        }
    }
}

fn non_empty(value: Option<Scalar>) -> Option<String> {
    value
        .map(Scalar::into_text)
        .filter(|s| !s.trim().is_empty())
}

fn search_link(name: &str) -> String {
    Url::parse_with_params(FALLBACK_SEARCH_ENGINE, &[("q", name)])
        .map_or_else(|_| FALLBACK_SEARCH_ENGINE.to_string(), String::from)
}

/// Name, price and description of the fixed fallback products
const PLACEHOLDERS: [(&str, &str, &str); 3] = [
    ("Summer Floral Dress", "¥5,000", "Lightweight and airy."),
    ("Denim Jacket", "¥12,000", "Classic fit."),
    ("Casual T-Shirt", "¥2,500", "Cotton blend."),
];

/// Fixed products shown when the search executor fails
pub fn placeholder_products() -> Vec<Product> {
    PLACEHOLDERS
        .into_iter()
        .enumerate()
        .map(|(index, (name, price, description))| {
            RawProduct::named(name, price, description, "Sample Store").backfill(index)
        })
        .collect()
}
