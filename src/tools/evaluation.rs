//! Fit evaluation
//!
//! Scoring is a replaceable step. The shipped evaluator attaches a fixed
//! judgment rather than analysing the synthesized image.

use crate::locale::Locale;
use crate::state_machine::{Evaluation, ImageData, Product};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait FitEvaluator: Send + Sync {
    async fn evaluate(&self, rendered: &ImageData, product: &Product) -> Evaluation;
}

#[async_trait]
impl<T: FitEvaluator + ?Sized> FitEvaluator for Arc<T> {
    async fn evaluate(&self, rendered: &ImageData, product: &Product) -> Evaluation {
        (**self).evaluate(rendered, product).await
    }
}

/// Returns the same score and rationale for every try-on
#[derive(Debug, Clone)]
pub struct StaticEvaluator {
    score: f64,
    rationale: String,
}

impl StaticEvaluator {
    pub const DEFAULT_SCORE: f64 = 8.8;

    pub fn new(locale: Locale) -> Self {
        Self {
            score: Self::DEFAULT_SCORE,
            rationale: locale.fit_rationale().to_string(),
        }
    }
}

#[async_trait]
impl FitEvaluator for StaticEvaluator {
    async fn evaluate(&self, _rendered: &ImageData, _product: &Product) -> Evaluation {
        Evaluation {
            score: self.score,
            rationale: self.rationale.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::placeholder_products;

    #[tokio::test]
    async fn test_static_evaluation() {
        let product = placeholder_products().remove(0);
        let image = ImageData::new("image/png", vec![0u8; 4]);

        let evaluator = StaticEvaluator::new(Locale::Ja);
        let evaluation = evaluator.evaluate(&image, &product).await;

        assert!((evaluation.score - 8.8).abs() < f64::EPSILON);
        assert_eq!(
            evaluation.rationale,
            "体のラインを崩さず、自然なフィット感で再現しました。"
        );
    }
}
