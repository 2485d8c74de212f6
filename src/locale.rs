//! User-facing canned text
//!
//! Everything the assistant says without asking the oracle lives here, so a
//! deployment can switch language without touching the runtime.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ja" | "ja-jp" => Ok(Locale::Ja),
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            other => Err(format!("Unsupported locale: {other}")),
        }
    }
}

impl Locale {
    /// Language the oracle must answer the user in
    pub fn language_name(self) -> &'static str {
        match self {
            Locale::Ja => "Natural Japanese",
            Locale::En => "Natural English",
        }
    }

    pub fn greeting(self) -> &'static str {
        match self {
            Locale::Ja => "こんにちは！ファッションやインテリアのお買い物をお手伝いする「Visual Shopping Assistant」です。何をお探しですか？",
            Locale::En => "Hi! I'm your Visual Shopping Assistant for fashion and interior items. What are you looking for?",
        }
    }

    pub fn apology(self) -> &'static str {
        match self {
            Locale::Ja => "申し訳ありません、エラーが発生しました。もう一度お試しください。",
            Locale::En => "Sorry, something went wrong. Please try again.",
        }
    }

    pub fn ask_photo_for_try_on(self) -> &'static str {
        match self {
            Locale::Ja => "試着するには、まずあなたの写真をアップロードしてください。",
            Locale::En => "To try something on, please upload a photo of yourself first.",
        }
    }

    /// Default text for a user turn that only carries a photo
    pub fn photo_upload_caption(self) -> &'static str {
        match self {
            Locale::Ja => "こちらの画像を参考にしてください。",
            Locale::En => "Please use this image as a reference.",
        }
    }

    pub fn products_found(self, count: usize) -> String {
        match (self, count) {
            (Locale::Ja, 0) => {
                "条件に合う商品が見つかりませんでした。別の条件で探してみましょう。".to_string()
            }
            (Locale::En, 0) => {
                "I couldn't find matching products. Let's try different criteria.".to_string()
            }
            (Locale::Ja, n) => {
                format!("{n}件の商品が見つかりました。「試着する」ボタンを押して試してみましょう！")
            }
            (Locale::En, 1) => {
                "Found 1 product. Press \"Try on\" to see how it looks on you!".to_string()
            }
            (Locale::En, n) => {
                format!("Found {n} products. Press \"Try on\" to see how they look on you!")
            }
        }
    }

    pub fn try_on_request(self, product_name: &str) -> String {
        match self {
            Locale::Ja => format!("{product_name}を試着したいです。"),
            Locale::En => format!("I'd like to try on {product_name}."),
        }
    }

    pub fn try_on_ready(self, product_name: &str) -> String {
        match self {
            Locale::Ja => format!("「{product_name}」の試着イメージを作成しました！"),
            Locale::En => format!("Here is how \"{product_name}\" looks on you!"),
        }
    }

    pub fn fit_rationale(self) -> &'static str {
        match self {
            Locale::Ja => "体のラインを崩さず、自然なフィット感で再現しました。",
            Locale::En => "Rendered with a natural fit that keeps your body shape intact.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale() {
        assert_eq!("ja".parse::<Locale>().unwrap(), Locale::Ja);
        assert_eq!(" EN ".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_products_found_distinguishes_empty() {
        assert!(Locale::Ja.products_found(4).starts_with("4件"));
        assert_ne!(Locale::Ja.products_found(0), Locale::Ja.products_found(1));
    }

    #[test]
    fn test_products_found_english_plural() {
        let en = Locale::En;
        assert!(en.products_found(1).starts_with("Found 1 product."));
        assert!(en.products_found(3).starts_with("Found 3 products."));
        assert!(en.products_found(0).starts_with("I couldn't find"));
    }
}
