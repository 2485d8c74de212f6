//! Session state types

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Phase
// ============================================================================

/// Stage of the shopping journey.
///
/// The order is conceptual only; the oracle may move between any two phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    IdentifySubject,
    GetUserImage,
    PreferenceSearch,
    SelectProduct,
    VirtualTryon,
    Evaluation,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::IdentifySubject,
        Phase::GetUserImage,
        Phase::PreferenceSearch,
        Phase::SelectProduct,
        Phase::VirtualTryon,
        Phase::Evaluation,
    ];

    /// Wire name used by the oracle schema
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::IdentifySubject => "IDENTIFY_SUBJECT",
            Phase::GetUserImage => "GET_USER_IMAGE",
            Phase::PreferenceSearch => "PREFERENCE_SEARCH",
            Phase::SelectProduct => "SELECT_PRODUCT",
            Phase::VirtualTryon => "VIRTUAL_TRYON",
            Phase::Evaluation => "EVALUATION",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Images
// ============================================================================

/// Self-describing image blob: raw bytes plus declared mime type.
///
/// Serialized as `{"media_type": ..., "data": <standard base64>}`; the
/// encoding is exact and reversible. Bytes are shared, so cloning a
/// session snapshot never copies image payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub media_type: String,
    #[serde(rename = "data", with = "base64_bytes")]
    pub bytes: Arc<[u8]>,
}

impl ImageData {
    pub fn new(media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Decode a base64 payload as sent by clients and providers
    pub fn from_base64(media_type: impl Into<String>, data: &str) -> Result<Self, String> {
        let bytes = BASE64
            .decode(data.trim().as_bytes())
            .map_err(|e| format!("Invalid base64 image data: {e}"))?;
        Ok(Self::new(media_type, bytes))
    }

    /// Parse a `data:<mime>;base64,<payload>` URI
    pub fn from_data_uri(uri: &str) -> Result<Self, String> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| "Not a data URI".to_string())?;
        let (media_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| "Data URI is not base64 encoded".to_string())?;
        Self::from_base64(media_type, payload)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    #[allow(dead_code)] // API completeness
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }

    /// Media type detected from the payload's magic bytes
    pub fn detected_media_type(&self) -> Option<&'static str> {
        let bytes: &[u8] = &self.bytes;
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some("image/png")
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some("image/jpeg")
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some("image/gif")
        } else if bytes.get(..4) == Some(b"RIFF".as_slice())
            && bytes.get(8..12) == Some(b"WEBP".as_slice())
        {
            Some("image/webp")
        } else if bytes.get(4..8) == Some(b"ftyp".as_slice()) {
            heif_brand(bytes.get(8..12)?)
        } else {
            None
        }
    }
}

/// ISO-BMFF major brands of the HEIF family
fn heif_brand(brand: &[u8]) -> Option<&'static str> {
    match brand {
        b"heic" | b"heix" | b"hevc" | b"hevx" => Some("image/heic"),
        b"mif1" | b"msf1" | b"heif" => Some("image/heif"),
        _ => None,
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::sync::Arc;

    pub fn serialize<S: Serializer>(bytes: &Arc<[u8]>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<[u8]>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map(Arc::from)
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Products and attachments
// ============================================================================

/// A product returned by the search executor.
///
/// Opaque passthrough data: only `link`, `source` and `image_url` are ever
/// filled in by us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image_url: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOffer {
    pub products: Vec<Product>,
}

/// Score attached to a try-on result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnResult {
    pub image: ImageData,
    pub match_score: f64,
    pub rationale: String,
}

impl TryOnResult {
    pub fn new(image: ImageData, evaluation: Evaluation) -> Self {
        Self {
            image,
            match_score: evaluation.score,
            rationale: evaluation.rationale,
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the append-only message log.
///
/// `id` is only used for UI keying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_image: Option<ImageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_offer: Option<ProductOffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub try_on_result: Option<TryOnResult>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            attached_image: None,
            product_offer: None,
            try_on_result: None,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>, image: Option<ImageData>) -> Self {
        Self {
            attached_image: image,
            ..Self::new(Role::User, text)
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.product_offer = Some(ProductOffer { products });
        self
    }

    pub fn with_try_on(mut self, result: TryOnResult) -> Self {
        self.try_on_result = Some(result);
        self
    }
}

// ============================================================================
// Session State
// ============================================================================

/// The single mutable aggregate of a shopping conversation.
///
/// Owned exclusively by one runtime; everyone else sees clones taken after
/// a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub id: String,
    pub messages: Vec<Message>,
    pub phase: Phase,
    /// Last image any user turn supplied; later uploads overwrite it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<ImageData>,
    pub busy: bool,
    /// Whether the UI should show the "upload a photo" affordance
    pub upload_requested: bool,
}

impl SessionState {
    /// Fresh session: `IdentifySubject` plus the assistant greeting
    pub fn new(id: impl Into<String>, greeting: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: vec![Message::assistant(greeting)],
            phase: Phase::IdentifySubject,
            reference_image: None,
            busy: false,
            upload_requested: false,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Text of the most recent user message, if any
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.text.as_str())
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn test_image_json_is_byte_exact() {
        let bytes: Vec<u8> = (0..=255).collect();
        let image = ImageData::new("image/png", bytes.clone());

        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["media_type"], "image/png");

        let back: ImageData = serde_json::from_value(json).unwrap();
        assert_eq!(&*back.bytes, bytes.as_slice());
    }

    #[test]
    fn test_data_uri_parsing() {
        let image = ImageData::new("image/png", PNG_HEADER.to_vec());
        let parsed = ImageData::from_data_uri(&image.to_data_uri()).unwrap();
        assert_eq!(parsed, image);

        assert!(ImageData::from_data_uri("https://example.com/a.png").is_err());
        assert!(ImageData::from_data_uri("data:image/png,plain").is_err());
    }

    #[test]
    fn test_detected_media_type() {
        assert_eq!(
            ImageData::new("image/png", PNG_HEADER.to_vec()).detected_media_type(),
            Some("image/png")
        );
        assert_eq!(
            ImageData::new("image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0]).detected_media_type(),
            Some("image/jpeg")
        );
        assert_eq!(
            ImageData::new("image/webp", b"RIFF\0\0\0\0WEBPVP8 ".to_vec()).detected_media_type(),
            Some("image/webp")
        );
        assert_eq!(
            ImageData::new("image/png", b"hello".to_vec()).detected_media_type(),
            None
        );
    }

    fn sniff(bytes: &[u8]) -> Option<&'static str> {
        ImageData::new("image/heic", bytes.to_vec()).detected_media_type()
    }

    #[test]
    fn test_detects_heif_family_from_ftyp_box() {
        assert_eq!(sniff(b"\0\0\0\x18ftypheic\0\0\0\0"), Some("image/heic"));
        assert_eq!(sniff(b"\0\0\0\x18ftypheix\0\0\0\0"), Some("image/heic"));
        assert_eq!(sniff(b"\0\0\0\x1cftypmif1\0\0\0\0"), Some("image/heif"));
        // MP4 video shares the box layout
        assert_eq!(sniff(b"\0\0\0\x18ftypisom\0\0\0\0"), None);
        assert_eq!(sniff(b"\0\0\0\x18ftyp"), None);
    }

    #[test]
    fn test_phase_wire_names() {
        for phase in Phase::ALL {
            let json = serde_json::to_value(phase).unwrap();
            assert_eq!(json, phase.as_str());
        }
        assert!(serde_json::from_str::<Phase>("\"CHECKOUT\"").is_err());
    }

    #[test]
    fn test_new_session_starts_with_greeting() {
        let state = SessionState::new("s-1", "hello");
        assert_eq!(state.phase, Phase::IdentifySubject);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].role, Role::Assistant);
        assert!(!state.busy);
        assert!(state.last_user_text().is_none());
    }

    #[test]
    fn test_last_user_text_skips_assistant_messages() {
        let mut state = SessionState::new("s-1", "hello");
        state.push(Message::user("red dress", None));
        state.push(Message::assistant("Which shade?"));
        assert_eq!(state.last_user_text(), Some("red dress"));
    }
}
