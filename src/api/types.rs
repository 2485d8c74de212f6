//! API request and response types

use crate::state_machine::{ImageData, Product};
use serde::{Deserialize, Serialize};

/// Request to submit a user turn
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image: Option<ImageAttachment>,
}

/// Image attachment: raw base64 plus mime type, or a full data URI
#[derive(Debug, Clone, Deserialize)]
pub struct ImageAttachment {
    pub data: String,
    #[serde(default)]
    pub media_type: Option<String>,
}

impl ImageAttachment {
    pub fn decode(&self) -> Result<ImageData, String> {
        if self.data.starts_with("data:") {
            return ImageData::from_data_uri(&self.data);
        }
        let media_type = self
            .media_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .ok_or_else(|| "media_type is required for raw base64 images".to_string())?;
        ImageData::from_base64(media_type, &self.data)
    }
}

/// Request to try a product on
#[derive(Debug, Deserialize)]
pub struct TryOnActionRequest {
    pub product: Product,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_uri_attachment() {
        let attachment = ImageAttachment {
            data: "data:image/png;base64,iVBORw0KGgo=".to_string(),
            media_type: None,
        };
        let image = attachment.decode().unwrap();
        assert_eq!(image.media_type, "image/png");
        assert_eq!(image.detected_media_type(), Some("image/png"));
    }

    #[test]
    fn test_raw_base64_needs_media_type() {
        let attachment = ImageAttachment {
            data: "/9j/".to_string(),
            media_type: None,
        };
        assert!(attachment.decode().is_err());

        let attachment = ImageAttachment {
            media_type: Some("image/jpeg".to_string()),
            ..attachment
        };
        assert_eq!(&*attachment.decode().unwrap().bytes, &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_turn_request_defaults() {
        let req: TurnRequest = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert_eq!(req.text, "hi");
        assert!(req.image.is_none());
    }
}
