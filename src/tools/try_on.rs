//! Virtual try-on executor
//!
//! Sends the reference photo plus an editing instruction to an image model
//! and returns the first image it produces.

use super::{Tool, ToolError};
use crate::llm::{ContentBlock, LlmMessage, LlmRequest, LlmService};
use crate::state_machine::{ImageData, Product};
use async_trait::async_trait;
use std::sync::Arc;

/// Reference image plus the product description to render onto it
#[derive(Debug, Clone)]
pub struct TryOnRequest {
    pub reference: ImageData,
    pub description: String,
}

impl TryOnRequest {
    pub fn for_product(reference: ImageData, product: &Product) -> Self {
        Self {
            reference,
            description: format!("Wearing {}, {}", product.name, product.description),
        }
    }
}

pub struct GeminiTryOn {
    llm: Arc<dyn LlmService>,
}

impl GeminiTryOn {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Tool for GeminiTryOn {
    type Input = TryOnRequest;
    type Output = ImageData;

    fn name(&self) -> &'static str {
        "virtual_try_on"
    }

    async fn run(&self, request: TryOnRequest) -> Result<ImageData, ToolError> {
        validate_reference(&request.reference)?;

        let message = LlmMessage::user(vec![
            ContentBlock::image(request.reference),
            ContentBlock::text(synthesis_instruction(&request.description)),
        ]);
        let response = self.llm.complete(&LlmRequest::new(vec![message])).await?;

        let image = response.images().next().cloned();
        image.ok_or(ToolError::NoImageReturned)
    }
}

fn synthesis_instruction(description: &str) -> String {
    format!(
        "Image Editing Task: Overlay or Replace clothing.\n\
         Target Product: {description}.\n\n\
         CRITICAL INSTRUCTIONS:\n\
         1. PRESERVE THE USER'S EXACT BODY SHAPE AND PROPORTIONS. Do not slim, do not elongate legs, do not beautify. The goal is a realistic fit check.\n\
         2. Maintain the original pose, lighting, and background exactly.\n\
         3. The product should look photorealistic on the subject.\n\
         4. If the product is a piece of furniture, place it realistically in the room scene, maintaining perspective."
    )
}

/// Reference formats the image model accepts
const SUPPORTED_REFERENCE_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Reject payloads whose bytes are not a supported format or not the format
/// they claim to be
fn validate_reference(image: &ImageData) -> Result<(), ToolError> {
    if image.bytes.is_empty() {
        return Err(ToolError::UndecodableImage("reference image is empty".to_string()));
    }

    let detected = image.detected_media_type().ok_or_else(|| {
        ToolError::UndecodableImage(format!(
            "reference image is not a recognized image format (declared {})",
            image.media_type
        ))
    })?;
    if !SUPPORTED_REFERENCE_TYPES.contains(&detected) {
        return Err(ToolError::UndecodableImage(format!(
            "{detected} is not supported by the image model"
        )));
    }

    let declared = image.media_type.to_ascii_lowercase();
    if media_family(&declared) != media_family(detected) {
        return Err(ToolError::UndecodableImage(format!(
            "declared {declared} but payload is {detected}"
        )));
    }
    Ok(())
}

/// `image/jpg` is JPEG, and HEIC is a profile of HEIF
fn media_family(media_type: &str) -> &str {
    match media_type {
        "image/jpg" => "image/jpeg",
        "image/heic" | "image/heic-sequence" | "image/heif-sequence" => "image/heif",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::runtime::testing::{RecordingLlm, JPEG_BYTES, PNG_BYTES};
    use crate::tools::placeholder_products;

    const HEIC_BYTES: &[u8] = b"\0\0\0\x18ftypheic\0\0\0\0mif1heic";
    const GIF_BYTES: &[u8] = b"GIF89a\x01\0\x01\0";

    fn png() -> ImageData {
        ImageData::new("image/png", PNG_BYTES.to_vec())
    }

    #[test]
    fn test_description_names_product() {
        let product = placeholder_products().remove(1);
        let request = TryOnRequest::for_product(png(), &product);
        assert_eq!(request.description, "Wearing Denim Jacket, Classic fit.");
    }

    #[test]
    fn test_validate_reference() {
        assert!(validate_reference(&png()).is_ok());
        assert!(validate_reference(&ImageData::new("image/jpg", JPEG_BYTES.to_vec())).is_ok());
        assert!(validate_reference(&ImageData::new("image/jpeg", PNG_BYTES.to_vec())).is_err());
        assert!(validate_reference(&ImageData::new("image/png", b"hello".to_vec())).is_err());
        assert!(validate_reference(&ImageData::new("image/png", Vec::new())).is_err());
    }

    #[test]
    fn test_validate_reference_heif_family() {
        assert!(validate_reference(&ImageData::new("image/heic", HEIC_BYTES.to_vec())).is_ok());
        assert!(validate_reference(&ImageData::new("image/heif", HEIC_BYTES.to_vec())).is_ok());
        let mif1 = b"\0\0\0\x1cftypmif1\0\0\0\0heic".to_vec();
        assert!(validate_reference(&ImageData::new("image/heic", mif1)).is_ok());
        assert!(validate_reference(&ImageData::new("image/png", HEIC_BYTES.to_vec())).is_err());
    }

    #[test]
    fn test_validate_reference_rejects_gif() {
        let err = validate_reference(&ImageData::new("image/gif", GIF_BYTES.to_vec())).unwrap_err();
        assert!(matches!(err, ToolError::UndecodableImage(msg) if msg.contains("image/gif")));
    }

    #[tokio::test]
    async fn test_returns_first_generated_image() {
        let rendered = ImageData::new("image/jpeg", JPEG_BYTES.to_vec());
        let llm = Arc::new(RecordingLlm::with_image(rendered.clone()));
        let tool = GeminiTryOn::new(llm.clone());

        let result = tool
            .run(TryOnRequest {
                reference: png(),
                description: "Wearing Denim Jacket, Classic fit.".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result, rendered);
        let request = &llm.requests()[0];
        assert_eq!(request.messages[0].content[0], ContentBlock::image(png()));
        assert!(matches!(
            &request.messages[0].content[1],
            ContentBlock::Text { text } if text.contains("Target Product: Wearing Denim Jacket")
        ));
    }

    #[tokio::test]
    async fn test_undecodable_reference_skips_provider() {
        let llm = Arc::new(RecordingLlm::with_text("unused"));
        let tool = GeminiTryOn::new(llm.clone());

        let err = tool
            .run(TryOnRequest {
                reference: ImageData::new("image/png", b"not an image".to_vec()),
                description: "x".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::UndecodableImage(_)));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_heic_reference_reaches_provider() {
        let rendered = ImageData::new("image/jpeg", JPEG_BYTES.to_vec());
        let llm = Arc::new(RecordingLlm::with_image(rendered.clone()));
        let reference = ImageData::new("image/heic", HEIC_BYTES.to_vec());

        let result = GeminiTryOn::new(llm.clone())
            .run(TryOnRequest::for_product(reference.clone(), &placeholder_products()[0]))
            .await
            .unwrap();

        assert_eq!(result, rendered);
        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].messages[0].content[0],
            ContentBlock::image(reference)
        );
    }

    #[tokio::test]
    async fn test_gif_reference_skips_provider() {
        let llm = Arc::new(RecordingLlm::with_text("unused"));
        let reference = ImageData::new("image/gif", GIF_BYTES.to_vec());

        let err = GeminiTryOn::new(llm.clone())
            .run(TryOnRequest::for_product(reference, &placeholder_products()[0]))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::UndecodableImage(_)));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_text_only_response_is_failure() {
        let llm = Arc::new(RecordingLlm::with_text("I can't do that"));
        let err = GeminiTryOn::new(llm)
            .run(TryOnRequest::for_product(png(), &placeholder_products()[0]))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NoImageReturned));
    }

    #[tokio::test]
    async fn test_provider_failure() {
        let llm = Arc::new(RecordingLlm::failing(LlmError::auth("no key")));
        let err = GeminiTryOn::new(llm)
            .run(TryOnRequest::for_product(png(), &placeholder_products()[0]))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Provider(_)));
    }
}
