use crate::config::EmbeddingConfig;
use plugin_core::NodeError;

pub const SUPPORTED_MODELS: [&str; 5] = [
    "amazon.titan-embed-text-v1",
    "amazon.titan-embed-text-v2:0",
    "amazon.titan-embed-image-v1",
    "cohere.embed-english-v3",
    "cohere.embed-multilingual-v3",
];

pub const TITAN_V2_DIMENSIONS: [u32; 3] = [256, 512, 1024];

/// Upper bound on characters accepted for a single embedding request.
pub const MAX_EMBEDDING_TEXT_CHARS: usize = 25_000;

pub fn validate_embedding_text(text: &str) -> Result<(), NodeError> {
    if text.trim().is_empty() {
        return Err(NodeError::Validation(
            "Text input cannot be empty".to_string(),
        ));
    }
    if text.chars().count() > MAX_EMBEDDING_TEXT_CHARS {
        return Err(NodeError::Validation(
            "Text input is too long (max ~25,000 characters)".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_model_config(config: &EmbeddingConfig) -> Result<(), NodeError> {
    let model = config
        .model
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| NodeError::Validation("Model name is missing or invalid".to_string()))?;

    if !SUPPORTED_MODELS.iter().any(|m| model.contains(m)) {
        return Err(NodeError::Validation(format!(
            "Unsupported model: {}. Supported models: {}",
            model,
            SUPPORTED_MODELS.join(", ")
        )));
    }

    if let Some(dimensions) = config.dimensions.filter(|d| *d > 0) {
        if model.contains("titan-embed-text-v2") && !TITAN_V2_DIMENSIONS.contains(&dimensions) {
            return Err(NodeError::Validation(
                "Titan Embed Text v2 only supports dimensions: 256, 512, or 1024".to_string(),
            ));
        }
    }

    Ok(())
}
