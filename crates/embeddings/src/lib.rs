pub mod bedrock_common;
pub mod bedrock_titan;
pub mod config;
pub mod validation;

pub use bedrock_titan::{BatchEmbeddingResult, BedrockTitanClient, EmbeddingResult};
pub use config::{EmbeddingConfig, DEFAULT_DIMENSIONS, DEFAULT_EMBEDDING_MODEL};
pub use validation::{validate_embedding_text, validate_model_config};
