use crate::bedrock_common::invoke_bedrock;
use crate::config::EmbeddingConfig;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use plugin_core::NodeError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Debug, Serialize, PartialEq)]
struct TitanEmbedInput {
    #[serde(rename = "inputText")]
    input_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    normalize: Option<bool>,
}

impl TitanEmbedInput {
    /// Only Titan v2 accepts `dimensions` and `normalize`.
    fn new(text: &str, config: &EmbeddingConfig) -> Self {
        let supports_options = config.model().contains("v2");
        Self {
            input_text: text.to_string(),
            dimensions: supports_options.then(|| config.dimensions()),
            normalize: if supports_options { config.normalize } else { None },
        }
    }
}

#[derive(Debug, Deserialize)]
struct TitanEmbedOutput {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub embedding: Vec<f32>,
    pub dimensions: usize,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEmbeddingResult {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
    pub model: String,
    pub count: usize,
}

pub struct BedrockTitanClient {
    config: EmbeddingConfig,
    client: BedrockClient,
}

impl BedrockTitanClient {
    pub fn new(client: BedrockClient, config: EmbeddingConfig) -> Self {
        if !config.model().starts_with("amazon.titan-embed-") {
            warn!(
                "Model ID '{}' may not be a Titan embedding model",
                config.model()
            );
        }
        Self { config, client }
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    pub async fn embed_one(&self, text: &str) -> Result<EmbeddingResult, NodeError> {
        let embedding = self.invoke(text).await?;
        Ok(EmbeddingResult {
            dimensions: embedding.len(),
            embedding,
            model: self.model().to_string(),
        })
    }

    /// Bedrock has no batch endpoint for Titan, so texts are embedded one after another.
    pub async fn embed(&self, texts: &[String]) -> Result<BatchEmbeddingResult, NodeError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.invoke(text).await?);
        }
        Ok(BatchEmbeddingResult {
            dimensions: embeddings.first().map(Vec::len).unwrap_or(0),
            count: embeddings.len(),
            embeddings,
            model: self.model().to_string(),
        })
    }

    async fn invoke(&self, text: &str) -> Result<Vec<f32>, NodeError> {
        let request = TitanEmbedInput::new(text, &self.config);
        let body = serde_json::to_vec(&request)
            .map_err(|e| NodeError::Validation(format!("Failed to encode request: {}", e)))?;
        let bytes = invoke_bedrock(&self.client, self.model(), body)
            .await
            .map_err(|e| {
                error!(
                    model = self.model(),
                    text_length = text.len(),
                    "AWS Bedrock embedding generation failed: {}",
                    e
                );
                e
            })?;
        let parsed: TitanEmbedOutput = serde_json::from_slice(&bytes).map_err(|e| {
            if let Ok(s) = std::str::from_utf8(&bytes) {
                error!("Failed to parse Titan response JSON: {} | Raw: {}", e, s);
            }
            NodeError::Provider(format!("Unexpected Titan response: {}", e))
        })?;

        Ok(parsed.embedding)
    }
}
