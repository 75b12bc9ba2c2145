pub mod claude_node;
pub mod client;
pub mod embedding_node;
pub mod embedding_service;
pub mod node;
pub mod registry;

pub use claude_node::{BedrockClaudeNode, BEDROCK_CLAUDE};
pub use client::{BedrockClientCache, BedrockClientProvider};
pub use embedding_node::{BedrockEmbeddingNode, BEDROCK_EMBEDDING};
pub use embedding_service::{BedrockEmbeddingServiceNode, ServiceMethod, BEDROCK_EMBEDDING_SERVICE};
pub use node::{Node, NodeDefinition};
pub use registry::NodeRegistry;

use std::sync::Arc;

/// Registers the Claude, embedding and embedding service nodes, sharing one client provider.
pub fn register_bedrock_nodes(
    registry: &mut NodeRegistry,
    provider: Arc<BedrockClientProvider>,
) -> anyhow::Result<()> {
    registry.register(Box::new(BedrockClaudeNode::new(provider.clone())))?;
    registry.register(Box::new(BedrockEmbeddingNode::new(provider.clone())))?;
    registry.register(Box::new(BedrockEmbeddingServiceNode::new(provider)))?;
    Ok(())
}

impl NodeRegistry {
    pub fn with_bedrock_nodes(provider: Arc<BedrockClientProvider>) -> anyhow::Result<Self> {
        let mut registry = Self::new();
        register_bedrock_nodes(&mut registry, provider)?;
        Ok(registry)
    }
}
