use crate::node::{Node, NodeDefinition};
use anyhow::Result;
use plugin_core::{NodeError, NodeExecutionContext, NodeOutput};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub type BoxedNode = Box<dyn Node>;

pub struct NodeRegistry {
    nodes: HashMap<String, Arc<dyn Node>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    pub fn register(&mut self, node: BoxedNode) -> Result<()> {
        let node_type = node.node_type().to_string();

        if self.nodes.contains_key(&node_type) {
            anyhow::bail!("Node '{}' is already registered", node_type);
        }

        self.nodes.insert(node_type, Arc::from(node));
        Ok(())
    }

    pub fn get_node(&self, node_type: &str) -> Option<Arc<dyn Node>> {
        self.nodes.get(node_type).cloned()
    }

    pub fn list_nodes(&self) -> Vec<String> {
        let mut types: Vec<String> = self.nodes.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn definitions(&self) -> Vec<NodeDefinition> {
        let mut definitions: Vec<NodeDefinition> =
            self.nodes.values().map(|node| node.definition()).collect();
        definitions.sort_by(|a, b| a.node_type.cmp(&b.node_type));
        definitions
    }

    fn lookup(&self, node_type: &str) -> Result<Arc<dyn Node>, NodeError> {
        self.get_node(node_type)
            .ok_or_else(|| NodeError::UnknownNode(node_type.to_string()))
    }

    pub async fn execute_node(
        &self,
        node_type: &str,
        inputs: Value,
        context: NodeExecutionContext,
    ) -> Result<NodeOutput, NodeError> {
        let node = self.lookup(node_type)?;
        let context = with_node_type(context, node_type);
        node.validate_config(&context.config)?;
        debug!(node_type, node_id = %context.node_id, "Executing node");
        node.execute(inputs, &context).await
    }

    pub async fn call_service(
        &self,
        node_type: &str,
        method: &str,
        params: Value,
        context: NodeExecutionContext,
    ) -> Result<Value, NodeError> {
        let node = self.lookup(node_type)?;
        let context = with_node_type(context, node_type);
        debug!(node_type, method, node_id = %context.node_id, "Dispatching service call");
        node.handle_service_call(method, params, &context).await
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn with_node_type(mut context: NodeExecutionContext, node_type: &str) -> NodeExecutionContext {
    if context.node_type.is_empty() {
        context.node_type = node_type.to_string();
    }
    context
}
