use crate::credentials::CredentialContext;
use crate::errors::NodeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Execution-scoped context the workflow host hands to every node invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutionContext {
    #[serde(default)]
    pub workflow_id: String,
    pub execution_id: String,
    pub node_id: String,
    #[serde(default)]
    pub node_type: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub credentials: Map<String, Value>,
}

impl NodeExecutionContext {
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.execution_id.trim().is_empty() {
            return Err(NodeError::Validation(
                "execution context is missing an execution id".to_string(),
            ));
        }
        if self.node_id.trim().is_empty() {
            return Err(NodeError::Validation(
                "execution context is missing a node id".to_string(),
            ));
        }
        Ok(())
    }

    pub fn credential_context(&self, node_type: &str) -> Result<CredentialContext, NodeError> {
        self.validate()?;
        Ok(CredentialContext {
            workflow_id: self.workflow_id.clone(),
            execution_id: self.execution_id.clone(),
            node_id: self.node_id.clone(),
            node_type: node_type.to_string(),
            config: self.config.clone(),
            credentials: self.credentials.clone(),
        })
    }
}
