use async_trait::async_trait;
use plugin_core::{NodeError, NodeExecutionContext, NodeOutput, AWS_CREDENTIAL};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Descriptor the workflow host uses to render and wire a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    pub package_version: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub color: String,
    pub is_service: bool,
    pub inputs: Vec<PortDefinition>,
    pub outputs: Vec<PortDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_connectors: Vec<ServiceConnector>,
    pub config_schema: Value,
    pub credentials: Vec<CredentialRequirement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub port_type: String,
    pub description: String,
}

impl PortDefinition {
    pub fn object(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            port_type: "object".to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConnector {
    pub name: String,
    pub description: String,
    pub service_type: String,
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequirement {
    pub name: String,
    pub required: bool,
    pub display_name: String,
    pub description: String,
}

impl CredentialRequirement {
    pub fn aws(description: &str) -> Self {
        Self {
            name: AWS_CREDENTIAL.to_string(),
            required: true,
            display_name: "AWS Credentials".to_string(),
            description: description.to_string(),
        }
    }
}

#[async_trait]
pub trait Node: Send + Sync {
    fn node_type(&self) -> &str;
    fn definition(&self) -> NodeDefinition;

    /// Checks a node config before [`Node::execute`] runs. Nodes without static checks
    /// accept anything.
    fn validate_config(&self, _config: &Value) -> Result<(), NodeError> {
        Ok(())
    }

    async fn execute(
        &self,
        inputs: Value,
        context: &NodeExecutionContext,
    ) -> Result<NodeOutput, NodeError>;

    /// Entry point for host-mediated service calls. Only service nodes override this.
    async fn handle_service_call(
        &self,
        _method: &str,
        _params: Value,
        _context: &NodeExecutionContext,
    ) -> Result<Value, NodeError> {
        Err(NodeError::NotAService(self.node_type().to_string()))
    }
}

/// Deserializes a node's config; a missing config is treated as empty.
pub fn parse_config<T: DeserializeOwned>(config: &Value) -> Result<T, NodeError> {
    let config = if config.is_null() {
        Value::Object(Default::default())
    } else {
        config.clone()
    };
    serde_json::from_value(config).map_err(|e| NodeError::Validation(e.to_string()))
}
