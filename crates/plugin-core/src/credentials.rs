use crate::cache::CacheKey;
use crate::errors::NodeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Name under which nodes declare their AWS credential requirement.
pub const AWS_CREDENTIAL: &str = "awsCredential";

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl AwsCredentials {
    pub fn new(access_key_id: &str, secret_access_key: &str, region: Option<&str>) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            region: region.map(str::to_string),
        }
    }

    pub fn region_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.region.as_deref() {
            Some(region) if !region.trim().is_empty() => region,
            _ => fallback,
        }
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        if self.access_key_id.trim().is_empty() {
            return Err(NodeError::Validation(
                "AWS Access Key ID is missing or invalid".to_string(),
            ));
        }
        if self.secret_access_key.trim().is_empty() {
            return Err(NodeError::Validation(
                "AWS Secret Access Key is missing or invalid".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Everything needed to look up the credential a node was configured with.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialContext {
    pub workflow_id: String,
    pub execution_id: String,
    pub node_id: String,
    pub node_type: String,
    pub config: Value,
    pub credentials: Map<String, Value>,
}

impl CredentialContext {
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.node_id, &self.node_type, &self.execution_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    Direct(AwsCredentials),
    Context(CredentialContext),
}

#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(
        &self,
        context: &CredentialContext,
        credential_name: &str,
    ) -> Result<AwsCredentials, NodeError>;
}

/// Resolves credentials from the bundle the host attaches to every execution.
#[derive(Debug, Default, Clone)]
pub struct BundleCredentialResolver;

#[async_trait]
impl CredentialResolver for BundleCredentialResolver {
    async fn resolve(
        &self,
        context: &CredentialContext,
        credential_name: &str,
    ) -> Result<AwsCredentials, NodeError> {
        let raw = context
            .credentials
            .get(credential_name)
            .filter(|value| !value.is_null())
            .ok_or_else(|| {
                NodeError::CredentialsNotFound(format!(
                    "'{}' is not configured for node {}",
                    credential_name, context.node_id
                ))
            })?;

        let credentials: AwsCredentials = serde_json::from_value(raw.clone()).map_err(|e| {
            NodeError::CredentialsNotFound(format!("'{}' is malformed: {}", credential_name, e))
        })?;
        credentials.validate()?;

        Ok(credentials)
    }
}
