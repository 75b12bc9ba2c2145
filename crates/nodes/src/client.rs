use aws_config::BehaviorVersion;
use aws_sdk_bedrockruntime::{config::Credentials, Client};
use plugin_core::credentials::DEFAULT_REGION;
use plugin_core::{
    AwsCredentials, ClientCache, CredentialResolver, CredentialSource, NodeError, AWS_CREDENTIAL,
};
use std::sync::Arc;
use tracing::info;

pub type BedrockClientCache = ClientCache<Client>;

/// Hands out Bedrock clients, caching the ones built from a node's execution context.
pub struct BedrockClientProvider {
    cache: Arc<BedrockClientCache>,
    resolver: Arc<dyn CredentialResolver>,
    default_region: String,
}

impl BedrockClientProvider {
    pub fn new(cache: Arc<BedrockClientCache>, resolver: Arc<dyn CredentialResolver>) -> Self {
        Self {
            cache,
            resolver,
            default_region: DEFAULT_REGION.to_string(),
        }
    }

    pub fn with_default_region(mut self, region: &str) -> Self {
        self.default_region = region.to_string();
        self
    }

    pub fn cache(&self) -> &Arc<BedrockClientCache> {
        &self.cache
    }

    pub async fn client_for(&self, source: &CredentialSource) -> Result<Client, NodeError> {
        match source {
            CredentialSource::Direct(credentials) => {
                credentials.validate()?;
                Ok(build_client(credentials, &self.default_region).await)
            }
            CredentialSource::Context(context) => {
                let resolver = &self.resolver;
                let default_region = &self.default_region;
                self.cache
                    .get_or_create(&context.cache_key(), || async move {
                        let credentials = resolver.resolve(context, AWS_CREDENTIAL).await?;
                        Ok::<_, NodeError>(build_client(&credentials, default_region).await)
                    })
                    .await
            }
        }
    }

    pub fn sweep(&self) {
        self.cache.sweep();
    }
}

pub async fn build_client(credentials: &AwsCredentials, default_region: &str) -> Client {
    let region = credentials.region_or(default_region).to_string();
    info!(region = %region, "Initializing Bedrock client");

    let sdk_credentials = Credentials::new(
        &credentials.access_key_id,
        &credentials.secret_access_key,
        None,
        None,
        "workflow-node",
    );
    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(region))
        .credentials_provider(sdk_credentials)
        .load()
        .await;

    Client::new(&aws_config)
}
