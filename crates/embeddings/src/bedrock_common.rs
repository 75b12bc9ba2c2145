use aws_sdk_bedrockruntime::{
    error::ProvideErrorMetadata, primitives::Blob, Client as BedrockClient,
};
use plugin_core::NodeError;
use tracing::error;

pub async fn invoke_bedrock(
    client: &BedrockClient,
    model_id: &str,
    body: Vec<u8>,
) -> Result<Vec<u8>, NodeError> {
    let blob = Blob::new(body);
    let response = client
        .invoke_model()
        .model_id(model_id)
        .content_type("application/json")
        .accept("application/json")
        .body(blob)
        .send()
        .await
        .map_err(|e| {
            error!(model_id, "Bedrock invoke_model failed: {}", e);
            let code = e.as_service_error().and_then(|se| se.code());
            let message = e
                .as_service_error()
                .and_then(|se| se.message())
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string());
            NodeError::from_provider_code(code, message)
        })?;
    Ok(response.body().as_ref().to_vec())
}
