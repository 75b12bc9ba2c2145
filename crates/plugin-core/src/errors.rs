use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("AWS credentials not found: {0}")]
    CredentialsNotFound(String),

    #[error("Invalid model or parameters for Bedrock: {0}")]
    InvalidModel(String),

    #[error("AWS credentials lack permission to access Bedrock: {0}")]
    AccessDenied(String),

    #[error("Selected model not available in your AWS region: {0}")]
    ModelNotAvailable(String),

    #[error("Bedrock request failed: {0}")]
    Provider(String),

    #[error("Failed to fetch image from URL: {0}")]
    ImageFetch(String),

    #[error("Invalid tool schema: {0}")]
    ToolSchema(String),

    #[error("Unknown service method: {method}. Available methods: {}", .available.join(", "))]
    UnsupportedMethod {
        method: String,
        available: Vec<String>,
    },

    #[error("{0} is a service node and can only be invoked through service calls")]
    ServiceOnly(String),

    #[error("{0} does not provide any service methods")]
    NotAService(String),

    #[error("Node type '{0}' is not registered")]
    UnknownNode(String),
}

impl NodeError {
    /// Maps a Bedrock error code (e.g. `AccessDeniedException`) to a distinct error kind.
    pub fn from_provider_code(code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            Some("ValidationException") => NodeError::InvalidModel(message),
            Some("AccessDeniedException") => NodeError::AccessDenied(message),
            Some("ResourceNotFoundException") => NodeError::ModelNotAvailable(message),
            _ => NodeError::Provider(message),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NodeError::Validation(_) => "validation",
            NodeError::CredentialsNotFound(_) => "credentials_not_found",
            NodeError::InvalidModel(_) => "invalid_model",
            NodeError::AccessDenied(_) => "access_denied",
            NodeError::ModelNotAvailable(_) => "model_not_available",
            NodeError::Provider(_) => "provider",
            NodeError::ImageFetch(_) => "image_fetch",
            NodeError::ToolSchema(_) => "tool_schema",
            NodeError::UnsupportedMethod { .. } => "unsupported_method",
            NodeError::ServiceOnly(_) => "service_only",
            NodeError::NotAService(_) => "not_a_service",
            NodeError::UnknownNode(_) => "unknown_node",
        }
    }

    /// Returns the HTTP status code the plugin host reports for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            NodeError::Validation(_) => 400,
            NodeError::CredentialsNotFound(_) => 401,
            NodeError::InvalidModel(_) => 400,
            NodeError::AccessDenied(_) => 403,
            NodeError::ModelNotAvailable(_) => 404,
            NodeError::Provider(_) => 502,
            NodeError::ImageFetch(_) => 422,
            NodeError::ToolSchema(_) => 400,
            NodeError::UnsupportedMethod { .. } => 400,
            NodeError::ServiceOnly(_) => 409,
            NodeError::NotAService(_) => 409,
            NodeError::UnknownNode(_) => 404,
        }
    }
}
