use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use plugin_core::NodeError;
use serde_json::json;

/// HTTP wrapper around [`NodeError`].
#[derive(Debug)]
pub struct ApiError(pub NodeError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn body(&self) -> serde_json::Value {
        json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        })
    }
}

impl From<NodeError> for ApiError {
    fn from(error: NodeError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_node_errors_to_status_codes() {
        assert_eq!(
            ApiError(NodeError::Validation("x".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(NodeError::CredentialsNotFound("x".to_string())).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError(NodeError::AccessDenied("x".to_string())).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError(NodeError::UnknownNode("x".to_string())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(NodeError::ServiceOnly("x".to_string())).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn should_format_error_body() {
        let body = ApiError(NodeError::UnsupportedMethod {
            method: "summarize".to_string(),
            available: vec!["createEmbedding".to_string()],
        })
        .body();

        assert_eq!(body["kind"], "unsupported_method");
        assert_eq!(
            body["error"],
            "Unknown service method: summarize. Available methods: createEmbedding"
        );
    }
}
