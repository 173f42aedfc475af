use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error response type
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response body for requests that matched no route
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct NoRouteResponse {
    pub error: String,
    pub method: String,
    pub path: String,
}

/// Response body for unhandled failures
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ServerErrorResponse {
    pub error: String,
    pub detail: String,
}

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Response type for unhealthy status
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UnhealthyResponse {
    pub status: String,
    pub error: String,
}

/// Error body of the `/data` endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct DataErrorResponse {
    pub ok: bool,
    pub error: String,
}

/// Failures raised by the record layer (reservations and profiles).
///
/// "Not found" is never an error here; lookups return `Option`.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A required input field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// A profile with this code is already registered.
    #[error("code already registered: {0}")]
    DuplicateCode(String),

    /// A stored value could not be decoded.
    #[error("stored record {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be encoded for storage.
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// The blob store rejected or failed the operation.
    #[error(transparent)]
    Blob(#[from] anyhow::Error),
}

/// Custom error type for API endpoints
///
/// Every handler returns this on failure, so each failure mode maps to
/// exactly one status code and JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input field
    Validation(String),
    /// Registration code already taken
    DuplicateCode,
    /// Lookup found nothing; carries the wire error code
    NotFound(&'static str),
    /// No handler for this method and path
    NoRoute { method: String, path: String },
    /// Anything else, surfaced as a 500 with its message
    Server(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error: message }),
            )
                .into_response(),
            ApiError::DuplicateCode => (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "DUPLICATE_CODE".to_string(),
                }),
            )
                .into_response(),
            ApiError::NotFound(code) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: code.to_string(),
                }),
            )
                .into_response(),
            ApiError::NoRoute { method, path } => (
                StatusCode::NOT_FOUND,
                Json(NoRouteResponse {
                    error: "NO_ROUTE".to_string(),
                    method,
                    path,
                }),
            )
                .into_response(),
            ApiError::Server(err) => {
                tracing::error!("Request failed: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ServerErrorResponse {
                        error: "SERVER_ERROR".to_string(),
                        detail: format!("{:#}", err),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Validation(message) => ApiError::Validation(message),
            RecordError::DuplicateCode(_) => ApiError::DuplicateCode,
            RecordError::Blob(err) => ApiError::Server(err),
            other => ApiError::Server(other.into()),
        }
    }
}

/// Errors of the `/data` endpoint, which answers in its own
/// `{ok: false, error}` envelope.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Missing key")]
    MissingKey,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{0:#}")]
    Failed(anyhow::Error),
}

impl IntoResponse for DataError {
    fn into_response(self) -> Response {
        let status = match &self {
            DataError::MissingKey => StatusCode::BAD_REQUEST,
            DataError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            DataError::Failed(err) => {
                tracing::error!("Data request failed: {:#}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(DataErrorResponse {
                ok: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<RecordError> for DataError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Blob(err) => DataError::Failed(err),
            other => DataError::Failed(other.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Server(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_record_errors_map_to_status_codes() {
        let (status, body) =
            body_json(RecordError::Validation("reserveNo required".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "reserveNo required"}));

        let (status, body) = body_json(RecordError::DuplicateCode("S1".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, serde_json::json!({"error": "DUPLICATE_CODE"}));
    }

    #[tokio::test]
    async fn test_corrupt_record_is_server_error_with_detail() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: ApiError = RecordError::Corrupt {
            key: "res:A1".to_string(),
            source,
        }
        .into();

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "SERVER_ERROR");
        assert!(body["detail"].as_str().unwrap().contains("res:A1"));
    }

    #[tokio::test]
    async fn test_data_errors_use_ok_false_envelope() {
        let response = DataError::MissingKey.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = DataError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = DataError::Failed(anyhow::anyhow!("disk full")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
            serde_json::json!({"ok": false, "error": "disk full"})
        );
    }

    #[tokio::test]
    async fn test_no_route_echoes_method_and_path() {
        let (status, body) = body_json(ApiError::NoRoute {
            method: "DELETE".to_string(),
            path: "/reservations".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            serde_json::json!({"error": "NO_ROUTE", "method": "DELETE", "path": "/reservations"})
        );
    }
}
