pub mod couriers;
pub mod data;
pub mod health;
pub mod reservations;
pub mod stores;

pub use couriers::{login_courier_handler, register_courier_handler};
pub use data::{data_method_not_allowed, delete_data_handler, get_data_handler, put_data_handler};
pub use health::health_handler;
pub use reservations::{
    get_by_reserve_handler, get_by_waybill_handler, list_reservations_handler,
    upsert_reservation_handler,
};
pub use stores::{login_store_handler, register_store_handler};

use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::Path;
use axum::http::{Method, Uri};
use serde_json::Value as JsonValue;

/// Decode a request body as JSON.
///
/// The body is read regardless of `Content-Type`. A body that cannot be
/// read or decoded is an unhandled failure rather than a validation error.
pub(crate) fn parse_body(body: Result<Bytes, BytesRejection>) -> Result<JsonValue, ApiError> {
    let body = body.map_err(|rejection| {
        ApiError::Server(anyhow::anyhow!("Failed to read request body: {}", rejection.body_text()))
    })?;
    serde_json::from_slice(&body).map_err(|e| {
        ApiError::Server(anyhow::Error::new(e).context("Request body is not valid JSON"))
    })
}

/// Unwrap a single path segment, turning undecodable input into a
/// `SERVER_ERROR` envelope instead of axum's plain-text rejection.
pub(crate) fn path_segment(path: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    path.map(|Path(segment)| segment).map_err(|rejection| {
        ApiError::Server(anyhow::anyhow!("Invalid path: {}", rejection.body_text()))
    })
}

/// Fallback for unknown paths and unsupported methods on known paths.
pub async fn no_route(method: Method, uri: Uri) -> ApiError {
    tracing::info!("No route for {} {}", method, uri.path());
    ApiError::NoRoute {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::app::{self, App};
    use crate::blob_store::MemoryBlobStore;
    use crate::config::{BlobBackend, Config};
    use crate::state::AppState;
    use crate::timestamp::stepping_clock;
    use axum::{
        body::Body,
        http::{HeaderMap, Request, StatusCode},
    };
    use serde_json::Value as JsonValue;
    use std::sync::Arc;
    use tower::ServiceExt;

    pub fn test_config() -> Config {
        Config {
            backend: BlobBackend::Memory,
            store_name: "handler-test".to_string(),
            service_port: 3000,
            service_host: "0.0.0.0".to_string(),
        }
    }

    pub fn setup_test_app() -> (Arc<MemoryBlobStore>, App) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let state = AppState::new(
            blobs.clone(),
            stepping_clock("2024-05-01 09:00:00"),
            test_config(),
        );
        (blobs, app::build(state))
    }

    /// Send one request through the app and decode the JSON response.
    pub async fn send(
        app: &App,
        method: &str,
        uri: &str,
        body: Option<JsonValue>,
    ) -> (StatusCode, HeaderMap, JsonValue) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }
}
