use crate::error::{DataError, DataErrorResponse};
use crate::models::{DataDeleteRequest, DataKeyResponse, DataValueResponse, DataWriteRequest};
use crate::routes;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::rejection::{BytesRejection, QueryRejection},
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DataQuery {
    /// Key to read
    pub key: Option<String>,
}

fn required_key(key: Option<&str>) -> Result<&str, DataError> {
    key.filter(|key| !key.is_empty()).ok_or(DataError::MissingKey)
}

/// Decode a `/data` body. An empty body counts as `{}`.
fn data_body(body: Result<Bytes, BytesRejection>) -> Result<JsonValue, DataError> {
    let body = body.map_err(|rejection| {
        DataError::Failed(anyhow::anyhow!("Failed to read request body: {}", rejection.body_text()))
    })?;
    if body.is_empty() {
        return Ok(JsonValue::Object(Map::new()));
    }
    serde_json::from_slice(&body).map_err(|e| {
        DataError::Failed(anyhow::Error::new(e).context("Request body is not valid JSON"))
    })
}

fn body_key(body: &JsonValue) -> Result<String, DataError> {
    required_key(body.get("key").and_then(JsonValue::as_str)).map(str::to_string)
}

/// GET /data handler - Read a stored JSON value
#[utoipa::path(
    get,
    path = routes::DATA,
    params(DataQuery),
    responses(
        (status = 200, description = "Stored value, or null when unset", body = DataValueResponse),
        (status = 400, description = "key missing", body = DataErrorResponse),
        (status = 500, description = "Blob store error", body = DataErrorResponse)
    ),
    tag = "data"
)]
pub async fn get_data_handler(
    State(state): State<AppState>,
    query: Result<Query<DataQuery>, QueryRejection>,
) -> Result<(StatusCode, Json<DataValueResponse>), DataError> {
    let Query(query) = query.map_err(|rejection| {
        DataError::Failed(anyhow::anyhow!("Invalid query: {}", rejection.body_text()))
    })?;
    let key = required_key(query.key.as_deref())?;
    let value = state.data.get(key).await?;

    tracing::info!("Read data value {} (found: {})", key, value.is_some());
    Ok((
        StatusCode::OK,
        Json(DataValueResponse {
            ok: true,
            key: key.to_string(),
            value: value.unwrap_or(JsonValue::Null),
        }),
    ))
}

/// POST /data handler - Store a JSON value
///
/// A missing `value` is stored as null.
#[utoipa::path(
    post,
    path = routes::DATA,
    request_body = DataWriteRequest,
    responses(
        (status = 200, description = "Value stored", body = DataKeyResponse),
        (status = 400, description = "key missing", body = DataErrorResponse),
        (status = 500, description = "Unreadable body or blob store error", body = DataErrorResponse)
    ),
    tag = "data"
)]
pub async fn put_data_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<DataKeyResponse>), DataError> {
    let body = data_body(body)?;
    let key = body_key(&body)?;
    let value = body.get("value").cloned().unwrap_or(JsonValue::Null);
    state.data.put(&key, &value).await?;

    tracing::info!("Stored data value {}", key);
    Ok((StatusCode::OK, Json(DataKeyResponse { ok: true, key })))
}

/// DELETE /data handler - Remove a stored value
#[utoipa::path(
    delete,
    path = routes::DATA,
    request_body = DataDeleteRequest,
    responses(
        (status = 200, description = "Value removed (or was never set)", body = DataKeyResponse),
        (status = 400, description = "key missing", body = DataErrorResponse),
        (status = 500, description = "Unreadable body or blob store error", body = DataErrorResponse)
    ),
    tag = "data"
)]
pub async fn delete_data_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<DataKeyResponse>), DataError> {
    let key = body_key(&data_body(body)?)?;
    state.data.remove(&key).await?;

    tracing::info!("Removed data value {}", key);
    Ok((StatusCode::OK, Json(DataKeyResponse { ok: true, key })))
}

/// Any other method on `/data`.
pub async fn data_method_not_allowed() -> DataError {
    DataError::MethodNotAllowed
}
