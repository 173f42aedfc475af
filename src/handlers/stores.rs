use crate::error::{ApiError, ErrorResponse, ServerErrorResponse};
use crate::handlers::parse_body;
use crate::models::{OkResponse, StoreLoginResponse, StoreRequest};
use crate::profiles::StoreCredentials;
use crate::routes;
use crate::state::AppState;
use axum::{body::Bytes, extract::rejection::BytesRejection, extract::State, http::StatusCode, Json};

/// POST /stores/register handler
#[utoipa::path(
    post,
    path = routes::STORE_REGISTER,
    request_body = StoreRequest,
    responses(
        (status = 200, description = "Store registered", body = OkResponse),
        (status = 400, description = "name or code missing", body = ErrorResponse),
        (status = 409, description = "Code already registered", body = ErrorResponse),
        (status = 500, description = "Blob store error", body = ServerErrorResponse)
    ),
    tag = "stores"
)]
pub async fn register_store_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<OkResponse>), ApiError> {
    let credentials = StoreCredentials::from_body(&parse_body(body)?);
    state.profiles.register_store(credentials).await?;

    Ok((StatusCode::OK, Json(OkResponse { ok: true })))
}

/// POST /stores/login handler
///
/// Both the code and the exact store name must match.
#[utoipa::path(
    post,
    path = routes::STORE_LOGIN,
    request_body = StoreRequest,
    responses(
        (status = 200, description = "Login accepted", body = StoreLoginResponse),
        (status = 404, description = "Unknown code or wrong name", body = ErrorResponse),
        (status = 500, description = "Blob store error", body = ServerErrorResponse)
    ),
    tag = "stores"
)]
pub async fn login_store_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<StoreLoginResponse>), ApiError> {
    let credentials = StoreCredentials::from_body(&parse_body(body)?);

    match state.profiles.login_store(&credentials).await? {
        Some(store) => {
            tracing::info!("Store logged in: {}", store.code);
            Ok((StatusCode::OK, Json(StoreLoginResponse { ok: true, store })))
        }
        None => {
            tracing::info!("Store login rejected for code: {}", credentials.code);
            Err(ApiError::NotFound("NO_STORE"))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{send, setup_test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_login() {
        let (_, app) = setup_test_app();

        let (status, _, body) = send(
            &app,
            "POST",
            "/stores/register",
            Some(json!({"name": " store1 ", "code": "S1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        let (status, _, body) = send(
            &app,
            "POST",
            "/stores/login",
            Some(json!({"name": "store1", "code": "S1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "ok": true,
                "store": {"name": "store1", "code": "S1", "createdAt": "2024-05-01 09:00:00"}
            })
        );
    }

    #[tokio::test]
    async fn test_duplicate_code_is_409() {
        let (_, app) = setup_test_app();
        let store = json!({"name": "store1", "code": "S1"});

        send(&app, "POST", "/stores/register", Some(store.clone())).await;
        let (status, _, body) = send(&app, "POST", "/stores/register", Some(store)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({"error": "DUPLICATE_CODE"}));
    }

    #[tokio::test]
    async fn test_register_requires_name_and_code() {
        let (_, app) = setup_test_app();

        let (status, _, body) =
            send(&app, "POST", "/stores/register", Some(json!({"name": "  ", "code": "S1"}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "name/code required"}));
    }

    #[tokio::test]
    async fn test_login_with_wrong_name_is_404() {
        let (_, app) = setup_test_app();
        send(
            &app,
            "POST",
            "/stores/register",
            Some(json!({"name": "store1", "code": "S1"})),
        )
        .await;

        for attempt in [json!({"name": "store2", "code": "S1"}), json!({"name": "store1", "code": "S9"})] {
            let (status, _, body) = send(&app, "POST", "/stores/login", Some(attempt)).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({"error": "NO_STORE"}));
        }
    }
}
