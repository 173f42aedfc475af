use crate::error::{ApiError, ErrorResponse, ServerErrorResponse};
use crate::handlers::parse_body;
use crate::models::{CourierLoginRequest, CourierLoginResponse, CourierRegisterRequest, OkResponse};
use crate::profiles::{text_field, CourierRegistration};
use crate::routes;
use crate::state::AppState;
use axum::{body::Bytes, extract::rejection::BytesRejection, extract::State, http::StatusCode, Json};

/// POST /couriers/register handler
#[utoipa::path(
    post,
    path = routes::COURIER_REGISTER,
    request_body = CourierRegisterRequest,
    responses(
        (status = 200, description = "Courier registered", body = OkResponse),
        (status = 400, description = "name, phone or code missing", body = ErrorResponse),
        (status = 409, description = "Code already registered", body = ErrorResponse),
        (status = 500, description = "Blob store error", body = ServerErrorResponse)
    ),
    tag = "couriers"
)]
pub async fn register_courier_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<OkResponse>), ApiError> {
    let registration = CourierRegistration::from_body(&parse_body(body)?);
    state.profiles.register_courier(registration).await?;

    Ok((StatusCode::OK, Json(OkResponse { ok: true })))
}

/// POST /couriers/login handler
#[utoipa::path(
    post,
    path = routes::COURIER_LOGIN,
    request_body = CourierLoginRequest,
    responses(
        (status = 200, description = "Login accepted", body = CourierLoginResponse),
        (status = 404, description = "Unknown code", body = ErrorResponse),
        (status = 500, description = "Blob store error", body = ServerErrorResponse)
    ),
    tag = "couriers"
)]
pub async fn login_courier_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<CourierLoginResponse>), ApiError> {
    let code = text_field(&parse_body(body)?, "code");

    match state.profiles.login_courier(&code).await? {
        Some(courier) => {
            tracing::info!("Courier logged in: {}", courier.code);
            Ok((StatusCode::OK, Json(CourierLoginResponse { ok: true, courier })))
        }
        None => {
            tracing::info!("Courier login rejected for code: {}", code);
            Err(ApiError::NotFound("NO_COURIER"))
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
            "/couriers/register",
            Some(json!({"name": "Kim", "phone": "010-1234-5678", "code": "C1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        let (status, _, body) =
            send(&app, "POST", "/couriers/login", Some(json!({"code": " C1 "}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["courier"]["phone"], "010-1234-5678");
        assert_eq!(body["courier"]["createdAt"], "2024-05-01 09:00:00");
    }

    #[tokio::test]
    async fn test_register_validation_and_duplicates() {
        let (_, app) = setup_test_app();

        let (status, _, body) = send(
            &app,
            "POST",
            "/couriers/register",
            Some(json!({"name": "Kim", "code": "C1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "name/phone/code required"}));

        let courier = json!({"name": "Kim", "phone": "010", "code": "C1"});
        send(&app, "POST", "/couriers/register", Some(courier.clone())).await;
        let (status, _, body) = send(&app, "POST", "/couriers/register", Some(courier)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({"error": "DUPLICATE_CODE"}));
    }

    #[tokio::test]
    async fn test_unknown_courier_is_404() {
        let (_, app) = setup_test_app();

        let (status, _, body) =
            send(&app, "POST", "/couriers/login", Some(json!({"code": "C404"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "NO_COURIER"}));
    }
}
