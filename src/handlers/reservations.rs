use crate::error::{ApiError, ErrorResponse, ServerErrorResponse};
use crate::handlers::{parse_body, path_segment};
use crate::models::UpsertResponse;
use crate::reservations::Reservation;
use crate::routes;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::rejection::{BytesRejection, PathRejection},
    extract::{Path, State},
    http::StatusCode,
    Json,
};

/// GET /reservations handler - List every reservation
///
/// Most recently updated first; no pagination.
#[utoipa::path(
    get,
    path = routes::RESERVATIONS,
    responses(
        (status = 200, description = "All reservations, newest update first", body = Vec<serde_json::Value>),
        (status = 500, description = "Blob store error", body = ServerErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn list_reservations_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Reservation>>), ApiError> {
    let reservations = state.reservations.list_all().await?;

    tracing::info!("Listed {} reservations", reservations.len());
    Ok((StatusCode::OK, Json(reservations)))
}

/// GET /reservations/byReserve/{reserve_no} handler
#[utoipa::path(
    get,
    path = routes::RESERVATION_BY_RESERVE,
    params(
        ("reserve_no" = String, Path, description = "Reservation number")
    ),
    responses(
        (status = 200, description = "Reservation found", body = serde_json::Value),
        (status = 404, description = "No such reservation", body = ErrorResponse),
        (status = 500, description = "Blob store error", body = ServerErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn get_by_reserve_handler(
    State(state): State<AppState>,
    reserve_no: Result<Path<String>, PathRejection>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let reserve_no = path_segment(reserve_no)?;
    match state.reservations.get_by_reserve(&reserve_no).await? {
        Some(reservation) => {
            tracing::info!("Retrieved reservation {}", reserve_no);
            Ok((StatusCode::OK, Json(reservation)))
        }
        None => {
            tracing::info!("Reservation not found: {}", reserve_no);
            Err(ApiError::NotFound("NOT_FOUND"))
        }
    }
}

/// GET /reservations/byWaybill/{waybill_no} handler
#[utoipa::path(
    get,
    path = routes::RESERVATION_BY_WAYBILL,
    params(
        ("waybill_no" = String, Path, description = "Waybill number")
    ),
    responses(
        (status = 200, description = "Reservation found", body = serde_json::Value),
        (status = 404, description = "No reservation carries this waybill", body = ErrorResponse),
        (status = 500, description = "Blob store error", body = ServerErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn get_by_waybill_handler(
    State(state): State<AppState>,
    waybill_no: Result<Path<String>, PathRejection>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let waybill_no = path_segment(waybill_no)?;
    match state.reservations.get_by_waybill(&waybill_no).await? {
        Some(reservation) => {
            tracing::info!(
                "Retrieved reservation {} by waybill {}",
                reservation.reserve_no,
                waybill_no
            );
            Ok((StatusCode::OK, Json(reservation)))
        }
        None => {
            tracing::info!("No reservation for waybill: {}", waybill_no);
            Err(ApiError::NotFound("NOT_FOUND"))
        }
    }
}

/// POST /reservations/upsert handler - Create or fully replace a reservation
#[utoipa::path(
    post,
    path = routes::RESERVATION_UPSERT,
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Reservation stored", body = UpsertResponse),
        (status = 400, description = "reserveNo missing", body = ErrorResponse),
        (status = 500, description = "Blob store error or unreadable body", body = ServerErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn upsert_reservation_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<UpsertResponse>), ApiError> {
    let reservation = Reservation::from_request(parse_body(body)?)?;
    let saved = state.reservations.upsert(reservation).await?;

    tracing::info!("Upserted reservation {}", saved.reserve_no);
    Ok((
        StatusCode::OK,
        Json(UpsertResponse {
            ok: true,
            rec: saved,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use crate::blob_store::BlobStore;
    use crate::handlers::test_support::{send, setup_test_app};
    use axum::http::{header, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_then_get_by_reserve() {
        let (_, app) = setup_test_app();

        let (status, _, body) = send(
            &app,
            "POST",
            "/reservations/upsert",
            Some(json!({"reserveNo": "A1", "waybillNo": "W1", "foo": "bar"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["rec"]["reserveNo"], "A1");
        assert_eq!(body["rec"]["updatedAt"], "2024-05-01 09:00:00");

        let (status, _, body) = send(&app, "GET", "/reservations/byReserve/A1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"reserveNo": "A1", "waybillNo": "W1", "foo": "bar", "updatedAt": "2024-05-01 09:00:00"})
        );
    }

    #[tokio::test]
    async fn test_get_by_waybill_returns_same_record() {
        let (_, app) = setup_test_app();
        send(
            &app,
            "POST",
            "/reservations/upsert",
            Some(json!({"reserveNo": "A1", "waybillNo": "W1", "foo": "bar"})),
        )
        .await;

        let (status, _, by_waybill) = send(&app, "GET", "/reservations/byWaybill/W1", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, _, by_reserve) = send(&app, "GET", "/reservations/byReserve/A1", None).await;
        assert_eq!(by_waybill, by_reserve);
    }

    #[tokio::test]
    async fn test_missing_reservation_is_404() {
        let (_, app) = setup_test_app();

        for uri in ["/reservations/byReserve/does-not-exist", "/reservations/byWaybill/nope"] {
            let (status, _, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(body, json!({"error": "NOT_FOUND"}));
        }
    }

    #[tokio::test]
    async fn test_index_rot_is_404() {
        let (blobs, app) = setup_test_app();
        send(
            &app,
            "POST",
            "/reservations/upsert",
            Some(json!({"reserveNo": "A1", "waybillNo": "W1"})),
        )
        .await;
        blobs.delete("res:A1").await.unwrap();

        let (status, _, body) = send(&app, "GET", "/reservations/byWaybill/W1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_upsert_without_reserve_no_is_400() {
        let (_, app) = setup_test_app();

        let (status, _, body) = send(
            &app,
            "POST",
            "/reservations/upsert",
            Some(json!({"waybillNo": "W1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "reserveNo required"}));
    }

    #[tokio::test]
    async fn test_upsert_with_unparsable_body_is_500() {
        let (_, app) = setup_test_app();

        let response = tower::ServiceExt::oneshot(
            app,
            axum::http::Request::builder()
                .method("POST")
                .uri("/reservations/upsert")
                .body(axum::body::Body::from("{invalid json}"))
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "SERVER_ERROR");
        assert!(body["detail"].as_str().unwrap().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_server_error() {
        let (_, app) = setup_test_app();

        let (status, headers, body) = send(
            &app,
            "POST",
            "/reservations/upsert",
            Some(json!({"reserveNo": "A1", "memo": "x".repeat(3 * 1024 * 1024)})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json; charset=utf-8");
        assert_eq!(body["error"], "SERVER_ERROR");
        assert!(body["detail"].as_str().unwrap().contains("Failed to read request body"));
    }

    #[tokio::test]
    async fn test_null_reserve_no_is_400() {
        let (_, app) = setup_test_app();

        let (status, _, body) = send(
            &app,
            "POST",
            "/reservations/upsert",
            Some(json!({"reserveNo": null, "waybillNo": "W1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "reserveNo required"}));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_instead_of_merging() {
        let (_, app) = setup_test_app();
        send(&app, "POST", "/reservations/upsert", Some(json!({"reserveNo": "A1", "x": 1}))).await;
        send(&app, "POST", "/reservations/upsert", Some(json!({"reserveNo": "A1", "y": 2}))).await;

        let (_, _, body) = send(&app, "GET", "/reservations/byReserve/A1", None).await;
        assert!(body.get("x").is_none());
        assert_eq!(body["y"], 2);
    }

    #[tokio::test]
    async fn test_list_is_sorted_by_updated_at_desc() {
        let (_, app) = setup_test_app();
        for reserve_no in ["A1", "A2", "A3"] {
            send(
                &app,
                "POST",
                "/reservations/upsert",
                Some(json!({"reserveNo": reserve_no})),
            )
            .await;
        }

        let (status, headers, body) = send(&app, "GET", "/reservations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");

        let order: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["reserveNo"].as_str().unwrap())
            .collect();
        assert_eq!(order, vec!["A3", "A2", "A1"]);
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let (_, app) = setup_test_app();

        let (status, _, body) = send(&app, "GET", "/reservations/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_undecodable_path_segment_is_server_error() {
        let (_, app) = setup_test_app();

        for uri in ["/reservations/byReserve/%FF", "/reservations/byWaybill/%FF%FE"] {
            let (status, headers, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
            assert_eq!(headers[header::CONTENT_TYPE], "application/json; charset=utf-8");
            assert_eq!(body["error"], "SERVER_ERROR");
            assert!(body["detail"].as_str().unwrap().contains("Invalid path"));
        }
    }

    #[tokio::test]
    async fn test_path_segments_are_percent_decoded() {
        let (_, app) = setup_test_app();
        send(
            &app,
            "POST",
            "/reservations/upsert",
            Some(json!({"reserveNo": "예약 1", "waybillNo": "W/1"})),
        )
        .await;

        let (status, _, body) =
            send(&app, "GET", "/reservations/byReserve/%EC%98%88%EC%95%BD%201", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["waybillNo"], "W/1");

        let (status, _, body) = send(&app, "GET", "/reservations/byWaybill/W%2F1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reserveNo"], "예약 1");
    }
}
