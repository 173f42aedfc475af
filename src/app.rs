use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::routes;
use crate::state::AppState;

/// The complete service: router plus trailing-slash normalization.
pub type App = NormalizePath<Router>;

/// JSON API routes. Every response, including fallbacks, is JSON and
/// must not be cached.
fn api_router(state: AppState) -> Router {
    Router::new()
        .route(routes::HEALTH, get(handlers::health_handler))
        .route(routes::RESERVATIONS, get(handlers::list_reservations_handler))
        .route(routes::RESERVATION_BY_RESERVE, get(handlers::get_by_reserve_handler))
        .route(routes::RESERVATION_BY_WAYBILL, get(handlers::get_by_waybill_handler))
        .route(routes::RESERVATION_UPSERT, post(handlers::upsert_reservation_handler))
        .route(routes::STORE_REGISTER, post(handlers::register_store_handler))
        .route(routes::STORE_LOGIN, post(handlers::login_store_handler))
        .route(routes::COURIER_REGISTER, post(handlers::register_courier_handler))
        .route(routes::COURIER_LOGIN, post(handlers::login_courier_handler))
        .fallback(handlers::no_route)
        .method_not_allowed_fallback(handlers::no_route)
        .route(
            routes::DATA,
            get(handlers::get_data_handler)
                .post(handlers::put_data_handler)
                .delete(handlers::delete_data_handler)
                .fallback(handlers::data_method_not_allowed),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new(routes::SWAGGER_UI).url(routes::OPENAPI_JSON, ApiDoc::openapi()))
        .merge(api_router(state))
        .layer(TraceLayer::new_for_http())
}

/// Build the service, trimming trailing slashes before routing.
pub fn build(state: AppState) -> App {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}
