use utoipa::OpenApi;

use crate::error::{
    DataErrorResponse, ErrorResponse, HealthResponse, NoRouteResponse, ServerErrorResponse, UnhealthyResponse,
};
use crate::handlers;
use crate::models::{
    CourierLoginRequest, CourierLoginResponse, CourierRegisterRequest, DataDeleteRequest,
    DataKeyResponse, DataValueResponse, DataWriteRequest, OkResponse,
    StoreLoginResponse, StoreRequest, UpsertResponse,
};
use crate::profiles::{CourierProfile, StoreProfile};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "courier-reservations API",
        version = "1.0.0",
        description = "Courier reservation tracking backed by a key-value blob store"
    ),
    paths(
        handlers::health::health_handler,
        handlers::reservations::list_reservations_handler,
        handlers::reservations::get_by_reserve_handler,
        handlers::reservations::get_by_waybill_handler,
        handlers::reservations::upsert_reservation_handler,
        handlers::stores::register_store_handler,
        handlers::stores::login_store_handler,
        handlers::couriers::register_courier_handler,
        handlers::couriers::login_courier_handler,
        handlers::data::get_data_handler,
        handlers::data::put_data_handler,
        handlers::data::delete_data_handler
    ),
    components(
        schemas(
            OkResponse,
            UpsertResponse,
            StoreRequest,
            StoreLoginResponse,
            StoreProfile,
            CourierRegisterRequest,
            CourierLoginRequest,
            CourierLoginResponse,
            CourierProfile,
            DataValueResponse,
            DataKeyResponse,
            DataWriteRequest,
            DataDeleteRequest,
            DataErrorResponse,
            ErrorResponse,
            NoRouteResponse,
            ServerErrorResponse,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "reservations", description = "Reservation records and waybill lookup"),
        (name = "stores", description = "Store registration and login"),
        (name = "couriers", description = "Courier registration and login"),
        (name = "data", description = "Free-form JSON values kept apart from reservation data")
    )
)]
pub struct ApiDoc;
