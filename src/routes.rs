// Route path constants - single source of truth for all API paths

pub const HEALTH: &str = "/health";
pub const RESERVATIONS: &str = "/reservations";
pub const RESERVATION_BY_RESERVE: &str = "/reservations/byReserve/{reserve_no}";
pub const RESERVATION_BY_WAYBILL: &str = "/reservations/byWaybill/{waybill_no}";
pub const RESERVATION_UPSERT: &str = "/reservations/upsert";
pub const STORE_REGISTER: &str = "/stores/register";
pub const STORE_LOGIN: &str = "/stores/login";
pub const COURIER_REGISTER: &str = "/couriers/register";
pub const COURIER_LOGIN: &str = "/couriers/login";
pub const DATA: &str = "/data";
pub const SWAGGER_UI: &str = "/swagger-ui";
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";
