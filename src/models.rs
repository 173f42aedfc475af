use serde::{Deserialize, Serialize};

use crate::profiles::{CourierProfile, StoreProfile};
use crate::reservations::Reservation;

/// Bare acknowledgement for registrations
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

/// Response type for successful upserts
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpsertResponse {
    pub ok: bool,
    #[schema(value_type = Object)]
    pub rec: Reservation,
}

/// Response type for successful store logins
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct StoreLoginResponse {
    pub ok: bool,
    pub store: StoreProfile,
}

/// Response type for successful courier logins
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourierLoginResponse {
    pub ok: bool,
    pub courier: CourierProfile,
}

/// Store registration and login body
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct StoreRequest {
    pub name: String,
    pub code: String,
}

/// Courier registration body
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourierRegisterRequest {
    pub name: String,
    pub phone: String,
    pub code: String,
}

/// Courier login body
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourierLoginRequest {
    pub code: String,
}

/// Value read from the `/data` endpoint; `value` is null when unset
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct DataValueResponse {
    pub ok: bool,
    pub key: String,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
}

/// Acknowledgement of a `/data` write or delete
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct DataKeyResponse {
    pub ok: bool,
    pub key: String,
}

/// `/data` write body
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct DataWriteRequest {
    pub key: String,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
}

/// `/data` delete body
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct DataDeleteRequest {
    pub key: String,
}
