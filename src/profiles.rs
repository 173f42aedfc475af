//! Store and courier profiles: registration and login by code.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::blob_store::{get_json, BlobStore, Consistency};
use crate::error::RecordError;
use crate::timestamp::{self, Clock};

pub const STORE_PREFIX: &str = "store:";
pub const COURIER_PREFIX: &str = "courier:";

pub fn store_key(code: &str) -> String {
    format!("{}{}", STORE_PREFIX, code)
}

pub fn courier_key(code: &str) -> String {
    format!("{}{}", COURIER_PREFIX, code)
}

/// A store as stored under `store:<code>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreProfile {
    pub name: String,
    pub code: String,
    pub created_at: String,
}

/// A courier as stored under `courier:<code>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourierProfile {
    pub name: String,
    pub phone: String,
    pub code: String,
    pub created_at: String,
}

/// Read a loosely typed form field as trimmed text.
///
/// Missing and `null` fields read as empty; numbers and booleans are
/// rendered as text.
pub fn text_field(body: &JsonValue, field: &str) -> String {
    match body.get(field) {
        Some(JsonValue::String(s)) => s.trim().to_string(),
        Some(JsonValue::Null) | None => String::new(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// Store credentials, used for both registration and login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCredentials {
    pub name: String,
    pub code: String,
}

impl StoreCredentials {
    pub fn from_body(body: &JsonValue) -> Self {
        Self {
            name: text_field(body, "name"),
            code: text_field(body, "code"),
        }
    }

    fn validate(&self) -> Result<(), RecordError> {
        if self.name.is_empty() || self.code.is_empty() {
            return Err(RecordError::Validation("name/code required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourierRegistration {
    pub name: String,
    pub phone: String,
    pub code: String,
}

impl CourierRegistration {
    pub fn from_body(body: &JsonValue) -> Self {
        Self {
            name: text_field(body, "name"),
            phone: text_field(body, "phone"),
            code: text_field(body, "code"),
        }
    }

    fn validate(&self) -> Result<(), RecordError> {
        if self.name.is_empty() || self.phone.is_empty() || self.code.is_empty() {
            return Err(RecordError::Validation("name/phone/code required".to_string()));
        }
        Ok(())
    }
}

/// Registration and login for stores and couriers.
#[derive(Clone)]
pub struct ProfileRegistry {
    blobs: Arc<dyn BlobStore>,
    clock: Clock,
}

impl ProfileRegistry {
    pub fn new(blobs: Arc<dyn BlobStore>, clock: Clock) -> Self {
        Self { blobs, clock }
    }

    pub async fn register_store(&self, credentials: StoreCredentials) -> Result<StoreProfile, RecordError> {
        credentials.validate()?;
        let key = store_key(&credentials.code);
        self.ensure_unclaimed(&key, &credentials.code).await?;

        let profile = StoreProfile {
            name: credentials.name,
            code: credentials.code,
            created_at: timestamp::format((self.clock)()),
        };
        self.blobs.set(&key, serde_json::to_string(&profile)?).await?;
        tracing::info!("Registered store {}", profile.code);
        Ok(profile)
    }

    /// The store registered under `code`, provided its name matches exactly.
    pub async fn login_store(&self, credentials: &StoreCredentials) -> Result<Option<StoreProfile>, RecordError> {
        let profile: Option<StoreProfile> =
            get_json(self.blobs.as_ref(), &store_key(&credentials.code)).await?;
        Ok(profile.filter(|p| p.name == credentials.name))
    }

    pub async fn register_courier(&self, registration: CourierRegistration) -> Result<CourierProfile, RecordError> {
        registration.validate()?;
        let key = courier_key(&registration.code);
        self.ensure_unclaimed(&key, &registration.code).await?;

        let profile = CourierProfile {
            name: registration.name,
            phone: registration.phone,
            code: registration.code,
            created_at: timestamp::format((self.clock)()),
        };
        self.blobs.set(&key, serde_json::to_string(&profile)?).await?;
        tracing::info!("Registered courier {}", profile.code);
        Ok(profile)
    }

    pub async fn login_courier(&self, code: &str) -> Result<Option<CourierProfile>, RecordError> {
        get_json(self.blobs.as_ref(), &courier_key(code)).await
    }

    // Check-then-write; two racing registrations of one code can both pass.
    async fn ensure_unclaimed(&self, key: &str, code: &str) -> Result<(), RecordError> {
        if self.blobs.get(key, Consistency::Strong).await?.is_some() {
            return Err(RecordError::DuplicateCode(code.to_string()));
        }
        Ok(())
    }
}
