//! Reservation records and their waybill index.
//!
//! Key layout:
//! - `res:<reserveNo>` holds the JSON record and is the source of truth.
//! - `wb:<waybillNo>` holds the bare `reserveNo` of the owning record.
//!
//! The index is written after the record and is never authoritative: a
//! pointer only resolves if the record it names still carries that waybill.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

use crate::blob_store::{get_json, BlobStore, Consistency};
use crate::error::RecordError;
use crate::timestamp::{self, Clock};

pub const RESERVATION_PREFIX: &str = "res:";
pub const WAYBILL_PREFIX: &str = "wb:";

pub fn reservation_key(reserve_no: &str) -> String {
    format!("{}{}", RESERVATION_PREFIX, reserve_no)
}

pub fn waybill_key(waybill_no: &str) -> String {
    format!("{}{}", WAYBILL_PREFIX, waybill_no)
}

/// A reservation as stored under `res:<reserveNo>`.
///
/// Only the identifiers and `updatedAt` are interpreted; every other field
/// is carried through untouched in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(rename = "reserveNo", default)]
    pub reserve_no: String,
    #[serde(rename = "waybillNo", default, skip_serializing_if = "Option::is_none")]
    pub waybill_no: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, JsonValue>,
}

impl Reservation {
    /// Validate a request body into a reservation.
    pub fn from_request(body: JsonValue) -> Result<Self, RecordError> {
        let present = match body.get("reserveNo") {
            None | Some(JsonValue::Null) => false,
            Some(JsonValue::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if !present {
            return Err(RecordError::Validation("reserveNo required".to_string()));
        }
        serde_json::from_value(body)
            .map_err(|e| RecordError::Validation(format!("invalid reservation: {}", e)))
    }

    /// The waybill number, if one has been assigned.
    pub fn waybill(&self) -> Option<&str> {
        self.waybill_no.as_deref().filter(|w| !w.is_empty())
    }

    fn sort_key(&self) -> &str {
        self.updated_at.as_deref().unwrap_or("")
    }
}

/// Reservation records keyed by reservation number, with a secondary
/// lookup by waybill number.
#[derive(Clone)]
pub struct ReservationIndex {
    blobs: Arc<dyn BlobStore>,
    clock: Clock,
}

impl ReservationIndex {
    pub fn new(blobs: Arc<dyn BlobStore>, clock: Clock) -> Self {
        Self { blobs, clock }
    }

    /// Store `reservation`, replacing any previous record with the same
    /// reservation number, and point its waybill at it.
    ///
    /// `updatedAt` is always overwritten with the current time. When the
    /// waybill changed, the previous waybill's pointer is removed once the
    /// new one is in place. A failure after the record write leaves the
    /// index behind; nothing is rolled back.
    pub async fn upsert(&self, mut reservation: Reservation) -> Result<Reservation, RecordError> {
        if reservation.reserve_no.is_empty() {
            return Err(RecordError::Validation("reserveNo required".to_string()));
        }

        let previous_waybill = self.previous_waybill(&reservation.reserve_no).await?;

        reservation.updated_at = Some(timestamp::format((self.clock)()));
        let key = reservation_key(&reservation.reserve_no);
        self.blobs
            .set(&key, serde_json::to_string(&reservation)?)
            .await?;

        if let Some(waybill_no) = reservation.waybill() {
            self.blobs
                .set(&waybill_key(waybill_no), reservation.reserve_no.clone())
                .await?;
        }

        if let Some(stale) = previous_waybill.filter(|old| Some(old.as_str()) != reservation.waybill()) {
            self.retire_waybill(&stale, &reservation.reserve_no).await?;
        }

        tracing::debug!(
            "Upserted reservation {} (waybill: {:?})",
            reservation.reserve_no,
            reservation.waybill()
        );
        Ok(reservation)
    }

    /// Look up a reservation by its reservation number.
    pub async fn get_by_reserve(&self, reserve_no: &str) -> Result<Option<Reservation>, RecordError> {
        get_json(self.blobs.as_ref(), &reservation_key(reserve_no)).await
    }

    /// Look up a reservation through its waybill pointer.
    ///
    /// A pointer to a missing record, or to a record that has since moved
    /// to another waybill, resolves to `None`.
    pub async fn get_by_waybill(&self, waybill_no: &str) -> Result<Option<Reservation>, RecordError> {
        let Some(reserve_no) = self
            .blobs
            .get(&waybill_key(waybill_no), Consistency::Strong)
            .await?
        else {
            return Ok(None);
        };

        match self.get_by_reserve(&reserve_no).await? {
            Some(reservation) if reservation.waybill() == Some(waybill_no) => Ok(Some(reservation)),
            Some(reservation) => {
                tracing::warn!(
                    "Waybill {} points to reservation {} which now carries {:?}",
                    waybill_no,
                    reserve_no,
                    reservation.waybill()
                );
                Ok(None)
            }
            None => {
                tracing::warn!(
                    "Waybill {} points to missing reservation {}",
                    waybill_no,
                    reserve_no
                );
                Ok(None)
            }
        }
    }

    /// Every stored reservation, most recently updated first.
    ///
    /// Records without `updatedAt` sort last. Records that vanish between
    /// listing and reading are dropped; records that fail to decode are
    /// logged and skipped.
    pub async fn list_all(&self) -> Result<Vec<Reservation>, RecordError> {
        let keys = self.blobs.list(RESERVATION_PREFIX).await?;

        let mut reservations = Vec::with_capacity(keys.len());
        for key in keys {
            match get_json::<Reservation>(self.blobs.as_ref(), &key).await {
                Ok(Some(reservation)) => reservations.push(reservation),
                Ok(None) => {}
                Err(RecordError::Corrupt { key, source }) => {
                    tracing::warn!("Skipping corrupt reservation {}: {}", key, source);
                }
                Err(e) => return Err(e),
            }
        }

        reservations.sort_by(|a, b| b.sort_key().cmp(a.sort_key()));
        Ok(reservations)
    }

    async fn previous_waybill(&self, reserve_no: &str) -> Result<Option<String>, RecordError> {
        match self.get_by_reserve(reserve_no).await {
            Ok(previous) => Ok(previous.and_then(|p| p.waybill().map(str::to_string))),
            Err(RecordError::Corrupt { key, source }) => {
                tracing::warn!("Overwriting corrupt reservation {}: {}", key, source);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn retire_waybill(&self, waybill_no: &str, reserve_no: &str) -> Result<(), RecordError> {
        let key = waybill_key(waybill_no);
        let owner = self.blobs.get(&key, Consistency::Strong).await?;
        if owner.as_deref() == Some(reserve_no) {
            self.blobs.delete(&key).await?;
            tracing::debug!("Retired waybill {} of reservation {}", waybill_no, reserve_no);
        }
        Ok(())
    }
}
