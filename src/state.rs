use crate::blob_store::BlobStore;
use crate::config::Config;
use crate::data_store::DataStore;
use crate::profiles::ProfileRegistry;
use crate::reservations::ReservationIndex;
use crate::timestamp::Clock;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub blobs: Arc<dyn BlobStore>,
    pub reservations: ReservationIndex,
    pub profiles: ProfileRegistry,
    pub data: DataStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(blobs: Arc<dyn BlobStore>, clock: Clock, config: Config) -> Self {
        Self {
            reservations: ReservationIndex::new(blobs.clone(), clock.clone()),
            profiles: ProfileRegistry::new(blobs.clone(), clock),
            data: DataStore::new(blobs.clone()),
            blobs,
            config: Arc::new(config),
        }
    }
}
