use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plant::PlantId;

/// Failure of the persistent store collaborator. Not recovered inside
/// the core: read or write failures during a watering update propagate
/// to the caller as-is, with no retry and no rollback of partial writes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read data from the store: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("no schedule record for plant {0}")]
    MissingRecord(PlantId),
}

impl StoreError {
    pub fn connection(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Connection(Box::new(err))
    }
}

/// The persisted schedule tuple for one plant. `last_watered` is rewritten
/// with the computed next-watering date on every completed update cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub plant_id: PlantId,
    pub watering_frequency_days: Option<u32>,
    pub last_watered: Option<NaiveDate>,
}

/// Persistent schedule storage, keyed by plant identity. Offers atomic
/// single-record reads and writes; the core does not wrap the
/// read-compute-write sequence in a transaction.
pub trait ScheduleStore {
    /// Watering frequency in whole days, or `None` when the record has no
    /// frequency yet. A missing record is an error.
    fn get_watering_frequency(&self, plant_id: PlantId) -> Result<Option<u32>, StoreError>;

    /// Stored last-watered date as an `MM-DD-YYYY` string, or `None` when
    /// the plant has never been watered.
    fn get_last_watered(&self, plant_id: PlantId) -> Result<Option<String>, StoreError>;

    /// Overwrites the stored date with the computed next-watering date,
    /// already formatted `MM-DD-YYYY`.
    fn update_db(&self, plant_id: PlantId, next_watering_date: &str) -> Result<(), StoreError>;
}
