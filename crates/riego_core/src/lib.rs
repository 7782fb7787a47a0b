//! Watering-schedule state engine: computes next-watering dates, tracks a
//! plant's needs-water state, and fans watering events out to registered
//! observers. Persistence and reminder delivery are collaborators behind
//! the [`store::ScheduleStore`] and [`notifications::NotificationChannel`]
//! traits.

pub mod notifications;
pub mod plant;
pub mod schedule;
pub mod store;
pub mod updater;

pub use crate::plant::{HousePlant, PlantId, PlantObserver};
pub use crate::store::{ScheduleStore, StoreError};
pub use crate::updater::PlantWateringUpdater;
