use std::fmt;
use std::rc::Rc;

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::notifications::WateringEvent;

/// Opaque identifier for one user's plant. Assigned by the persistent
/// store at registration; immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlantId(pub i64);

impl fmt::Display for PlantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("observer is not registered on this plant")]
pub struct ObserverNotRegistered;

/// Subscriber side of the watering protocol. Implementations receive the
/// event for every fan-out on the plant they registered with.
pub trait PlantObserver {
    fn update(&self, event: &WateringEvent) -> Result<()>;
}

/// A houseplant with its watering state and registered observers.
///
/// A fresh instance is constructed for each watering transaction and is
/// owned by its [`PlantWateringUpdater`](crate::updater::PlantWateringUpdater)
/// for the duration of that transaction; it is never shared across
/// threads, which is why observers are `Rc` handles.
pub struct HousePlant {
    id: PlantId,
    needs_water: bool,
    last_watered: Option<NaiveDate>,
    observers: Vec<Rc<dyn PlantObserver>>,
}

impl HousePlant {
    /// Freshly registered plants are assumed thirsty until proven
    /// otherwise.
    pub fn new(id: PlantId) -> Self {
        Self {
            id,
            needs_water: true,
            last_watered: None,
            observers: Vec::new(),
        }
    }

    pub fn id(&self) -> PlantId {
        self.id
    }

    pub fn needs_water(&self) -> bool {
        self.needs_water
    }

    pub fn last_watered(&self) -> Option<NaiveDate> {
        self.last_watered
    }

    pub fn set_last_watered(&mut self, date: NaiveDate) {
        self.last_watered = Some(date);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Appends to the observer list. Duplicate registrations are allowed;
    /// each one receives its own delivery.
    pub fn register_observer(&mut self, observer: Rc<dyn PlantObserver>) {
        debug!(plant_id = %self.id, "registering plant state observer");
        self.observers.push(observer);
    }

    /// Removes the first matching registration, by handle identity.
    /// Fails when the observer was never registered.
    pub fn unregister_observer(
        &mut self,
        observer: &Rc<dyn PlantObserver>,
    ) -> Result<(), ObserverNotRegistered> {
        debug!(plant_id = %self.id, "removing plant state observer");
        let position = self
            .observers
            .iter()
            .position(|registered| Rc::ptr_eq(registered, observer))
            .ok_or(ObserverNotRegistered)?;
        self.observers.remove(position);
        Ok(())
    }

    /// Synchronously delivers the event to every registered observer in
    /// registration order. The first observer error halts delivery to the
    /// remaining observers and propagates.
    pub fn notify_observers(&self, event: &WateringEvent) -> Result<()> {
        debug!(plant_id = %self.id, "notifying plant state observers");
        for observer in &self.observers {
            observer.update(event)?;
        }
        Ok(())
    }

    /// Flips the needs-water flag to its logical negation. This is a
    /// toggle, not an unconditional clear: calling it twice restores the
    /// original value.
    pub fn update_needs_water(&mut self) {
        debug!(plant_id = %self.id, "updating plant status");
        self.needs_water = !self.needs_water;
    }
}
