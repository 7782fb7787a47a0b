use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::notifications::{NotificationChannel, NotificationObserver, WateringEvent};
use crate::plant::{HousePlant, PlantId};
use crate::schedule::{self, WateringOutcome};
use crate::store::ScheduleStore;

/// Runs one watering transaction for a single plant: pulls the schedule
/// from the store, computes the next watering date, persists it, fans the
/// event out to the plant's observers, and toggles the plant's state.
///
/// Each updater owns its [`HousePlant`] exclusively for the duration of
/// the transaction; no instance outlives a single `update_plant` call in
/// normal use.
pub struct PlantWateringUpdater<'a> {
    plant: HousePlant,
    store: &'a dyn ScheduleStore,
    channel: Rc<dyn NotificationChannel>,
    watering_frequency: Option<u32>,
    next_watering_date: Option<NaiveDate>,
    last_watered: Option<NaiveDate>,
}

impl<'a> PlantWateringUpdater<'a> {
    /// `last_watered` may be supplied when the caller already knows the
    /// watering happened today, bypassing the store read.
    pub fn new(
        plant_id: PlantId,
        last_watered: Option<NaiveDate>,
        store: &'a dyn ScheduleStore,
        channel: Rc<dyn NotificationChannel>,
    ) -> Self {
        Self {
            plant: HousePlant::new(plant_id),
            store,
            channel,
            watering_frequency: None,
            next_watering_date: None,
            last_watered,
        }
    }

    pub fn plant(&self) -> &HousePlant {
        &self.plant
    }

    /// Computes the next date the plant needs to be watered, caching the
    /// frequency and the result on the updater. Returns `Ok(None)` when
    /// the frequency or the last-watered date is not set; store failures
    /// propagate.
    pub fn calculate_next_watering_date(&mut self) -> Result<Option<NaiveDate>> {
        let plant_id = self.plant.id();

        self.watering_frequency = self.store.get_watering_frequency(plant_id)?;
        let Some(frequency) = self.watering_frequency else {
            info!(%plant_id, "watering frequency is not set");
            return Ok(None);
        };

        if self.last_watered.is_none() {
            if let Some(raw) = self.store.get_last_watered(plant_id)? {
                let today = schedule::today();
                let date = if raw == schedule::format_store_date(today) {
                    today
                } else {
                    schedule::parse_store_date(&raw).with_context(|| {
                        format!("stored last-watered date {raw:?} is not MM-DD-YYYY")
                    })?
                };
                self.last_watered = Some(date);
            }
        }
        let Some(last_watered) = self.last_watered else {
            info!(%plant_id, "last watering date is not set");
            return Ok(None);
        };

        self.plant.set_last_watered(last_watered);
        self.next_watering_date =
            schedule::calculate_next_watering_date(Some(last_watered), Some(frequency));
        Ok(self.next_watering_date)
    }

    /// Updates the plant's watering schedule: classifies the outcome
    /// against today, persists the computed date, notifies observers, and
    /// toggles the needs-water flag. Side-effecting; yields no usable
    /// value. When the schedule is incomplete, persistence and
    /// notification are skipped entirely.
    pub fn update_plant(&mut self) -> Result<()> {
        self.calculate_next_watering_date()?;
        let plant_id = self.plant.id();

        let (Some(next_watering_date), Some(last_watered)) =
            (self.next_watering_date, self.last_watered)
        else {
            info!(%plant_id, "schedule incomplete; skipping persistence and notification");
            return Ok(());
        };

        let today = schedule::today();
        match schedule::classify(last_watered, next_watering_date, today) {
            WateringOutcome::WateredToday => {
                info!(%plant_id, "watering your plant... your plant was watered today");
            }
            WateringOutcome::DueLater(date) => {
                info!(%plant_id, "the next watering date for your plant is {date}");
            }
            WateringOutcome::Overdue(date) => {
                // The overdue message reuses the computed date for both
                // halves rather than recomputing from today.
                info!(
                    %plant_id,
                    "the watering date for your plant was {date}; watering your plant... \
                     the next watering date is {date}"
                );
            }
        }

        let formatted = schedule::format_store_date(next_watering_date);
        self.store.update_db(plant_id, &formatted)?;

        NotificationObserver::register(&mut self.plant, Rc::clone(&self.channel), formatted.clone());
        self.plant.notify_observers(&WateringEvent {
            plant_id,
            next_watering_date: formatted,
        })?;

        self.plant.update_needs_water();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use chrono::Days;

    use super::*;
    use crate::store::StoreError;

    #[derive(Default)]
    struct MemoryStore {
        frequencies: HashMap<i64, u32>,
        last_watered: HashMap<i64, String>,
        writes: RefCell<Vec<(PlantId, String)>>,
        fail_writes: bool,
    }

    impl ScheduleStore for MemoryStore {
        fn get_watering_frequency(&self, plant_id: PlantId) -> Result<Option<u32>, StoreError> {
            Ok(self.frequencies.get(&plant_id.0).copied())
        }

        fn get_last_watered(&self, plant_id: PlantId) -> Result<Option<String>, StoreError> {
            Ok(self.last_watered.get(&plant_id.0).cloned())
        }

        fn update_db(&self, plant_id: PlantId, next: &str) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::connection(std::io::Error::other("disk full")));
            }
            self.writes.borrow_mut().push((plant_id, next.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingChannel {
        deliveries: RefCell<Vec<(PlantId, String)>>,
    }

    impl NotificationChannel for RecordingChannel {
        fn initiate_email(&self, plant_id: PlantId, next_watering_date: &str) {
            self.deliveries
                .borrow_mut()
                .push((plant_id, next_watering_date.to_string()));
        }
    }

    fn days_from_today(offset: i64) -> chrono::NaiveDate {
        let today = schedule::today();
        if offset >= 0 {
            today.checked_add_days(Days::new(offset as u64)).unwrap()
        } else {
            today.checked_sub_days(Days::new((-offset) as u64)).unwrap()
        }
    }

    #[test]
    fn watered_today_persists_the_computed_date() {
        let mut store = MemoryStore::default();
        store.frequencies.insert(7, 7);
        let channel = Rc::new(RecordingChannel::default());

        let mut updater = PlantWateringUpdater::new(
            PlantId(7),
            Some(schedule::today()),
            &store,
            Rc::clone(&channel) as Rc<dyn NotificationChannel>,
        );
        updater.update_plant().unwrap();

        let expected = schedule::format_store_date(days_from_today(7));
        assert_eq!(*store.writes.borrow(), vec![(PlantId(7), expected.clone())]);
        assert_eq!(
            *channel.deliveries.borrow(),
            vec![(PlantId(7), expected)]
        );
    }

    #[test]
    fn zero_frequency_persists_todays_date() {
        let mut store = MemoryStore::default();
        store.frequencies.insert(4, 0);
        let channel = Rc::new(RecordingChannel::default());

        let mut updater = PlantWateringUpdater::new(
            PlantId(4),
            Some(schedule::today()),
            &store,
            channel,
        );
        updater.update_plant().unwrap();

        let today = schedule::format_store_date(schedule::today());
        assert_eq!(*store.writes.borrow(), vec![(PlantId(4), today)]);
    }

    #[test]
    fn stored_string_matching_today_is_used_directly() {
        let mut store = MemoryStore::default();
        store.frequencies.insert(2, 7);
        store
            .last_watered
            .insert(2, schedule::format_store_date(schedule::today()));
        let channel = Rc::new(RecordingChannel::default());

        let mut updater =
            PlantWateringUpdater::new(PlantId(2), None, &store, channel);
        let next = updater.calculate_next_watering_date().unwrap();
        assert_eq!(next, Some(days_from_today(7)));
        assert_eq!(updater.plant().last_watered(), Some(schedule::today()));
    }

    #[test]
    fn future_date_toggles_needs_water_once() {
        let mut store = MemoryStore::default();
        store.frequencies.insert(5, 7);
        store
            .last_watered
            .insert(5, schedule::format_store_date(days_from_today(-1)));
        let channel = Rc::new(RecordingChannel::default());

        let mut updater = PlantWateringUpdater::new(
            PlantId(5),
            None,
            &store,
            Rc::clone(&channel) as Rc<dyn NotificationChannel>,
        );
        assert!(updater.plant().needs_water());
        updater.update_plant().unwrap();

        assert!(!updater.plant().needs_water());
        assert_eq!(channel.deliveries.borrow().len(), 1);
        let expected = schedule::format_store_date(days_from_today(6));
        assert_eq!(*store.writes.borrow(), vec![(PlantId(5), expected)]);
    }

    #[test]
    fn overdue_plant_still_persists_the_stale_date() {
        let mut store = MemoryStore::default();
        store.frequencies.insert(9, 7);
        store
            .last_watered
            .insert(9, schedule::format_store_date(days_from_today(-10)));
        let channel = Rc::new(RecordingChannel::default());

        let mut updater = PlantWateringUpdater::new(
            PlantId(9),
            None,
            &store,
            Rc::clone(&channel) as Rc<dyn NotificationChannel>,
        );
        updater.update_plant().unwrap();

        // Three days overdue: the stale computed date is written back.
        let expected = schedule::format_store_date(days_from_today(-3));
        assert_eq!(*store.writes.borrow(), vec![(PlantId(9), expected.clone())]);
        assert_eq!(*channel.deliveries.borrow(), vec![(PlantId(9), expected)]);
    }

    #[test]
    fn missing_frequency_skips_persistence_and_notification() {
        let store = MemoryStore::default();
        let channel = Rc::new(RecordingChannel::default());

        let mut updater = PlantWateringUpdater::new(
            PlantId(1),
            Some(schedule::today()),
            &store,
            Rc::clone(&channel) as Rc<dyn NotificationChannel>,
        );
        updater.update_plant().unwrap();

        assert!(store.writes.borrow().is_empty());
        assert!(channel.deliveries.borrow().is_empty());
        assert!(updater.plant().needs_water());
        assert_eq!(updater.plant().observer_count(), 0);
    }

    #[test]
    fn missing_last_watered_skips_persistence_and_notification() {
        let mut store = MemoryStore::default();
        store.frequencies.insert(1, 7);
        let channel = Rc::new(RecordingChannel::default());

        let mut updater = PlantWateringUpdater::new(
            PlantId(1),
            None,
            &store,
            Rc::clone(&channel) as Rc<dyn NotificationChannel>,
        );
        updater.update_plant().unwrap();

        assert!(store.writes.borrow().is_empty());
        assert!(channel.deliveries.borrow().is_empty());
    }

    #[test]
    fn store_write_failure_propagates() {
        let mut store = MemoryStore::default();
        store.frequencies.insert(1, 7);
        store.fail_writes = true;
        let channel = Rc::new(RecordingChannel::default());

        let mut updater = PlantWateringUpdater::new(
            PlantId(1),
            Some(schedule::today()),
            &store,
            Rc::clone(&channel) as Rc<dyn NotificationChannel>,
        );
        assert!(updater.update_plant().is_err());
        assert!(channel.deliveries.borrow().is_empty());
    }

    #[test]
    fn malformed_stored_date_is_an_error() {
        let mut store = MemoryStore::default();
        store.frequencies.insert(1, 7);
        store.last_watered.insert(1, "2023-04-01".to_string());
        let channel = Rc::new(RecordingChannel::default());

        let mut updater =
            PlantWateringUpdater::new(PlantId(1), None, &store, channel);
        assert!(updater.calculate_next_watering_date().is_err());
    }
}
