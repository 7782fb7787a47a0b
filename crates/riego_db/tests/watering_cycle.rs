use std::cell::RefCell;
use std::rc::Rc;

use riego_core::notifications::NotificationChannel;
use riego_core::plant::PlantId;
use riego_core::schedule;
use riego_core::store::ScheduleStore;
use riego_core::PlantWateringUpdater;
use riego_db::{SqliteScheduleStore, StoreConfig};
use tempfile::tempdir;

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

#[test]
fn update_cycle_against_a_real_database() {
    let temp = tempdir().expect("tempdir");
    let config = StoreConfig::new(temp.path().join("riego.db"));
    let store = SqliteScheduleStore::open(&config).expect("open store");

    let user_id = store
        .create_user("ines", "ines@example.com")
        .expect("create user");
    let today = schedule::today();
    let yesterday = today.pred_opt().expect("yesterday exists");
    let plant_id = store
        .register_plant(user_id, "Monstera", "Monstera deliciosa", Some(7), Some(yesterday))
        .expect("register plant");

    let channel = Rc::new(RecordingChannel::default());
    let mut updater = PlantWateringUpdater::new(
        plant_id,
        None,
        &store,
        Rc::clone(&channel) as Rc<dyn NotificationChannel>,
    );
    updater.update_plant().expect("update plant");

    let expected_next = schedule::calculate_next_watering_date(Some(yesterday), Some(7))
        .expect("next date computable");
    let expected = schedule::format_store_date(expected_next);

    assert_eq!(
        store.get_last_watered(plant_id).expect("read back"),
        Some(expected.clone())
    );
    assert_eq!(*channel.deliveries.borrow(), vec![(plant_id, expected)]);
    assert!(!updater.plant().needs_water());

    // The persisted date becomes the last-watered value of the next
    // cycle: one full frequency later the plant shows up as due again.
    let next_cycle = expected_next
        .checked_add_days(chrono::Days::new(7))
        .expect("date in range");
    let due = store.due_schedules(next_cycle).expect("due digest");
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].schedule.plant_id, plant_id);
}
