use std::rc::Rc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::plant::{HousePlant, PlantId, PlantObserver};

/// Payload fanned out to every observer registered on a plant. The date
/// is already formatted for the persistence boundary (`MM-DD-YYYY`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WateringEvent {
    pub plant_id: PlantId,
    pub next_watering_date: String,
}

/// Delivery side of the reminder boundary. Implementations look up the
/// user behind the plant id and deliver a formatted reminder. They absorb
/// and log their own failures instead of re-raising them; delivery
/// problems never abort a watering update.
pub trait NotificationChannel {
    fn initiate_email(&self, plant_id: PlantId, next_watering_date: &str);
}

/// Observer that forwards watering events to the notification channel.
pub struct NotificationObserver {
    channel: Rc<dyn NotificationChannel>,
    next_watering_date: String,
}

impl NotificationObserver {
    /// Builds the observer and registers it on the plant in one step.
    /// The `next_watering_date` captured here is informational only; the
    /// delivered date always comes from the live event payload.
    pub fn register(
        plant: &mut HousePlant,
        channel: Rc<dyn NotificationChannel>,
        next_watering_date: String,
    ) -> Rc<Self> {
        let observer = Rc::new(Self {
            channel,
            next_watering_date,
        });
        plant.register_observer(observer.clone());
        observer
    }

    pub fn next_watering_date(&self) -> &str {
        &self.next_watering_date
    }
}

impl PlantObserver for NotificationObserver {
    fn update(&self, event: &WateringEvent) -> Result<()> {
        self.channel
            .initiate_email(event.plant_id, &event.next_watering_date);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

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
    fn registers_itself_on_construction() {
        let mut plant = HousePlant::new(PlantId(3));
        let channel = Rc::new(RecordingChannel::default());
        NotificationObserver::register(&mut plant, channel, "02-05-2023".to_string());
        assert_eq!(plant.observer_count(), 1);
    }

    #[test]
    fn forwards_the_event_payload_not_the_stored_date() {
        let mut plant = HousePlant::new(PlantId(3));
        let channel = Rc::new(RecordingChannel::default());
        let observer = NotificationObserver::register(
            &mut plant,
            Rc::clone(&channel) as Rc<dyn NotificationChannel>,
            "01-01-2000".to_string(),
        );
        assert_eq!(observer.next_watering_date(), "01-01-2000");

        plant
            .notify_observers(&WateringEvent {
                plant_id: PlantId(3),
                next_watering_date: "02-05-2023".to_string(),
            })
            .unwrap();

        assert_eq!(
            *channel.deliveries.borrow(),
            vec![(PlantId(3), "02-05-2023".to_string())]
        );
    }
}
