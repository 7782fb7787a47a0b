use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use riego_core::notifications::NotificationChannel;
use riego_core::plant::PlantId;
use riego_core::schedule;
use riego_core::PlantWateringUpdater;
use riego_db::{SqliteScheduleStore, StoreConfig};

use crate::cli::{Cli, Commands, RegisterArgs};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("riego.db"),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("RIEGO_DB") {
            config.db_path = PathBuf::from(path);
        }
        Ok(config)
    }
}

/// Console delivery for watering reminders. Failures are logged and
/// absorbed here; a broken contact row never aborts a watering update.
struct ConsoleChannel {
    store: Rc<SqliteScheduleStore>,
}

impl NotificationChannel for ConsoleChannel {
    fn initiate_email(&self, plant_id: PlantId, next_watering_date: &str) {
        match self.store.reminder_contact(plant_id) {
            Ok(contact) => println!(
                "{}",
                compose_reminder(&contact.username, &contact.plant_nickname, next_watering_date)
            ),
            Err(err) => warn!(%plant_id, %err, "could not look up the reminder contact"),
        }
    }
}

fn compose_reminder(username: &str, plant_nickname: &str, next_watering_date: &str) -> String {
    format!(
        "Hello {username}, the next time you need to water your plant friend \
         {plant_nickname} is {next_watering_date}."
    )
}

pub fn run(config: AppConfig, cli: Cli) -> Result<()> {
    let store = Rc::new(
        SqliteScheduleStore::open(&StoreConfig::new(&config.db_path))
            .context("failed to open the schedule database")?,
    );

    match cli.command {
        Commands::Signup { username, email } => {
            let user_id = store.create_user(&username, &email)?;
            println!("Welcome {username}! (user #{user_id})");
        }
        Commands::Register(args) => register(&store, args)?,
        Commands::View { username } => view(&store, &username)?,
        Commands::Water { id } => update(store, PlantId(id), Some(schedule::today()))?,
        Commands::Check { id } => update(store, PlantId(id), None)?,
        Commands::Due => due(store)?,
    }
    Ok(())
}

fn register(store: &SqliteScheduleStore, args: RegisterArgs) -> Result<()> {
    let user_id = store
        .find_user(&args.username)?
        .ok_or_else(|| anyhow!("no user named {:?}; run `riego signup` first", args.username))?;
    let last_watered: Option<NaiveDate> = args
        .last_watered
        .as_deref()
        .map(|raw| {
            schedule::parse_store_date(raw)
                .with_context(|| format!("last-watered date {raw:?} is not MM-DD-YYYY"))
        })
        .transpose()?;

    let plant_id =
        store.register_plant(user_id, &args.name, &args.species, args.frequency, last_watered)?;
    println!("Registered {} (plant #{plant_id})", args.name);
    Ok(())
}

fn view(store: &SqliteScheduleStore, username: &str) -> Result<()> {
    let plants = store.plants_for_user(username)?;
    if plants.is_empty() {
        println!("No plants registered for {username}.");
        return Ok(());
    }
    for plant in plants {
        println!(
            "#{} {} ({})",
            plant.plant_id, plant.plant_nickname, plant.species
        );
        match (plant.watering_frequency, plant.date_last_watered) {
            (Some(frequency), Some(last)) => {
                println!("    every {frequency} days, last watered {last}");
            }
            (Some(frequency), None) => {
                println!("    every {frequency} days, never watered");
            }
            _ => println!("    schedule incomplete"),
        }
    }
    Ok(())
}

fn update(
    store: Rc<SqliteScheduleStore>,
    plant_id: PlantId,
    last_watered: Option<NaiveDate>,
) -> Result<()> {
    let channel: Rc<dyn NotificationChannel> = Rc::new(ConsoleChannel {
        store: Rc::clone(&store),
    });
    let mut updater = PlantWateringUpdater::new(plant_id, last_watered, store.as_ref(), channel);
    updater.update_plant()
}

fn due(store: Rc<SqliteScheduleStore>) -> Result<()> {
    let today = schedule::today();
    let reminders = store.due_schedules(today)?;
    if reminders.is_empty() {
        println!("No plants are due for watering today.");
        return Ok(());
    }

    info!(count = reminders.len(), "sending due-watering reminders");
    let channel = ConsoleChannel {
        store: Rc::clone(&store),
    };
    for reminder in &reminders {
        let next = schedule::calculate_next_watering_date(
            reminder.schedule.last_watered,
            reminder.schedule.watering_frequency_days,
        );
        if let Some(next) = next {
            channel.initiate_email(reminder.schedule.plant_id, &schedule::format_store_date(next));
        }
    }
    Ok(())
}
