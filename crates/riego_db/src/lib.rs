//! SQLite-backed persistence for the watering reminder: the schedule
//! store consumed by the core updater, plus the user/plant registry rows
//! the reminder lookups join against.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use riego_core::plant::PlantId;
use riego_core::schedule;
use riego_core::store::{ScheduleRecord, ScheduleStore, StoreError};

/// Connection settings for the schedule database. Passed explicitly to
/// the store constructor; there is no process-wide configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl StoreConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// One row of a user's plant listing.
#[derive(Debug, Clone)]
pub struct PlantRow {
    pub plant_id: PlantId,
    pub plant_nickname: String,
    pub species: String,
    pub watering_frequency: Option<u32>,
    pub date_last_watered: Option<String>,
}

/// Contact details behind a plant id, for composing a reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderContact {
    pub plant_nickname: String,
    pub username: String,
    pub email: String,
}

/// A plant that is due for watering, with everything the reminder needs.
#[derive(Debug, Clone)]
pub struct DueReminder {
    pub schedule: ScheduleRecord,
    pub plant_nickname: String,
    pub username: String,
    pub email: String,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS user_plants (
    plant_id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(user_id),
    plant_nickname TEXT NOT NULL,
    species TEXT NOT NULL,
    watering_frequency INTEGER,
    date_last_watered TEXT
);
";

/// Schedule store and registry backed by a single SQLite database file.
pub struct SqliteScheduleStore {
    conn: Connection,
}

impl SqliteScheduleStore {
    /// Opens (or creates) the database at the configured path and applies
    /// the schema.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let conn = Connection::open(&config.path).map_err(StoreError::connection)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::connection)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA).map_err(StoreError::connection)?;
        Ok(Self { conn })
    }

    pub fn create_user(&self, username: &str, email: &str) -> Result<i64, StoreError> {
        self.conn
            .execute(
                "INSERT INTO users (username, email) VALUES (?1, ?2)",
                params![username, email],
            )
            .map_err(StoreError::connection)?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_user(&self, username: &str) -> Result<Option<i64>, StoreError> {
        self.conn
            .query_row(
                "SELECT user_id FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::connection)
    }

    pub fn register_plant(
        &self,
        user_id: i64,
        plant_nickname: &str,
        species: &str,
        watering_frequency: Option<u32>,
        last_watered: Option<NaiveDate>,
    ) -> Result<PlantId, StoreError> {
        let stored_date = last_watered.map(schedule::format_store_date);
        self.conn
            .execute(
                "INSERT INTO user_plants \
                 (user_id, plant_nickname, species, watering_frequency, date_last_watered) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, plant_nickname, species, watering_frequency, stored_date],
            )
            .map_err(StoreError::connection)?;
        Ok(PlantId(self.conn.last_insert_rowid()))
    }

    pub fn plants_for_user(&self, username: &str) -> Result<Vec<PlantRow>, StoreError> {
        let mut statement = self
            .conn
            .prepare(
                "SELECT up.plant_id, up.plant_nickname, up.species, \
                        up.watering_frequency, up.date_last_watered \
                 FROM user_plants up JOIN users u ON u.user_id = up.user_id \
                 WHERE u.username = ?1 ORDER BY up.plant_id",
            )
            .map_err(StoreError::connection)?;
        let rows = statement
            .query_map(params![username], |row| {
                Ok(PlantRow {
                    plant_id: PlantId(row.get(0)?),
                    plant_nickname: row.get(1)?,
                    species: row.get(2)?,
                    watering_frequency: row.get(3)?,
                    date_last_watered: row.get(4)?,
                })
            })
            .map_err(StoreError::connection)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::connection)
    }

    /// Looks up the nickname, username, and email behind a plant id, as
    /// the reminder channel needs them.
    pub fn reminder_contact(&self, plant_id: PlantId) -> Result<ReminderContact, StoreError> {
        self.conn
            .query_row(
                "SELECT up.plant_nickname, u.username, u.email \
                 FROM user_plants up JOIN users u ON u.user_id = up.user_id \
                 WHERE up.plant_id = ?1",
                params![plant_id.0],
                |row| {
                    Ok(ReminderContact {
                        plant_nickname: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(StoreError::connection)?
            .ok_or(StoreError::MissingRecord(plant_id))
    }

    /// Scans every schedule record and returns the plants due for
    /// watering as of `today`. Rows with an incomplete schedule or an
    /// unparseable stored date are skipped with a warning.
    pub fn due_schedules(&self, today: NaiveDate) -> Result<Vec<DueReminder>, StoreError> {
        let mut statement = self
            .conn
            .prepare(
                "SELECT up.plant_id, up.plant_nickname, up.watering_frequency, \
                        up.date_last_watered, u.username, u.email \
                 FROM user_plants up JOIN users u ON u.user_id = up.user_id \
                 ORDER BY up.plant_id",
            )
            .map_err(StoreError::connection)?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    PlantId(row.get::<_, i64>(0)?),
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<u32>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .map_err(StoreError::connection)?;

        let mut due = Vec::new();
        for row in rows {
            let (plant_id, plant_nickname, frequency, stored_date, username, email) =
                row.map_err(StoreError::connection)?;
            let (Some(frequency), Some(raw)) = (frequency, stored_date) else {
                continue;
            };
            let last_watered = match schedule::parse_store_date(&raw) {
                Ok(date) => date,
                Err(err) => {
                    warn!(%plant_id, %err, "skipping plant with unparseable stored date");
                    continue;
                }
            };
            if schedule::is_due(last_watered, frequency, today) {
                due.push(DueReminder {
                    schedule: ScheduleRecord {
                        plant_id,
                        watering_frequency_days: Some(frequency),
                        last_watered: Some(last_watered),
                    },
                    plant_nickname,
                    username,
                    email,
                });
            }
        }
        Ok(due)
    }
}

impl ScheduleStore for SqliteScheduleStore {
    fn get_watering_frequency(&self, plant_id: PlantId) -> Result<Option<u32>, StoreError> {
        self.conn
            .query_row(
                "SELECT watering_frequency FROM user_plants WHERE plant_id = ?1",
                params![plant_id.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::connection)?
            .ok_or(StoreError::MissingRecord(plant_id))
    }

    fn get_last_watered(&self, plant_id: PlantId) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row(
                "SELECT date_last_watered FROM user_plants WHERE plant_id = ?1",
                params![plant_id.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::connection)?
            .ok_or(StoreError::MissingRecord(plant_id))
    }

    fn update_db(&self, plant_id: PlantId, next_watering_date: &str) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute(
                "UPDATE user_plants SET date_last_watered = ?1 WHERE plant_id = ?2",
                params![next_watering_date, plant_id.0],
            )
            .map_err(StoreError::connection)?;
        if changed == 0 {
            return Err(StoreError::MissingRecord(plant_id));
        }
        Ok(())
    }
}
