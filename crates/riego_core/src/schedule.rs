use chrono::{Days, Local, NaiveDate};

/// Date format used at the persistence boundary, e.g. `"04-01-2023"`.
/// Internal arithmetic works on [`NaiveDate`] values; conversion to and
/// from this string happens only when talking to the store.
pub const STORE_DATE_FORMAT: &str = "%m-%d-%Y";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn format_store_date(date: NaiveDate) -> String {
    date.format(STORE_DATE_FORMAT).to_string()
}

pub fn parse_store_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw, STORE_DATE_FORMAT)
}

/// Next watering date for a plant, or `None` when either the last-watered
/// date or the frequency is not known yet. Callers treat `None` as
/// "schedule cannot be determined", not as an error.
pub fn calculate_next_watering_date(
    last_watered: Option<NaiveDate>,
    frequency_days: Option<u32>,
) -> Option<NaiveDate> {
    let last_watered = last_watered?;
    let frequency = frequency_days?;
    last_watered.checked_add_days(Days::new(u64::from(frequency)))
}

/// Whether a plant is due for watering: at least `frequency_days` whole
/// days have passed since it was last watered.
pub fn is_due(last_watered: NaiveDate, frequency_days: u32, today: NaiveDate) -> bool {
    let elapsed = today.signed_duration_since(last_watered).num_days();
    elapsed >= i64::from(frequency_days)
}

/// How a computed next-watering date relates to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WateringOutcome {
    /// The plant was watered today.
    WateredToday,
    /// Not due yet; the next watering date lies in the future.
    DueLater(NaiveDate),
    /// The computed date is today or already past.
    Overdue(NaiveDate),
}

pub fn classify(
    last_watered: NaiveDate,
    next_watering_date: NaiveDate,
    today: NaiveDate,
) -> WateringOutcome {
    if last_watered == today {
        WateringOutcome::WateredToday
    } else if next_watering_date > today {
        WateringOutcome::DueLater(next_watering_date)
    } else {
        WateringOutcome::Overdue(next_watering_date)
    }
}
