use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time};

use crate::error::BillingError;

/// Resolve a (year, month) pair into the inclusive UTC window
/// [1st 00:00:00, last-day 23:59:59] of that calendar month.
pub fn month_window(year: i32, month: u8) -> Result<(OffsetDateTime, OffsetDateTime), BillingError> {
    if year <= 0 {
        return Err(BillingError::InvalidCalendarInput(format!(
            "year {year} must be positive"
        )));
    }

    let month = Month::try_from(month).map_err(|_| {
        BillingError::InvalidCalendarInput(format!("month {month} is outside 1..=12"))
    })?;

    let first = Date::from_calendar_date(year, month, 1)
        .map_err(|e| BillingError::InvalidCalendarInput(e.to_string()))?;
    let last = Date::from_calendar_date(year, month, time::util::days_in_year_month(year, month))
        .map_err(|e| BillingError::InvalidCalendarInput(e.to_string()))?;

    let start = first.midnight().assume_utc();
    let end = PrimitiveDateTime::new(last, time::macros::time!(23:59:59)).assume_utc();

    Ok((start, end))
}

/// Half-open one-hour market price slot for an hour-of-day bucket.
///
/// The slot is anchored to day 1 of the billing month: hour buckets
/// collapse dates, so a single representative price per hour-of-day
/// stands in for the whole month regardless of which calendar days fed
/// the bucket.
pub(crate) fn market_hour_slot(
    year: i32,
    month: u8,
    hour: u8,
) -> Result<(OffsetDateTime, OffsetDateTime), BillingError> {
    let month = Month::try_from(month).map_err(|_| {
        BillingError::InvalidCalendarInput(format!("month {month} is outside 1..=12"))
    })?;
    let day_one = Date::from_calendar_date(year, month, 1)
        .map_err(|e| BillingError::InvalidCalendarInput(e.to_string()))?;
    let slot_time = Time::from_hms(hour, 0, 0)
        .map_err(|_| BillingError::InvalidCalendarInput(format!("hour {hour} is outside 0..=23")))?;

    let start = PrimitiveDateTime::new(day_one, slot_time).assume_utc();
    Ok((start, start + Duration::hours(1)))
}

/// Inclusive UTC window covering one calendar date.
pub fn day_window(date: Date) -> (OffsetDateTime, OffsetDateTime) {
    let start = date.midnight().assume_utc();
    let end = PrimitiveDateTime::new(date, time::macros::time!(23:59:59)).assume_utc();
    (start, end)
}
