use chrono::{Datelike, NaiveDate};

use crate::models::{CalendarDay, ClockTime, OpeningHours};

/// A day can be booked when it is not in the past and the salon opens that weekday.
pub fn is_day_available(date: NaiveDate, today: NaiveDate, hours: &OpeningHours) -> bool {
    date >= today && hours.is_open_on(date)
}

/// Month grid for a Sunday-first calendar: `None` entries pad the first week
/// up to the weekday of the 1st, then one entry per day of the month.
pub fn month_grid(
    year: i32,
    month: u32,
    today: NaiveDate,
    hours: &OpeningHours,
) -> anyhow::Result<Vec<Option<CalendarDay>>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow::anyhow!("invalid month: {year}-{month}"))?;
    let days_in_month = days_in_month(year, month)?;
    let offset = first.weekday().num_days_from_sunday() as usize;

    let mut grid: Vec<Option<CalendarDay>> = vec![None; offset];
    for date in first.iter_days().take(days_in_month as usize) {
        grid.push(Some(CalendarDay {
            day: date.day(),
            date,
            available: is_day_available(date, today, hours),
        }));
    }
    Ok(grid)
}

fn days_in_month(year: i32, month: u32) -> anyhow::Result<u32> {
    let (next_year, next_month) = shift_month(year, month, 1);
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| anyhow::anyhow!("invalid month: {year}-{month}"))?;
    next_first
        .pred_opt()
        .map(|last| last.day())
        .ok_or_else(|| anyhow::anyhow!("invalid month: {year}-{month}"))
}

/// Moves `delta` months forward (or back) from `year`-`month`.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Start times offered on an open day.
///
/// Slots step by `slot_minutes` from opening time. A start is offered only if a
/// full slot still fits strictly before closing, so with the default 10:00-19:00
/// window the last start is 18:00. The service duration is not considered here:
/// whether a long treatment fits is decided by the persistence service.
pub fn time_slots(hours: &OpeningHours) -> Vec<ClockTime> {
    let mut slots = vec![];
    if hours.slot_minutes == 0 {
        return slots;
    }
    let mut current = Some(hours.opens_at);
    while let Some(start) = current {
        match start.checked_add_minutes(hours.slot_minutes) {
            Some(next) if next < hours.closes_at => {
                slots.push(start);
                current = Some(next);
            }
            _ => break,
        }
    }
    slots
}

pub fn calculate_end_time(start: ClockTime, duration_minutes: u32) -> anyhow::Result<ClockTime> {
    start
        .checked_add_minutes(duration_minutes)
        .ok_or_else(|| anyhow::anyhow!("booking starting at {start} for {duration_minutes} min ends after midnight"))
}
