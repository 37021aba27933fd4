use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{ClockTime, OpeningHours};
use crate::services::calendar::time_slots;

#[derive(Debug, PartialEq)]
pub enum SchedulingError {
    OutsideOpeningHours { hours: String },
    OutsideWorkingHours,
    Conflict,
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingError::OutsideOpeningHours { hours } => {
                write!(f, "outside opening hours ({hours})")
            }
            SchedulingError::OutsideWorkingHours => {
                write!(f, "professional is not working at this time")
            }
            SchedulingError::Conflict => write!(f, "slot unavailable"),
        }
    }
}

/// Half-open interval overlap: back-to-back bookings do not collide.
pub fn overlaps(a_start: ClockTime, a_end: ClockTime, b_start: ClockTime, b_end: ClockTime) -> bool {
    a_start < b_end && a_end > b_start
}

fn has_conflict(
    conn: &Connection,
    professional_id: i64,
    date: NaiveDate,
    start: ClockTime,
    end: ClockTime,
) -> anyhow::Result<bool> {
    let bookings = queries::bookings_for_professional_on(conn, professional_id, date)?;
    Ok(bookings
        .iter()
        .any(|b| overlaps(b.start_time, b.end_time, start, end)))
}

/// Checks a proposed booking against opening hours, the professional's own
/// schedule for that weekday and their other live bookings that day.
pub fn validate_booking_time(
    conn: &Connection,
    hours: &OpeningHours,
    professional_id: i64,
    date: NaiveDate,
    start: ClockTime,
    end: ClockTime,
) -> anyhow::Result<Result<(), SchedulingError>> {
    if !hours.is_open_on(date) || !hours.contains(start, end) {
        return Ok(Err(SchedulingError::OutsideOpeningHours {
            hours: hours.to_human_readable(),
        }));
    }

    let schedule = queries::working_hours_on(conn, professional_id, date)?;
    if schedule.is_some_and(|day| !day.covers(start, end)) {
        return Ok(Err(SchedulingError::OutsideWorkingHours));
    }

    if has_conflict(conn, professional_id, date, start, end)? {
        return Ok(Err(SchedulingError::Conflict));
    }

    Ok(Ok(()))
}

/// Slot starts on `date` where a booking of `duration_minutes` fits before
/// closing without touching the professional's other bookings.
pub fn free_slots(
    conn: &Connection,
    hours: &OpeningHours,
    professional_id: i64,
    date: NaiveDate,
    duration_minutes: u32,
) -> anyhow::Result<Vec<ClockTime>> {
    if !hours.is_open_on(date) || duration_minutes == 0 {
        return Ok(vec![]);
    }

    let schedule = queries::working_hours_on(conn, professional_id, date)?;
    let bookings = queries::bookings_for_professional_on(conn, professional_id, date)?;

    Ok(time_slots(hours)
        .into_iter()
        .filter(|start| match start.checked_add_minutes(duration_minutes) {
            Some(end) => {
                hours.contains(*start, end)
                    && schedule.as_ref().map_or(true, |day| day.covers(*start, end))
                    && !bookings
                        .iter()
                        .any(|b| overlaps(b.start_time, b.end_time, *start, end))
            }
            None => false,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{BookingRequest, BookingStatus, Price, ProfessionalInput, ServiceInput};

    fn setup_db() -> (Connection, i64, i64) {
        let conn = db::init_db(":memory:").unwrap();
        let sid = queries::insert_service(
            &conn,
            &ServiceInput {
                name: "Cut".to_string(),
                description: String::new(),
                duration_minutes: 60,
                price: Price::Amount(20.0),
                category: "hair".to_string(),
            },
        )
        .unwrap();
        let pid = queries::insert_professional(
            &conn,
            &ProfessionalInput {
                name: "Ana".to_string(),
                specialty: String::new(),
                bio: String::new(),
            },
        )
        .unwrap();
        (conn, pid, sid)
    }

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn book(conn: &Connection, pid: i64, sid: i64, day: &str, start: &str, end: &str) -> i64 {
        let client =
            queries::find_or_create_client(conn, "Alice", "alice@example.pt", "935279765", None).unwrap();
        let now = chrono::Utc::now().naive_utc();
        queries::insert_booking(
            conn,
            client,
            &BookingRequest {
                professional_id: pid,
                service_id: sid,
                date: date(day),
                start_time: t(start),
                end_time: t(end),
                client_name: "Alice".to_string(),
                client_phone: "935279765".to_string(),
                client_email: "alice@example.pt".to_string(),
                notes: None,
            },
            &now,
        )
        .unwrap()
    }

    #[test]
    fn test_overlaps() {
        assert!(overlaps(t("10:00"), t("11:00"), t("10:30"), t("11:30")));
        assert!(overlaps(t("10:00"), t("11:00"), t("09:00"), t("12:00")));
        assert!(!overlaps(t("10:00"), t("11:00"), t("11:00"), t("12:00")));
        assert!(!overlaps(t("10:00"), t("11:00"), t("09:00"), t("10:00")));
    }

    #[test]
    fn test_valid_time_no_bookings() {
        let (conn, pid, _) = setup_db();
        let hours = OpeningHours::default();
        // 2025-06-10 is a Tuesday
        let result =
            validate_booking_time(&conn, &hours, pid, date("2025-06-10"), t("14:00"), t("15:00")).unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn test_closed_day() {
        let (conn, pid, _) = setup_db();
        let hours = OpeningHours::default();
        // 2025-06-16 is a Monday
        let result =
            validate_booking_time(&conn, &hours, pid, date("2025-06-16"), t("14:00"), t("15:00")).unwrap();
        assert!(matches!(result, Err(SchedulingError::OutsideOpeningHours { .. })));
    }

    #[test]
    fn test_end_time_exceeds_closing() {
        let (conn, pid, _) = setup_db();
        let hours = OpeningHours::default();
        // 18:40 + 50min = 19:30, past the 19:00 close
        let result =
            validate_booking_time(&conn, &hours, pid, date("2025-06-10"), t("18:40"), t("19:30")).unwrap();
        assert!(matches!(result, Err(SchedulingError::OutsideOpeningHours { .. })));
    }

    #[test]
    fn test_conflict_with_existing_booking() {
        let (conn, pid, sid) = setup_db();
        book(&conn, pid, sid, "2025-06-10", "10:00", "11:00");
        let hours = OpeningHours::default();

        // Proposing 10:30 overlaps with 10:00-11:00
        let result =
            validate_booking_time(&conn, &hours, pid, date("2025-06-10"), t("10:30"), t("11:30")).unwrap();
        assert_eq!(result, Err(SchedulingError::Conflict));
        assert_eq!(SchedulingError::Conflict.to_string(), "slot unavailable");
    }

    #[test]
    fn test_no_conflict_adjacent_booking() {
        let (conn, pid, sid) = setup_db();
        book(&conn, pid, sid, "2025-06-10", "10:00", "11:00");
        let hours = OpeningHours::default();

        // 11:00 starts exactly when previous ends
        let result =
            validate_booking_time(&conn, &hours, pid, date("2025-06-10"), t("11:00"), t("12:00")).unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn test_cancelled_booking_frees_the_slot() {
        let (conn, pid, sid) = setup_db();
        let id = book(&conn, pid, sid, "2025-06-10", "10:00", "11:00");
        let now = chrono::Utc::now().naive_utc();
        queries::update_booking_status(&conn, id, BookingStatus::Cancelled, Some("moved"), &now).unwrap();
        let hours = OpeningHours::default();

        let result =
            validate_booking_time(&conn, &hours, pid, date("2025-06-10"), t("10:00"), t("11:00")).unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn test_other_professional_does_not_conflict() {
        let (conn, pid, sid) = setup_db();
        book(&conn, pid, sid, "2025-06-10", "10:00", "11:00");
        let other = queries::insert_professional(
            &conn,
            &ProfessionalInput {
                name: "Rita".to_string(),
                specialty: String::new(),
                bio: String::new(),
            },
        )
        .unwrap();
        let hours = OpeningHours::default();

        let result =
            validate_booking_time(&conn, &hours, other, date("2025-06-10"), t("10:00"), t("11:00")).unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn test_free_slots() {
        let (conn, pid, sid) = setup_db();
        book(&conn, pid, sid, "2025-06-10", "10:00", "11:00");
        let hours = OpeningHours::default();

        let slots = free_slots(&conn, &hours, pid, date("2025-06-10"), 60).unwrap();
        assert!(!slots.contains(&t("10:00")));
        assert!(!slots.contains(&t("10:30")));
        assert!(slots.contains(&t("11:00")));
        // a 60 minute service starting at 18:00 ends exactly at closing
        assert_eq!(slots.last().copied(), Some(t("18:00")));

        let long = free_slots(&conn, &hours, pid, date("2025-06-10"), 90).unwrap();
        assert_eq!(long.last().copied(), Some(t("17:30")));

        assert!(free_slots(&conn, &hours, pid, date("2025-06-16"), 60).unwrap().is_empty());
    }

    #[test]
    fn test_professional_schedule_narrows_the_day() {
        let (conn, pid, _) = setup_db();
        let hours = OpeningHours::default();
        queries::seed_working_hours(&conn, pid, &hours).unwrap();
        let mut tuesday = queries::working_hours_on(&conn, pid, date("2025-06-10"))
            .unwrap()
            .unwrap();
        tuesday.end_time = t("13:00");
        queries::save_working_hours(&conn, &tuesday).unwrap();

        let result =
            validate_booking_time(&conn, &hours, pid, date("2025-06-10"), t("14:00"), t("15:00")).unwrap();
        assert_eq!(result, Err(SchedulingError::OutsideWorkingHours));
        let result =
            validate_booking_time(&conn, &hours, pid, date("2025-06-10"), t("12:00"), t("13:00")).unwrap();
        assert!(result.is_ok());

        let slots = free_slots(&conn, &hours, pid, date("2025-06-10"), 60).unwrap();
        assert_eq!(slots.last().copied(), Some(t("12:00")));

        // 2025-06-11 is a Wednesday, taken off
        let mut wednesday = queries::working_hours_on(&conn, pid, date("2025-06-11"))
            .unwrap()
            .unwrap();
        wednesday.is_available = false;
        queries::save_working_hours(&conn, &wednesday).unwrap();
        assert!(free_slots(&conn, &hours, pid, date("2025-06-11"), 60).unwrap().is_empty());
    }
}
