use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    Booking, BookingFilter, BookingRequest, BookingStatus, ClockTime, DashboardStats,
    OpeningHours, Price, Professional, ProfessionalInput, Service, ServiceInput, User,
    WorkingHours,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// ── Services ──

const SERVICE_COLUMNS: &str =
    "id, name, description, duration_minutes, price, category, is_active";

fn parse_service_row(row: &Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        duration_minutes: row.get(3)?,
        price: Price::from_column(row.get(4)?),
        category: row.get(5)?,
        is_active: row.get(6)?,
    })
}

pub fn list_services(conn: &Connection, active_only: bool) -> anyhow::Result<Vec<Service>> {
    let sql = format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE (?1 = 0 OR is_active = 1) ORDER BY category ASC, name ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![active_only], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

pub fn get_service(conn: &Connection, id: i64) -> anyhow::Result<Option<Service>> {
    let sql = format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1");
    let service = conn
        .query_row(&sql, params![id], parse_service_row)
        .optional()?;
    Ok(service)
}

pub fn insert_service(conn: &Connection, input: &ServiceInput) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO services (name, description, duration_minutes, price, category)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            input.name.trim(),
            input.description,
            input.duration_minutes,
            input.price.as_column(),
            input.category,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn save_service(conn: &Connection, service: &Service) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, description = ?2, duration_minutes = ?3, price = ?4,
                category = ?5, is_active = ?6
         WHERE id = ?7",
        params![
            service.name,
            service.description,
            service.duration_minutes,
            service.price.as_column(),
            service.category,
            service.is_active,
            service.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn set_service_active(conn: &Connection, id: i64, active: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET is_active = ?1 WHERE id = ?2",
        params![active, id],
    )?;
    Ok(count > 0)
}

// ── Professionals ──

fn service_ids_for(conn: &Connection, professional_id: i64) -> anyhow::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT service_id FROM professional_services WHERE professional_id = ?1 ORDER BY service_id",
    )?;
    let rows = stmt.query_map(params![professional_id], |row| row.get(0))?;

    let mut ids = vec![];
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

fn parse_professional_row(row: &Row) -> rusqlite::Result<Professional> {
    Ok(Professional {
        id: row.get(0)?,
        name: row.get(1)?,
        specialty: row.get(2)?,
        bio: row.get(3)?,
        service_ids: vec![],
        is_active: row.get(4)?,
    })
}

pub fn list_professionals(
    conn: &Connection,
    active_only: bool,
) -> anyhow::Result<Vec<Professional>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, specialty, bio, is_active FROM professionals
         WHERE (?1 = 0 OR is_active = 1) ORDER BY name ASC",
    )?;
    let rows = stmt.query_map(params![active_only], parse_professional_row)?;

    let mut professionals = vec![];
    for row in rows {
        let mut professional = row?;
        professional.service_ids = service_ids_for(conn, professional.id)?;
        professionals.push(professional);
    }
    Ok(professionals)
}

pub fn get_professional(conn: &Connection, id: i64) -> anyhow::Result<Option<Professional>> {
    let professional = conn
        .query_row(
            "SELECT id, name, specialty, bio, is_active FROM professionals WHERE id = ?1",
            params![id],
            parse_professional_row,
        )
        .optional()?;

    match professional {
        Some(mut p) => {
            p.service_ids = service_ids_for(conn, p.id)?;
            Ok(Some(p))
        }
        None => Ok(None),
    }
}

pub fn insert_professional(conn: &Connection, input: &ProfessionalInput) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO professionals (name, specialty, bio) VALUES (?1, ?2, ?3)",
        params![input.name.trim(), input.specialty, input.bio],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn save_professional(conn: &Connection, professional: &Professional) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE professionals SET name = ?1, specialty = ?2, bio = ?3, is_active = ?4 WHERE id = ?5",
        params![
            professional.name,
            professional.specialty,
            professional.bio,
            professional.is_active,
            professional.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn assign_service(conn: &Connection, professional_id: i64, service_id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "INSERT OR IGNORE INTO professional_services (professional_id, service_id) VALUES (?1, ?2)",
        params![professional_id, service_id],
    )?;
    Ok(count > 0)
}

pub fn remove_service(conn: &Connection, professional_id: i64, service_id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM professional_services WHERE professional_id = ?1 AND service_id = ?2",
        params![professional_id, service_id],
    )?;
    Ok(count > 0)
}

// ── Working hours ──

const WORKING_HOURS_COLUMNS: &str =
    "id, professional_id, day_of_week, start_time, end_time, is_available";

const WEEK_FROM_SUNDAY: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

fn parse_working_hours_row(row: &Row) -> anyhow::Result<WorkingHours> {
    let start_str: String = row.get(3)?;
    let end_str: String = row.get(4)?;

    Ok(WorkingHours {
        id: row.get(0)?,
        professional_id: row.get(1)?,
        day_of_week: row.get(2)?,
        start_time: ClockTime::parse(&start_str)?,
        end_time: ClockTime::parse(&end_str)?,
        is_available: row.get(5)?,
    })
}

/// One row per weekday, copied from the salon policy. Existing rows are kept.
pub fn seed_working_hours(
    conn: &Connection,
    professional_id: i64,
    hours: &OpeningHours,
) -> anyhow::Result<usize> {
    let mut inserted = 0;
    for weekday in WEEK_FROM_SUNDAY {
        inserted += conn.execute(
            "INSERT OR IGNORE INTO working_hours
                 (professional_id, day_of_week, start_time, end_time, is_available)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                professional_id,
                weekday.num_days_from_sunday(),
                hours.opens_at.to_string(),
                hours.closes_at.to_string(),
                !hours.is_closed_on(weekday),
            ],
        )?;
    }
    Ok(inserted)
}

pub fn working_hours_for(conn: &Connection, professional_id: i64) -> anyhow::Result<Vec<WorkingHours>> {
    let sql = format!(
        "SELECT {WORKING_HOURS_COLUMNS} FROM working_hours WHERE professional_id = ?1
         ORDER BY day_of_week ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![professional_id], |row| Ok(parse_working_hours_row(row)))?;

    let mut days = vec![];
    for row in rows {
        days.push(row??);
    }
    Ok(days)
}

pub fn working_hours_on(
    conn: &Connection,
    professional_id: i64,
    date: NaiveDate,
) -> anyhow::Result<Option<WorkingHours>> {
    let sql = format!(
        "SELECT {WORKING_HOURS_COLUMNS} FROM working_hours WHERE professional_id = ?1 AND day_of_week = ?2"
    );
    let day = conn
        .query_row(
            &sql,
            params![professional_id, date.weekday().num_days_from_sunday()],
            |row| Ok(parse_working_hours_row(row)),
        )
        .optional()?;
    day.transpose()
}

pub fn get_working_hours(
    conn: &Connection,
    professional_id: i64,
    id: i64,
) -> anyhow::Result<Option<WorkingHours>> {
    let sql = format!(
        "SELECT {WORKING_HOURS_COLUMNS} FROM working_hours WHERE id = ?1 AND professional_id = ?2"
    );
    let day = conn
        .query_row(&sql, params![id, professional_id], |row| Ok(parse_working_hours_row(row)))
        .optional()?;
    day.transpose()
}

pub fn save_working_hours(conn: &Connection, day: &WorkingHours) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE working_hours SET start_time = ?1, end_time = ?2, is_available = ?3 WHERE id = ?4",
        params![
            day.start_time.to_string(),
            day.end_time.to_string(),
            day.is_available,
            day.id,
        ],
    )?;
    Ok(count > 0)
}

// ── Clients ──

/// Clients are keyed by email; an existing client keeps its stored details.
pub fn find_or_create_client(
    conn: &Connection,
    name: &str,
    email: &str,
    phone: &str,
    notes: Option<&str>,
) -> anyhow::Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM clients WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO clients (name, email, phone, notes) VALUES (?1, ?2, ?3, ?4)",
        params![name, email, phone, notes],
    )?;
    Ok(conn.last_insert_rowid())
}

// ── Bookings ──

const BOOKING_SELECT: &str = "SELECT b.id, b.client_id, b.professional_id, b.service_id, b.booking_date,
            b.start_time, b.end_time, b.status, c.name, c.phone, c.email, b.client_notes,
            b.cancellation_reason, s.name, p.name, b.created_at, b.updated_at
     FROM bookings b
     JOIN clients c ON c.id = b.client_id
     LEFT JOIN services s ON s.id = b.service_id
     LEFT JOIN professionals p ON p.id = b.professional_id";

pub fn insert_booking(
    conn: &Connection,
    client_id: i64,
    request: &BookingRequest,
    now: &NaiveDateTime,
) -> anyhow::Result<i64> {
    let now = format_timestamp(now);
    conn.execute(
        "INSERT INTO bookings (client_id, professional_id, service_id, booking_date, start_time,
                               end_time, status, client_notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            client_id,
            request.professional_id,
            request.service_id,
            request.date.format(DATE_FORMAT).to_string(),
            request.start_time.to_string(),
            request.end_time.to_string(),
            BookingStatus::Pending.as_str(),
            request.notes,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let sql = format!("{BOOKING_SELECT} WHERE b.id = ?1");
    let booking = conn
        .query_row(&sql, params![id], |row| Ok(parse_booking_row(row)))
        .optional()?;
    booking.transpose()
}

pub fn list_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<Vec<Booking>> {
    let mut conditions: Vec<&str> = vec![];
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(date) = filter.date {
        conditions.push("b.booking_date = ?");
        values.push(Box::new(date.format(DATE_FORMAT).to_string()));
    }
    if let Some(status) = filter.status {
        conditions.push("b.status = ?");
        values.push(Box::new(status.as_str()));
    }
    if let Some(professional_id) = filter.professional_id {
        conditions.push("b.professional_id = ?");
        values.push(Box::new(professional_id));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let sql = format!("{BOOKING_SELECT}{where_clause} ORDER BY b.booking_date ASC, b.start_time ASC");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Live (not cancelled) bookings of one professional on one day, by start time.
pub fn bookings_for_professional_on(
    conn: &Connection,
    professional_id: i64,
    date: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "{BOOKING_SELECT} WHERE b.professional_id = ?1 AND b.booking_date = ?2
         AND b.status != 'cancelled' ORDER BY b.start_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![professional_id, date.format(DATE_FORMAT).to_string()],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: i64,
    status: BookingStatus,
    cancellation_reason: Option<&str>,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, cancellation_reason = COALESCE(?2, cancellation_reason),
                updated_at = ?3
         WHERE id = ?4",
        params![status.as_str(), cancellation_reason, format_timestamp(now), id],
    )?;
    Ok(count > 0)
}

pub fn dashboard_stats(conn: &Connection, today: NaiveDate) -> anyhow::Result<DashboardStats> {
    let today_str = today.format(DATE_FORMAT).to_string();
    let month_start = today
        .with_day(1)
        .unwrap_or(today)
        .format(DATE_FORMAT)
        .to_string();

    let today_bookings: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE booking_date = ?1",
        params![today_str],
        |row| row.get(0),
    )?;

    let pending_bookings: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE status = 'pending'",
        [],
        |row| row.get(0),
    )?;

    let (completed_this_month, month_revenue): (i64, f64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(s.price), 0.0)
         FROM bookings b LEFT JOIN services s ON s.id = b.service_id
         WHERE b.status = 'completed' AND b.booking_date >= ?1 AND b.booking_date <= ?2",
        params![month_start, today_str],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(DashboardStats {
        today_bookings,
        pending_bookings,
        completed_this_month,
        month_revenue,
    })
}

fn parse_booking_row(row: &Row) -> anyhow::Result<Booking> {
    let date_str: String = row.get(4)?;
    let start_str: String = row.get(5)?;
    let end_str: String = row.get(6)?;
    let status_str: String = row.get(7)?;
    let created_at_str: String = row.get(15)?;
    let updated_at_str: String = row.get(16)?;

    Ok(Booking {
        id: row.get(0)?,
        client_id: row.get(1)?,
        professional_id: row.get(2)?,
        service_id: row.get(3)?,
        booking_date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)?,
        start_time: ClockTime::parse(&start_str)?,
        end_time: ClockTime::parse(&end_str)?,
        status: BookingStatus::parse(&status_str)
            .ok_or_else(|| anyhow::anyhow!("unknown booking status: {status_str}"))?,
        client_name: row.get(8)?,
        client_phone: row.get(9)?,
        client_email: row.get(10)?,
        client_notes: row.get(11)?,
        cancellation_reason: row.get(12)?,
        service_name: row.get(13)?,
        professional_name: row.get(14)?,
        created_at: NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FORMAT)?,
        updated_at: NaiveDateTime::parse_from_str(&updated_at_str, TIMESTAMP_FORMAT)?,
    })
}

// ── Users & sessions ──

pub fn insert_user(
    conn: &Connection,
    id: &str,
    email: &str,
    password_hash: &str,
    role: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
        params![id, email, password_hash, role],
    )?;
    Ok(())
}

/// The user with that email plus their stored password hash.
pub fn get_user_credentials(conn: &Connection, email: &str) -> anyhow::Result<Option<(User, String)>> {
    let result = conn
        .query_row(
            "SELECT id, email, role, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok((
                    User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        role: row.get(2)?,
                    },
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;
    Ok(result)
}

pub fn insert_auth_session(
    conn: &Connection,
    token: &str,
    user_id: &str,
    expires_at: &NaiveDateTime,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO auth_sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, user_id, format_timestamp(expires_at)],
    )?;
    Ok(())
}

pub fn get_session_user(
    conn: &Connection,
    token: &str,
    now: &NaiveDateTime,
) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT u.id, u.email, u.role FROM auth_sessions a JOIN users u ON u.id = a.user_id
             WHERE a.token = ?1 AND a.expires_at > ?2",
            params![token, format_timestamp(now)],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    role: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

pub fn delete_auth_session(conn: &Connection, token: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM auth_sessions WHERE token = ?1", params![token])?;
    Ok(count > 0)
}

pub fn expire_auth_sessions(conn: &Connection, now: &NaiveDateTime) -> anyhow::Result<usize> {
    let count = conn.execute(
        "DELETE FROM auth_sessions WHERE expires_at <= ?1",
        params![format_timestamp(now)],
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-06-01 09:00:00", TIMESTAMP_FORMAT).unwrap()
    }

    fn service_input(name: &str, category: &str, price: Price) -> ServiceInput {
        ServiceInput {
            name: name.to_string(),
            description: String::new(),
            duration_minutes: 60,
            price,
            category: category.to_string(),
        }
    }

    fn request(professional_id: i64, service_id: i64, day: &str, start: &str, end: &str) -> BookingRequest {
        BookingRequest {
            professional_id,
            service_id,
            date: date(day),
            start_time: ClockTime::parse(start).unwrap(),
            end_time: ClockTime::parse(end).unwrap(),
            client_name: "Maria".to_string(),
            client_phone: "935279765".to_string(),
            client_email: "maria@example.pt".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_services_ordered_and_soft_deleted() {
        let conn = setup_db();
        let cut = insert_service(&conn, &service_input("Cut", "hair", Price::Amount(20.0))).unwrap();
        insert_service(&conn, &service_input("Gel", "nails", Price::OnRequest)).unwrap();
        insert_service(&conn, &service_input("Color", "hair", Price::Amount(45.0))).unwrap();

        let names: Vec<String> = list_services(&conn, true).unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Color", "Cut", "Gel"]);

        assert!(set_service_active(&conn, cut, false).unwrap());
        assert_eq!(list_services(&conn, true).unwrap().len(), 2);
        assert_eq!(list_services(&conn, false).unwrap().len(), 3);

        let gel = list_services(&conn, true).unwrap().pop().unwrap();
        assert_eq!(gel.price, Price::OnRequest);
    }

    #[test]
    fn test_professional_service_associations() {
        let conn = setup_db();
        let sid = insert_service(&conn, &service_input("Cut", "hair", Price::Amount(20.0))).unwrap();
        let pid = insert_professional(
            &conn,
            &ProfessionalInput {
                name: "Ana".to_string(),
                specialty: "Hair".to_string(),
                bio: String::new(),
            },
        )
        .unwrap();

        assert!(get_professional(&conn, pid).unwrap().unwrap().service_ids.is_empty());
        assert!(assign_service(&conn, pid, sid).unwrap());
        assert!(!assign_service(&conn, pid, sid).unwrap());
        assert_eq!(get_professional(&conn, pid).unwrap().unwrap().service_ids, vec![sid]);
        assert!(remove_service(&conn, pid, sid).unwrap());
        assert!(!remove_service(&conn, pid, sid).unwrap());
    }

    #[test]
    fn test_find_or_create_client_reuses_email() {
        let conn = setup_db();
        let a = find_or_create_client(&conn, "Maria", "maria@example.pt", "935279765", None).unwrap();
        let b = find_or_create_client(&conn, "Maria S.", "maria@example.pt", "912345678", None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_booking_lifecycle_and_filters() {
        let conn = setup_db();
        let sid = insert_service(&conn, &service_input("Cut", "hair", Price::Amount(20.0))).unwrap();
        let pid = insert_professional(
            &conn,
            &ProfessionalInput {
                name: "Ana".to_string(),
                specialty: String::new(),
                bio: String::new(),
            },
        )
        .unwrap();
        let client = find_or_create_client(&conn, "Maria", "maria@example.pt", "935279765", None).unwrap();

        let first = insert_booking(&conn, client, &request(pid, sid, "2025-06-10", "14:00", "15:00"), &now()).unwrap();
        insert_booking(&conn, client, &request(pid, sid, "2025-06-10", "10:00", "11:00"), &now()).unwrap();
        insert_booking(&conn, client, &request(pid, sid, "2025-06-11", "10:00", "11:00"), &now()).unwrap();

        let booking = get_booking(&conn, first).unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.client_name, "Maria");
        assert_eq!(booking.service_name.as_deref(), Some("Cut"));
        assert_eq!(booking.end_time.to_string(), "15:00");

        let day = list_bookings(
            &conn,
            &BookingFilter {
                date: Some(date("2025-06-10")),
                ..BookingFilter::default()
            },
        )
        .unwrap();
        assert_eq!(day.len(), 2);
        assert_eq!(day[0].start_time.to_string(), "10:00");

        assert!(update_booking_status(&conn, first, BookingStatus::Cancelled, Some("sick"), &now()).unwrap());
        let cancelled = get_booking(&conn, first).unwrap().unwrap();
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("sick"));

        let live = bookings_for_professional_on(&conn, pid, date("2025-06-10")).unwrap();
        assert_eq!(live.len(), 1);

        let pending = list_bookings(
            &conn,
            &BookingFilter {
                status: Some(BookingStatus::Pending),
                professional_id: Some(pid),
                ..BookingFilter::default()
            },
        )
        .unwrap();
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_dashboard_stats() {
        let conn = setup_db();
        let paid = insert_service(&conn, &service_input("Cut", "hair", Price::Amount(20.0))).unwrap();
        let quote = insert_service(&conn, &service_input("Bridal", "hair", Price::OnRequest)).unwrap();
        let pid = insert_professional(
            &conn,
            &ProfessionalInput {
                name: "Ana".to_string(),
                specialty: String::new(),
                bio: String::new(),
            },
        )
        .unwrap();
        let client = find_or_create_client(&conn, "Maria", "maria@example.pt", "935279765", None).unwrap();

        let a = insert_booking(&conn, client, &request(pid, paid, "2025-06-03", "10:00", "11:00"), &now()).unwrap();
        let b = insert_booking(&conn, client, &request(pid, quote, "2025-06-04", "10:00", "11:00"), &now()).unwrap();
        insert_booking(&conn, client, &request(pid, paid, "2025-06-10", "10:00", "11:00"), &now()).unwrap();
        let old = insert_booking(&conn, client, &request(pid, paid, "2025-05-20", "10:00", "11:00"), &now()).unwrap();

        for id in [a, b, old] {
            update_booking_status(&conn, id, BookingStatus::Completed, None, &now()).unwrap();
        }

        let stats = dashboard_stats(&conn, date("2025-06-10")).unwrap();
        assert_eq!(stats.today_bookings, 1);
        assert_eq!(stats.pending_bookings, 1);
        assert_eq!(stats.completed_this_month, 2);
        assert_eq!(stats.month_revenue, 20.0);
    }

    #[test]
    fn test_sessions_expire() {
        let conn = setup_db();
        insert_user(&conn, "u1", "admin@salon.pt", "hash", "admin").unwrap();
        let expires = now() + chrono::Duration::hours(1);
        insert_auth_session(&conn, "tok", "u1", &expires).unwrap();

        assert!(get_session_user(&conn, "tok", &now()).unwrap().is_some());
        assert!(get_session_user(&conn, "tok", &(expires + chrono::Duration::seconds(1))).unwrap().is_none());
        assert_eq!(expire_auth_sessions(&conn, &(expires + chrono::Duration::seconds(1))).unwrap(), 1);
        assert!(!delete_auth_session(&conn, "tok").unwrap());
    }

    #[test]
    fn test_working_hours_seeded_from_policy() {
        let conn = setup_db();
        let pid = insert_professional(
            &conn,
            &ProfessionalInput {
                name: "Ana".to_string(),
                specialty: String::new(),
                bio: String::new(),
            },
        )
        .unwrap();
        let hours = OpeningHours::default();

        assert_eq!(seed_working_hours(&conn, pid, &hours).unwrap(), 7);
        assert_eq!(seed_working_hours(&conn, pid, &hours).unwrap(), 0);

        let week = working_hours_for(&conn, pid).unwrap();
        let days: Vec<u8> = week.iter().map(|d| d.day_of_week).collect();
        assert_eq!(days, vec![0, 1, 2, 3, 4, 5, 6]);
        // closed on Sunday and Monday by default
        assert!(!week[0].is_available && !week[1].is_available);
        assert!(week[2].is_available);
        assert_eq!(week[2].end_time.to_string(), "19:00");

        let mut tuesday = working_hours_on(&conn, pid, date("2025-06-10")).unwrap().unwrap();
        assert_eq!(tuesday.day_of_week, 2);
        tuesday.end_time = ClockTime::parse("13:00").unwrap();
        assert!(save_working_hours(&conn, &tuesday).unwrap());
        let saved = get_working_hours(&conn, pid, tuesday.id).unwrap().unwrap();
        assert_eq!(saved.end_time.to_string(), "13:00");
        assert!(get_working_hours(&conn, pid + 1, tuesday.id).unwrap().is_none());
    }
}
