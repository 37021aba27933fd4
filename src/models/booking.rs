use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::ClockTime;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub client_id: i64,
    pub professional_id: i64,
    pub service_id: i64,
    pub booking_date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub status: BookingStatus,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: String,
    pub client_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub service_name: Option<String>,
    pub professional_name: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// pending -> confirmed -> completed, and pending/confirmed -> cancelled.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

/// A status change requested from the admin surface. Cancelling carries the
/// reason shown to staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusChange {
    Confirmed,
    Completed,
    Cancelled { reason: String },
}

impl StatusChange {
    pub fn target(&self) -> BookingStatus {
        match self {
            StatusChange::Confirmed => BookingStatus::Confirmed,
            StatusChange::Completed => BookingStatus::Completed,
            StatusChange::Cancelled { .. } => BookingStatus::Cancelled,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            StatusChange::Cancelled { reason } => Some(reason.as_str()),
            _ => None,
        }
    }
}

/// Payload handed to the persistence service once the wizard is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub professional_id: i64,
    pub service_id: i64,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BookingOutcome {
    Created { record_id: i64 },
    Rejected { reason: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    pub date: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
    pub professional_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub today_bookings: i64,
    pub pending_bookings: i64,
    pub completed_this_month: i64,
    pub month_revenue: f64,
}
