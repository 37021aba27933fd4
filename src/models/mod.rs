pub mod availability;
pub mod booking;
pub mod catalog;
pub mod user;
pub mod wizard;

pub use availability::{parse_weekdays, CalendarDay, ClockTime, OpeningHours, TimeSlot};
pub use booking::{
    Booking, BookingFilter, BookingOutcome, BookingRequest, BookingStatus, DashboardStats,
    StatusChange,
};
pub use catalog::{
    Price, Professional, ProfessionalInput, ProfessionalPatch, Service, ServiceInput, ServicePatch,
    WorkingHours, WorkingHoursPatch,
};
pub use user::{AuthSession, User};
pub use wizard::{BookingDraft, ClientForm, Field, FieldErrors, WizardStep};
