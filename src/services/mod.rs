pub mod auth;
pub mod calendar;
pub mod scheduling;
pub mod sessions;
pub mod validation;
pub mod wizard;
