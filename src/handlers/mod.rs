pub mod admin;
pub mod auth;
pub mod calendar;
pub mod catalog;
pub mod health;
pub mod wizard;
