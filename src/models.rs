pub mod api_key;
pub mod appointment;
pub mod auth;
pub mod draft;
pub mod health;
pub mod patient;
pub mod session;
