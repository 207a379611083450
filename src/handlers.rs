pub mod admin;
pub mod api_keys;
pub mod appointments;
pub mod auth;
pub mod drafts;
pub mod health;
pub mod patients;
