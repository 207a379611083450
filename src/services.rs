pub mod api_key_service;
pub mod appointment_service;
pub mod auth;
pub mod autosave;
pub mod availability;
pub mod draft_service;
pub mod patient_service;
pub mod session_codec;
