pub mod api_key_repo;
pub use api_key_repo::ApiKeyRepository;
pub mod appointment_repo;
pub use appointment_repo::AppointmentRepository;
pub mod patient_repo;
pub use patient_repo::PatientRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod record_store;
pub use record_store::{PgRecordStore, RecordStore};
pub mod admin_repo;
pub use admin_repo::AdminRepository;
