pub mod auth;
pub mod rbac;
pub mod routes;
pub mod security;
