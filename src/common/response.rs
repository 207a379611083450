// src/common/response.rs

use serde::Serialize;

// Envelope de sucesso: `{ data, message? }`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, message: None }
    }

    pub fn with_message(data: T, message: &'static str) -> Self {
        Self { data, message: Some(message) }
    }
}
