// In crates/api-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the API client: {0}")]
    ClientBuildError(String),
    #[error("Invalid signing key: {0}")]
    SigningError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("Venue rejected the request: code {code}, msg: {msg}")]
    ApiError { code: i64, msg: String },
    #[error("Rejected feed data: {0}")]
    InvalidData(#[from] core_types::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
