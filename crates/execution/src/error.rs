// In crates/execution/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("Invalid slippage setting: {0}")]
    InvalidSlippage(f64),

    #[error("API client error: {0}")]
    ApiClientError(#[from] api_client::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
