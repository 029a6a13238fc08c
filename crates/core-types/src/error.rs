// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Malformed tick for '{instrument}': {reason}")]
    MalformedTick { instrument: String, reason: String },

    #[error("Invalid candle at {open_time}: {reason}")]
    InvalidCandle { open_time: i64, reason: String },

    #[error("Unknown candle interval: {0}")]
    UnknownInterval(String),

    #[error("Price cannot be represented as an order price: {0}")]
    InvalidPrice(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
