use bridge_traits::{error::BridgeError, RecordNumber};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Record store is not open")]
    StoreNotOpen,

    #[error("Record {rrn} is {size} bytes, slot size is {max}")]
    RecordTooLarge {
        rrn: RecordNumber,
        size: usize,
        max: usize,
    },

    #[error("Cannot decode record: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, LibraryError>;
