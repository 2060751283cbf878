// libfirmata-rs/libfirmata/src/error.rs

use thiserror::Error;

use crate::types::PinMode;

/// Common error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("no transport configured")]
    TransportMissing,

    #[error("device is not started")]
    NotStarted,

    #[error("operation timed out")]
    Timeout,

    #[error("pin {pin} does not support mode {mode}")]
    UnsupportedMode { pin: u8, mode: PinMode },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("pin index {index} out of range (device has {count} pins)")]
    PinOutOfRange { index: usize, count: usize },

    #[error("device has been dropped")]
    DeviceDropped,

    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("frame format error: {0}")]
    FrameFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;
