// libfirmata-rs/libfirmata/src/lib.rs

//! libfirmata
//!
//! Host-side client for the Firmata protocol: decodes the board's byte
//! stream into events, dispatches them, and keeps a model of the board's
//! pins, I2C devices and encoders.
#![warn(missing_docs)]

pub mod constants;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod prelude;
pub mod protocol;
pub mod test_support;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the types in `types` are available for consumers and for
// convenient `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
