//! Small helpers shared across the crate: hex formatting for logs, polling
//! with a deadline, an atomic ratchet and a named queue worker.

pub mod atomic;
pub mod hex;
pub mod timeout;
pub mod worker;

pub use atomic::raise;
pub use hex::*;
pub use timeout::*;
pub use worker::Worker;
