// libfirmata-rs/libfirmata/src/dispatch/mod.rs

//! Delivery of decoded events to registered handlers.

pub mod dispatcher;

pub use dispatcher::{Dispatcher, Execution, Handler, HandlerId};
