// libfirmata-rs/libfirmata/src/protocol/mod.rs

pub mod codec;
pub mod commands;
pub mod event;
pub mod frame;
pub mod fsm;
pub mod parser;

pub use commands::*;
pub use event::{Event, EventKind, EventName};
pub use frame::Frame;
pub use fsm::{EventSink, State, StateMachine};
pub use parser::{ByteSink, Parser};
