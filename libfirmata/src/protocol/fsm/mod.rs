// libfirmata-rs/libfirmata/src/protocol/fsm/mod.rs

//! Byte-stream decoder: a closed set of states and one transition function.

pub mod machine;
pub mod state;

pub use machine::StateMachine;
pub use state::State;

use crate::protocol::event::Event;

/// Receiver of decoded events.
pub trait EventSink {
    fn publish(&mut self, event: Event);
}

/// Collects events, used by tests and by callers decoding captured traffic.
impl EventSink for Vec<Event> {
    fn publish(&mut self, event: Event) {
        self.push(event);
    }
}

impl<T: EventSink + ?Sized> EventSink for Box<T> {
    fn publish(&mut self, event: Event) {
        (**self).publish(event);
    }
}
