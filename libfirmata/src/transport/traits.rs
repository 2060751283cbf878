// libfirmata-rs/libfirmata/src/transport/traits.rs

use crate::protocol::parser::ByteSink;
use crate::Result;

/// Transport trait abstracts the byte link (serial port, socket, ...) away
/// from protocol and device logic.
pub trait Transport: Send {
    /// Open the link. Every byte received afterwards must be pushed into
    /// `sink`, in arrival order, from a single reader.
    fn start(&mut self, sink: ByteSink) -> Result<()>;

    /// Close the link and stop pushing into the sink.
    fn stop(&mut self) -> Result<()>;

    /// Send raw bytes to the board.
    fn write(&mut self, data: &[u8]) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn start(&mut self, sink: ByteSink) -> Result<()> {
        (**self).start(sink)
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }
}
