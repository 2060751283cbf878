// libfirmata-rs/libfirmata/src/prelude.rs

pub use crate::device::{
    Device, DeviceBuilder, DeviceConfig, DeviceListener, Encoder, EncoderEvent, EncoderListener,
    I2cDevice, I2cEvent, I2cListener, ListenerId, Pin, PinEvent, PinListener, Watchdog,
};
pub use crate::dispatch::{Execution, HandlerId};
pub use crate::protocol::{ByteSink, Command, EncoderOp, Event, EventKind, EventName};
pub use crate::transport::Transport;
pub use crate::{Error, FirmwareInfo, InitPhase, PinMode, ProtocolVersion, Readiness, Result};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex_spaced, ms, HexBytes};
