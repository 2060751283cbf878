// libfirmata-rs/libfirmata/src/protocol/event.rs

//! Typed protocol events produced by the state machine.

use std::collections::BTreeMap;
use std::time::Instant;

use derive_more::Display;

use crate::types::{FirmwareInfo, PinMode, ProtocolVersion};

/// Payload of a decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    ProtocolVersion(ProtocolVersion),
    Firmware(FirmwareInfo),
    /// One pin of a digital port message.
    DigitalValue { pin: u8, value: u8 },
    /// Analog channel value. Extended analog messages carry a pin index
    /// here instead of a channel.
    AnalogValue { channel: u8, value: u32 },
    Capability { pin: u8, modes: Vec<PinMode> },
    CapabilitiesEnd { pin_count: usize },
    /// Analog channel to pin index.
    AnalogMapping(BTreeMap<u8, u8>),
    PinState { pin: u8, mode: PinMode, value: u32 },
    StringMessage { text: String },
    I2cReply { address: u8, register: u8, data: Vec<u8> },
    EncoderPosition { encoder: u8, position: i64 },
    CustomSysex { command: u8, data: Vec<u8> },
    SystemReset,
    /// Unknown command byte seen while waiting for a message.
    Error { byte: u8, description: String },
    /// Input arrived after the machine halted.
    TerminalState { byte: u8 },
}

/// Fieldless event discriminant, used to register handlers.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventName {
    #[display(fmt = "protocol_version")]
    ProtocolVersion,
    #[display(fmt = "firmware")]
    Firmware,
    #[display(fmt = "digital_value")]
    DigitalValue,
    #[display(fmt = "analog_value")]
    AnalogValue,
    #[display(fmt = "capability")]
    Capability,
    #[display(fmt = "capabilities_end")]
    CapabilitiesEnd,
    #[display(fmt = "analog_mapping")]
    AnalogMapping,
    #[display(fmt = "pin_state")]
    PinState,
    #[display(fmt = "string_message")]
    StringMessage,
    #[display(fmt = "i2c_reply")]
    I2cReply,
    #[display(fmt = "encoder_position")]
    EncoderPosition,
    #[display(fmt = "custom_sysex")]
    CustomSysex,
    #[display(fmt = "system_reset")]
    SystemReset,
    #[display(fmt = "error")]
    Error,
    #[display(fmt = "terminal_state")]
    TerminalState,
}

impl EventKind {
    pub fn name(&self) -> EventName {
        match self {
            Self::ProtocolVersion(_) => EventName::ProtocolVersion,
            Self::Firmware(_) => EventName::Firmware,
            Self::DigitalValue { .. } => EventName::DigitalValue,
            Self::AnalogValue { .. } => EventName::AnalogValue,
            Self::Capability { .. } => EventName::Capability,
            Self::CapabilitiesEnd { .. } => EventName::CapabilitiesEnd,
            Self::AnalogMapping(_) => EventName::AnalogMapping,
            Self::PinState { .. } => EventName::PinState,
            Self::StringMessage { .. } => EventName::StringMessage,
            Self::I2cReply { .. } => EventName::I2cReply,
            Self::EncoderPosition { .. } => EventName::EncoderPosition,
            Self::CustomSysex { .. } => EventName::CustomSysex,
            Self::SystemReset => EventName::SystemReset,
            Self::Error { .. } => EventName::Error,
            Self::TerminalState { .. } => EventName::TerminalState,
        }
    }
}

/// A decoded message stamped with its decode time. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: Instant,
    pub kind: EventKind,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            timestamp: Instant::now(),
            kind,
        }
    }

    pub fn name(&self) -> EventName {
        self.kind.name()
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}
