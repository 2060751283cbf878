// libfirmata-rs/libfirmata/src/types.rs

use derive_more::Display;

use crate::constants::*;

/// Duty of a pin. Tokens outside the known set are preserved in
/// `Unsupported` so they survive a round-trip to the board.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PinMode {
    #[display(fmt = "INPUT")]
    Input,
    #[display(fmt = "OUTPUT")]
    Output,
    #[display(fmt = "ANALOG")]
    Analog,
    #[display(fmt = "PWM")]
    Pwm,
    #[display(fmt = "SERVO")]
    Servo,
    #[display(fmt = "SHIFT")]
    Shift,
    #[display(fmt = "I2C")]
    I2c,
    #[display(fmt = "ONEWIRE")]
    OneWire,
    #[display(fmt = "STEPPER")]
    Stepper,
    #[display(fmt = "ENCODER")]
    Encoder,
    #[display(fmt = "SERIAL")]
    Serial,
    #[display(fmt = "PULLUP")]
    Pullup,
    #[display(fmt = "UNSUPPORTED({:#04x})", _0)]
    Unsupported(u8),
    #[display(fmt = "IGNORED")]
    Ignored,
}

impl PinMode {
    /// Resolve a mode token from a Firmata message.
    pub fn from_token(token: u8) -> Self {
        match token {
            PIN_MODE_INPUT => Self::Input,
            PIN_MODE_OUTPUT => Self::Output,
            PIN_MODE_ANALOG => Self::Analog,
            PIN_MODE_PWM => Self::Pwm,
            PIN_MODE_SERVO => Self::Servo,
            PIN_MODE_SHIFT => Self::Shift,
            PIN_MODE_I2C => Self::I2c,
            PIN_MODE_ONEWIRE => Self::OneWire,
            PIN_MODE_STEPPER => Self::Stepper,
            PIN_MODE_ENCODER => Self::Encoder,
            PIN_MODE_SERIAL => Self::Serial,
            PIN_MODE_PULLUP => Self::Pullup,
            PIN_MODE_IGNORE => Self::Ignored,
            other => Self::Unsupported(other),
        }
    }

    /// Token sent on the wire for this mode.
    pub fn token(&self) -> u8 {
        match self {
            Self::Input => PIN_MODE_INPUT,
            Self::Output => PIN_MODE_OUTPUT,
            Self::Analog => PIN_MODE_ANALOG,
            Self::Pwm => PIN_MODE_PWM,
            Self::Servo => PIN_MODE_SERVO,
            Self::Shift => PIN_MODE_SHIFT,
            Self::I2c => PIN_MODE_I2C,
            Self::OneWire => PIN_MODE_ONEWIRE,
            Self::Stepper => PIN_MODE_STEPPER,
            Self::Encoder => PIN_MODE_ENCODER,
            Self::Serial => PIN_MODE_SERIAL,
            Self::Pullup => PIN_MODE_PULLUP,
            Self::Unsupported(token) => *token,
            Self::Ignored => PIN_MODE_IGNORE,
        }
    }

    /// Modes whose value is written with an (extended) analog message.
    pub fn is_analog_output(&self) -> bool {
        matches!(self, Self::Analog | Self::Pwm | Self::Servo)
    }

    /// Modes whose value is reported through digital port messages.
    pub fn is_digital_input(&self) -> bool {
        matches!(self, Self::Input | Self::Pullup)
    }
}

/// Firmware name and version as reported by REPORT_FIRMWARE.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[display(fmt = "{} - {}.{}", name, major, minor)]
pub struct FirmwareInfo {
    pub name: String,
    pub major: u8,
    pub minor: u8,
}

/// Protocol version as reported by REPORT_VERSION.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[display(fmt = "{}.{}", major, minor)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    pub const SUPPORTED: Self = Self {
        major: FIRMATA_MAJOR_VERSION,
        minor: FIRMATA_MINOR_VERSION,
    };

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Boards sharing the major version are expected to work.
    pub fn is_compatible(&self) -> bool {
        self.major == FIRMATA_MAJOR_VERSION
    }
}

/// Coarse device readiness.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Readiness {
    #[display(fmt = "not started")]
    NotStarted,
    #[display(fmt = "initializing")]
    Initializing,
    #[display(fmt = "ready")]
    Ready,
}

/// Step of the device initialization handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitPhase {
    #[default]
    Uninitialized,
    AwaitingFirmware,
    AwaitingCapabilities,
    AwaitingPinStates {
        remaining: usize,
    },
    AwaitingAnalogMapping,
    Ready,
}

impl InitPhase {
    pub fn readiness(&self) -> Readiness {
        match self {
            Self::Uninitialized => Readiness::NotStarted,
            Self::Ready => Readiness::Ready,
            _ => Readiness::Initializing,
        }
    }

    /// Phases in which pin-state responses count towards initialization.
    pub(crate) fn counts_pin_states(&self) -> bool {
        matches!(
            self,
            Self::AwaitingCapabilities | Self::AwaitingPinStates { .. }
        )
    }
}
