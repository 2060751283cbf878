// libfirmata-rs/libfirmata/src/protocol/commands/mod.rs

pub mod encoder;
pub mod i2c;
pub mod pin;
pub mod query;
pub mod report;
pub mod string;

pub use encoder::{
    encode_encoder_attach, encode_encoder_detach, encode_encoder_report_auto,
    encode_encoder_report_position, encode_encoder_report_positions,
    encode_encoder_reset_position,
};
pub use i2c::{encode_i2c_config, encode_i2c_read, encode_i2c_stop_continuous, encode_i2c_write};
pub use pin::{
    encode_analog_value, encode_digital_port, encode_servo_config, encode_set_digital_pin_value,
    encode_set_pin_mode,
};
pub use query::{
    encode_analog_mapping_query, encode_capability_query, encode_pin_state_query,
    encode_report_firmware, encode_report_version,
};
pub use report::{
    encode_report_analog, encode_report_digital, encode_sampling_interval, encode_system_reset,
};
pub use string::encode_string_data;

use crate::constants::*;
use crate::protocol::frame::Frame;
use crate::types::PinMode;
use crate::Result;

/// Encoder sub-operations carried by ENCODER_DATA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderOp {
    Attach { encoder: u8, pin_a: u8, pin_b: u8 },
    ReportPosition { encoder: u8 },
    ReportPositions,
    ResetPosition { encoder: u8 },
    ReportAuto { enable: bool },
    Detach { encoder: u8 },
}

/// High-level outgoing message. New messages should be added here and
/// their encoder placed in `protocol::commands::<family>.rs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ReportVersion,
    ReportFirmware,
    CapabilityQuery,
    AnalogMappingQuery,
    PinStateQuery {
        pin: u8,
    },
    SetPinMode {
        pin: u8,
        mode: PinMode,
    },
    DigitalPortValue {
        port: u8,
        value: u8,
    },
    SetDigitalPinValue {
        pin: u8,
        value: bool,
    },
    /// Picks ANALOG_MESSAGE or EXTENDED_ANALOG depending on pin and value.
    AnalogValue {
        pin: u8,
        value: u32,
    },
    ReportAnalog {
        enable: bool,
    },
    ReportDigital {
        enable: bool,
    },
    SamplingInterval {
        interval_ms: u16,
    },
    ServoConfig {
        pin: u8,
        min_pulse: u16,
        max_pulse: u16,
    },
    I2cConfig {
        delay_us: u16,
    },
    I2cWrite {
        address: u8,
        data: Vec<u8>,
    },
    I2cRead {
        address: u8,
        register: u8,
        length: u16,
        continuous: bool,
    },
    I2cStopContinuous {
        address: u8,
    },
    Encoder(EncoderOp),
    StringData {
        text: String,
    },
    SystemReset,
    /// Raw sysex message for extensions this crate has no encoder for.
    Sysex {
        command: u8,
        data: Vec<u8>,
    },
}

impl Command {
    /// Leading command byte on the wire (START_SYSEX for sysex messages).
    pub fn command_byte(&self) -> u8 {
        match self {
            Self::ReportVersion => REPORT_VERSION,
            Self::SetPinMode { .. } => SET_PIN_MODE,
            Self::DigitalPortValue { port, .. } => DIGITAL_MESSAGE | (port & 0x0F),
            Self::SetDigitalPinValue { .. } => SET_DIGITAL_PIN_VALUE,
            Self::AnalogValue { pin, value }
                if *pin <= MAX_ANALOG_MESSAGE_PIN && *value <= MAX_ANALOG_MESSAGE_VALUE =>
            {
                ANALOG_MESSAGE | pin
            }
            Self::ReportAnalog { .. } => REPORT_ANALOG,
            Self::ReportDigital { .. } => REPORT_DIGITAL,
            Self::SystemReset => SYSTEM_RESET,
            _ => START_SYSEX,
        }
    }

    /// Encode the command into wire bytes. Only `Sysex` can fail, when its
    /// command or data are not 7-bit.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            Self::ReportVersion => encode_report_version(),
            Self::ReportFirmware => encode_report_firmware(),
            Self::CapabilityQuery => encode_capability_query(),
            Self::AnalogMappingQuery => encode_analog_mapping_query(),
            Self::PinStateQuery { pin } => encode_pin_state_query(*pin),
            Self::SetPinMode { pin, mode } => encode_set_pin_mode(*pin, *mode),
            Self::DigitalPortValue { port, value } => encode_digital_port(*port, *value),
            Self::SetDigitalPinValue { pin, value } => encode_set_digital_pin_value(*pin, *value),
            Self::AnalogValue { pin, value } => encode_analog_value(*pin, *value),
            Self::ReportAnalog { enable } => encode_report_analog(*enable),
            Self::ReportDigital { enable } => encode_report_digital(*enable),
            Self::SamplingInterval { interval_ms } => encode_sampling_interval(*interval_ms),
            Self::ServoConfig {
                pin,
                min_pulse,
                max_pulse,
            } => encode_servo_config(*pin, *min_pulse, *max_pulse),
            Self::I2cConfig { delay_us } => encode_i2c_config(*delay_us),
            Self::I2cWrite { address, data } => encode_i2c_write(*address, data),
            Self::I2cRead {
                address,
                register,
                length,
                continuous,
            } => encode_i2c_read(*address, *register, *length, *continuous),
            Self::I2cStopContinuous { address } => encode_i2c_stop_continuous(*address),
            Self::Encoder(op) => match op {
                EncoderOp::Attach {
                    encoder,
                    pin_a,
                    pin_b,
                } => encode_encoder_attach(*encoder, *pin_a, *pin_b),
                EncoderOp::ReportPosition { encoder } => encode_encoder_report_position(*encoder),
                EncoderOp::ReportPositions => encode_encoder_report_positions(),
                EncoderOp::ResetPosition { encoder } => encode_encoder_reset_position(*encoder),
                EncoderOp::ReportAuto { enable } => encode_encoder_report_auto(*enable),
                EncoderOp::Detach { encoder } => encode_encoder_detach(*encoder),
            },
            Self::StringData { text } => encode_string_data(text),
            Self::SystemReset => encode_system_reset(),
            Self::Sysex { command, data } => Frame::encode(*command, data)?,
        };
        Ok(bytes)
    }
}
