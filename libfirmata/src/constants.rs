// libfirmata-rs/libfirmata/src/constants.rs
//! Firmata protocol constants used across the crate

/// Protocol version this crate speaks. Boards reporting a different major
/// version are incompatible, a different minor version is tolerated.
pub const FIRMATA_MAJOR_VERSION: u8 = 2;
pub const FIRMATA_MINOR_VERSION: u8 = 3;

// Command bytes (0x80-0xFF). Digital, analog and report commands carry the
// port / channel in the low nibble.
pub const DIGITAL_MESSAGE: u8 = 0x90;
pub const ANALOG_MESSAGE: u8 = 0xE0;
pub const REPORT_ANALOG: u8 = 0xC0;
pub const REPORT_DIGITAL: u8 = 0xD0;
pub const SET_PIN_MODE: u8 = 0xF4;
pub const SET_DIGITAL_PIN_VALUE: u8 = 0xF5;
pub const REPORT_VERSION: u8 = 0xF9;
pub const SYSTEM_RESET: u8 = 0xFF;
pub const START_SYSEX: u8 = 0xF0;
pub const END_SYSEX: u8 = 0xF7;

// Sysex sub-commands (0x00-0x7F)
pub const ENCODER_DATA: u8 = 0x61;
pub const ANALOG_MAPPING_QUERY: u8 = 0x69;
pub const ANALOG_MAPPING_RESPONSE: u8 = 0x6A;
pub const CAPABILITY_QUERY: u8 = 0x6B;
pub const CAPABILITY_RESPONSE: u8 = 0x6C;
pub const PIN_STATE_QUERY: u8 = 0x6D;
pub const PIN_STATE_RESPONSE: u8 = 0x6E;
pub const EXTENDED_ANALOG: u8 = 0x6F;
pub const SERVO_CONFIG: u8 = 0x70;
pub const STRING_DATA: u8 = 0x71;
pub const I2C_REQUEST: u8 = 0x76;
pub const I2C_REPLY: u8 = 0x77;
pub const I2C_CONFIG: u8 = 0x78;
pub const REPORT_FIRMWARE: u8 = 0x79;
pub const SAMPLING_INTERVAL: u8 = 0x7A;

// Pin mode tokens as sent in SET_PIN_MODE and reported by the board
pub const PIN_MODE_INPUT: u8 = 0x00;
pub const PIN_MODE_OUTPUT: u8 = 0x01;
pub const PIN_MODE_ANALOG: u8 = 0x02;
pub const PIN_MODE_PWM: u8 = 0x03;
pub const PIN_MODE_SERVO: u8 = 0x04;
pub const PIN_MODE_SHIFT: u8 = 0x05;
pub const PIN_MODE_I2C: u8 = 0x06;
pub const PIN_MODE_ONEWIRE: u8 = 0x07;
pub const PIN_MODE_STEPPER: u8 = 0x08;
pub const PIN_MODE_ENCODER: u8 = 0x09;
pub const PIN_MODE_SERIAL: u8 = 0x0A;
pub const PIN_MODE_PULLUP: u8 = 0x0B;
pub const PIN_MODE_IGNORE: u8 = 0x7F;

/// Terminates one pin's (mode, resolution) list in a capability response,
/// and marks "no analog channel" in an analog mapping response.
pub const CAPABILITY_PIN_END: u8 = 0x7F;
pub const NO_ANALOG_CHANNEL: u8 = 0x7F;

// I2C read/write mode bits (byte 3 of an I2C_REQUEST)
pub const I2C_WRITE: u8 = 0x00;
pub const I2C_READ: u8 = 0x08;
pub const I2C_READ_CONTINUOUS: u8 = 0x10;
pub const I2C_STOP_READ_CONTINUOUS: u8 = 0x18;

// Encoder sub-commands (byte following ENCODER_DATA)
pub const ENCODER_ATTACH: u8 = 0x00;
pub const ENCODER_REPORT_POSITION: u8 = 0x01;
pub const ENCODER_REPORT_POSITIONS: u8 = 0x02;
pub const ENCODER_RESET_POSITION: u8 = 0x03;
pub const ENCODER_REPORT_AUTO: u8 = 0x04;
pub const ENCODER_DETACH: u8 = 0x05;

/// Bytes per encoder in an ENCODER_DATA position report.
pub const ENCODER_REPORT_LEN: usize = 5;
pub const ENCODER_CHANNEL_MASK: u8 = 0x3F;
pub const ENCODER_DIRECTION_MASK: u8 = 0x40;

/// Sampling interval bounds accepted by the firmware (milliseconds)
pub const MIN_SAMPLING_INTERVAL: u16 = 10;
pub const MAX_SAMPLING_INTERVAL: u16 = 100;

/// Number of ports covered by REPORT_ANALOG / REPORT_DIGITAL toggles.
pub const REPORT_PORT_COUNT: u8 = 16;

/// Pins per digital port.
pub const PINS_PER_PORT: usize = 8;

/// Largest value an ANALOG_MESSAGE can carry; bigger values and pins above
/// 15 use EXTENDED_ANALOG.
pub const MAX_ANALOG_MESSAGE_VALUE: u32 = 0x3FFF;
pub const MAX_ANALOG_MESSAGE_PIN: u8 = 0x0F;

/// Standard Firmata keeps a 32-byte input buffer, which leaves room for 15
/// two-byte characters in a STRING_DATA message.
pub const MAX_SAFE_STRING_LEN: usize = 15;
