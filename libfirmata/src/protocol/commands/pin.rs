// libfirmata-rs/libfirmata/src/protocol/commands/pin.rs

use crate::constants::*;
use crate::protocol::codec::{encode_7bit_le, split14};
use crate::protocol::frame::Frame;
use crate::types::PinMode;

/// Encode SET_PIN_MODE: F4 pin mode
pub fn encode_set_pin_mode(pin: u8, mode: PinMode) -> Vec<u8> {
    vec![SET_PIN_MODE, pin & 0x7F, mode.token() & 0x7F]
}

/// Encode a DIGITAL_MESSAGE carrying the whole 8-pin port value.
/// Layout: (90 | port) value_lsb value_msb
pub fn encode_digital_port(port: u8, value: u8) -> Vec<u8> {
    let [lsb, msb] = split14(value as u32);
    vec![DIGITAL_MESSAGE | (port & 0x0F), lsb, msb]
}

/// Encode SET_DIGITAL_PIN_VALUE: F5 pin value
pub fn encode_set_digital_pin_value(pin: u8, value: bool) -> Vec<u8> {
    vec![SET_DIGITAL_PIN_VALUE, pin & 0x7F, value as u8]
}

/// Encode an analog write. Pins 0-15 with 14-bit values use the compact
/// ANALOG_MESSAGE; anything larger goes through EXTENDED_ANALOG with four
/// 7-bit value chunks.
pub fn encode_analog_value(pin: u8, value: u32) -> Vec<u8> {
    if pin <= MAX_ANALOG_MESSAGE_PIN && value <= MAX_ANALOG_MESSAGE_VALUE {
        let [lsb, msb] = split14(value);
        vec![ANALOG_MESSAGE | (pin & 0x0F), lsb, msb]
    } else {
        let mut payload = vec![pin & 0x7F];
        payload.extend(encode_7bit_le(value, 4));
        Frame::encode_unchecked(EXTENDED_ANALOG, &payload)
    }
}

/// Encode SERVO_CONFIG: F0 70 pin min_lsb min_msb max_lsb max_msb F7
pub fn encode_servo_config(pin: u8, min_pulse: u16, max_pulse: u16) -> Vec<u8> {
    let [min_lsb, min_msb] = split14(min_pulse as u32);
    let [max_lsb, max_msb] = split14(max_pulse as u32);
    Frame::encode_unchecked(
        SERVO_CONFIG,
        &[pin & 0x7F, min_lsb, min_msb, max_lsb, max_msb],
    )
}
