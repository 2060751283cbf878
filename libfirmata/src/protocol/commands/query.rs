// libfirmata-rs/libfirmata/src/protocol/commands/query.rs

use crate::constants::*;
use crate::protocol::frame::Frame;

/// Encode REPORT_FIRMWARE request: F0 79 F7
pub fn encode_report_firmware() -> Vec<u8> {
    Frame::encode_unchecked(REPORT_FIRMWARE, &[])
}

/// Encode REPORT_VERSION request (single byte F9)
pub fn encode_report_version() -> Vec<u8> {
    vec![REPORT_VERSION]
}

/// Encode CAPABILITY_QUERY: F0 6B F7
pub fn encode_capability_query() -> Vec<u8> {
    Frame::encode_unchecked(CAPABILITY_QUERY, &[])
}

/// Encode ANALOG_MAPPING_QUERY: F0 69 F7
pub fn encode_analog_mapping_query() -> Vec<u8> {
    Frame::encode_unchecked(ANALOG_MAPPING_QUERY, &[])
}

/// Encode PIN_STATE_QUERY: F0 6D pin F7
pub fn encode_pin_state_query(pin: u8) -> Vec<u8> {
    Frame::encode_unchecked(PIN_STATE_QUERY, &[pin & 0x7F])
}
