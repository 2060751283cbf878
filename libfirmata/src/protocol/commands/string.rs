// libfirmata-rs/libfirmata/src/protocol/commands/string.rs

use crate::constants::STRING_DATA;
use crate::protocol::codec::encode_two_byte_string;
use crate::protocol::frame::Frame;

/// Encode STRING_DATA: F0 71 (two bytes per character byte) F7
pub fn encode_string_data(text: &str) -> Vec<u8> {
    Frame::encode_unchecked(STRING_DATA, &encode_two_byte_string(text))
}
