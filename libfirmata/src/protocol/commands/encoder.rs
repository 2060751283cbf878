// libfirmata-rs/libfirmata/src/protocol/commands/encoder.rs

use crate::constants::*;
use crate::protocol::frame::Frame;

fn encoder_frame(sub_command: u8, args: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(1 + args.len());
    payload.push(sub_command);
    payload.extend(args.iter().map(|b| b & 0x7F));
    Frame::encode_unchecked(ENCODER_DATA, &payload)
}

/// Encode ENCODER_ATTACH: F0 61 00 encoder pin_a pin_b F7
pub fn encode_encoder_attach(encoder: u8, pin_a: u8, pin_b: u8) -> Vec<u8> {
    encoder_frame(ENCODER_ATTACH, &[encoder, pin_a, pin_b])
}

/// Encode ENCODER_REPORT_POSITION for one encoder.
pub fn encode_encoder_report_position(encoder: u8) -> Vec<u8> {
    encoder_frame(ENCODER_REPORT_POSITION, &[encoder])
}

/// Encode ENCODER_REPORT_POSITIONS for all attached encoders.
pub fn encode_encoder_report_positions() -> Vec<u8> {
    encoder_frame(ENCODER_REPORT_POSITIONS, &[])
}

/// Encode ENCODER_RESET_POSITION: F0 61 03 encoder F7
pub fn encode_encoder_reset_position(encoder: u8) -> Vec<u8> {
    encoder_frame(ENCODER_RESET_POSITION, &[encoder])
}

/// Encode ENCODER_REPORT_AUTO toggle.
pub fn encode_encoder_report_auto(enable: bool) -> Vec<u8> {
    encoder_frame(ENCODER_REPORT_AUTO, &[enable as u8])
}

/// Encode ENCODER_DETACH: F0 61 05 encoder F7
pub fn encode_encoder_detach(encoder: u8) -> Vec<u8> {
    encoder_frame(ENCODER_DETACH, &[encoder])
}
