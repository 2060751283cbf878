// libfirmata-rs/libfirmata/src/protocol/commands/report.rs

use crate::constants::*;
use crate::protocol::codec::split14;
use crate::protocol::frame::Frame;

fn encode_report_toggle(command: u8, enable: bool) -> Vec<u8> {
    let flag = enable as u8;
    (0..REPORT_PORT_COUNT)
        .flat_map(|port| [command | port, flag])
        .collect()
}

/// Toggle REPORT_ANALOG for all 16 analog channels (32 bytes).
pub fn encode_report_analog(enable: bool) -> Vec<u8> {
    encode_report_toggle(REPORT_ANALOG, enable)
}

/// Toggle REPORT_DIGITAL for all 16 ports (32 bytes).
pub fn encode_report_digital(enable: bool) -> Vec<u8> {
    encode_report_toggle(REPORT_DIGITAL, enable)
}

/// Encode SAMPLING_INTERVAL, clamped to what the firmware accepts.
pub fn encode_sampling_interval(interval_ms: u16) -> Vec<u8> {
    let clamped = interval_ms.clamp(MIN_SAMPLING_INTERVAL, MAX_SAMPLING_INTERVAL);
    Frame::encode_unchecked(SAMPLING_INTERVAL, &split14(clamped as u32))
}

/// Encode SYSTEM_RESET (single byte FF)
pub fn encode_system_reset() -> Vec<u8> {
    vec![SYSTEM_RESET]
}
