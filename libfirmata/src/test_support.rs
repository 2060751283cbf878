//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralize common MockTransport setup so tests across the
//! crate and tests/ directory can reuse the same logic: frame builders for
//! every board-to-host message and a scripted board answering the
//! initialization handshake.
#![allow(dead_code)]

use std::time::Duration;

use crate::constants::*;
use crate::device::config::DEFAULT_PIN_STATE_BATCH;
use crate::device::{Device, DeviceBuilder, DeviceConfig};
use crate::dispatch::Execution;
use crate::protocol::codec::{encode_7bit_le, encode_two_byte_string, pack_i2c, split14};
use crate::transport::MockTransport;
use crate::types::PinMode;
use crate::Result;

/// `[F9 major minor]`
#[doc(hidden)]
pub fn version_frame(major: u8, minor: u8) -> Vec<u8> {
    vec![REPORT_VERSION, major, minor]
}

/// REPORT_FIRMWARE response carrying `name` as two-byte characters.
#[doc(hidden)]
pub fn firmware_frame(name: &str, major: u8, minor: u8) -> Vec<u8> {
    let mut body = vec![major, minor];
    body.extend(encode_two_byte_string(name));
    sysex(REPORT_FIRMWARE, &body)
}

/// CAPABILITY_RESPONSE with one `(mode, resolution)` list per pin.
#[doc(hidden)]
pub fn capability_frame(pins: &[Vec<(PinMode, u8)>]) -> Vec<u8> {
    let mut body = Vec::new();
    for modes in pins {
        for &(mode, resolution) in modes {
            body.push(mode.token());
            body.push(resolution);
        }
        body.push(CAPABILITY_PIN_END);
    }
    sysex(CAPABILITY_RESPONSE, &body)
}

/// PIN_STATE_RESPONSE; the value is sent in as many 7-bit chunks as needed.
#[doc(hidden)]
pub fn pin_state_frame(pin: u8, mode: PinMode, value: u32) -> Vec<u8> {
    let mut chunks = 1;
    while chunks < 5 && value >> (7 * chunks) != 0 {
        chunks += 1;
    }
    let mut body = vec![pin, mode.token()];
    body.extend(encode_7bit_le(value, chunks));
    sysex(PIN_STATE_RESPONSE, &body)
}

/// ANALOG_MAPPING_RESPONSE: one channel byte per pin, 0x7F for none.
#[doc(hidden)]
pub fn analog_mapping_frame(channels: &[u8]) -> Vec<u8> {
    sysex(ANALOG_MAPPING_RESPONSE, channels)
}

/// DIGITAL_MESSAGE for `port` with the 8 pin bits in `value`.
#[doc(hidden)]
pub fn digital_frame(port: u8, value: u8) -> Vec<u8> {
    let [lsb, msb] = split14(value as u32);
    vec![DIGITAL_MESSAGE | (port & 0x0F), lsb, msb]
}

/// ANALOG_MESSAGE for `channel`.
#[doc(hidden)]
pub fn analog_frame(channel: u8, value: u32) -> Vec<u8> {
    let [lsb, msb] = split14(value);
    vec![ANALOG_MESSAGE | (channel & 0x0F), lsb, msb]
}

/// I2C_REPLY; address, register and data are packed two bytes each.
#[doc(hidden)]
pub fn i2c_reply_frame(address: u8, register: u8, data: &[u8]) -> Vec<u8> {
    let mut raw = vec![address, register];
    raw.extend_from_slice(data);
    sysex(I2C_REPLY, &pack_i2c(&raw))
}

/// STRING_DATA as sent by the board.
#[doc(hidden)]
pub fn string_frame(text: &str) -> Vec<u8> {
    sysex(STRING_DATA, &encode_two_byte_string(text))
}

/// ENCODER_DATA with one report per `(encoder, position)`.
#[doc(hidden)]
pub fn encoder_positions_frame(reports: &[(u8, i64)]) -> Vec<u8> {
    let mut body = Vec::with_capacity(reports.len() * ENCODER_REPORT_LEN);
    for &(encoder, position) in reports {
        let mut head = encoder & ENCODER_CHANNEL_MASK;
        if position < 0 {
            head |= ENCODER_DIRECTION_MASK;
        }
        body.push(head);
        body.extend(encode_7bit_le(position.unsigned_abs() as u32, 4));
    }
    sysex(ENCODER_DATA, &body)
}

fn sysex(command: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 3);
    out.push(START_SYSEX);
    out.push(command);
    out.extend_from_slice(body);
    out.push(END_SYSEX);
    out
}

#[derive(Debug, Clone)]
struct SimPin {
    capabilities: Vec<(PinMode, u8)>,
    mode: PinMode,
    value: u32,
    channel: Option<u8>,
}

/// A scripted board answering the handshake queries the way firmware does:
/// firmware report, capabilities, pin states and analog mapping.
#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct BoardSim {
    name: String,
    major: u8,
    minor: u8,
    pins: Vec<SimPin>,
    silent: bool,
}

impl BoardSim {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            major: FIRMATA_MAJOR_VERSION,
            minor: FIRMATA_MINOR_VERSION,
            pins: Vec::new(),
            silent: false,
        }
    }

    pub fn with_version(mut self, major: u8, minor: u8) -> Self {
        self.major = major;
        self.minor = minor;
        self
    }

    /// Append a pin advertising `capabilities`, currently in `mode`.
    pub fn with_pin(mut self, capabilities: &[(PinMode, u8)], mode: PinMode, value: u32) -> Self {
        self.pins.push(SimPin {
            capabilities: capabilities.to_vec(),
            mode,
            value,
            channel: None,
        });
        self
    }

    /// Append an analog input pin mapped to `channel`.
    pub fn with_analog_pin(mut self, channel: u8, value: u32) -> Self {
        self.pins.push(SimPin {
            capabilities: vec![
                (PinMode::Input, 1),
                (PinMode::Output, 1),
                (PinMode::Analog, 10),
            ],
            mode: PinMode::Analog,
            value,
            channel: Some(channel),
        });
        self
    }

    /// Ignore the firmware request, like a board still booting.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// Six pins: 0 reserved (no modes), 1 digital, 2 and 3 interrupt
    /// capable with PWM and servo on 2, 4 analog channel 0, 5 I2C.
    pub fn small() -> Self {
        const DIGITAL: [(PinMode, u8); 3] = [
            (PinMode::Input, 1),
            (PinMode::Output, 1),
            (PinMode::Pullup, 1),
        ];
        Self::new("SimFirmata")
            .with_pin(&[], PinMode::Ignored, 0)
            .with_pin(&DIGITAL, PinMode::Output, 0)
            .with_pin(
                &[
                    (PinMode::Input, 1),
                    (PinMode::Output, 1),
                    (PinMode::Pwm, 8),
                    (PinMode::Servo, 14),
                    (PinMode::Encoder, 1),
                ],
                PinMode::Output,
                0,
            )
            .with_pin(
                &[(PinMode::Input, 1), (PinMode::Output, 1), (PinMode::Encoder, 1)],
                PinMode::Input,
                0,
            )
            .with_analog_pin(0, 512)
            .with_pin(&[(PinMode::I2c, 1)], PinMode::I2c, 0)
    }

    /// Responses the board sends for one host message.
    pub fn respond(&self, message: &[u8]) -> Vec<Vec<u8>> {
        match message {
            [REPORT_VERSION] => vec![version_frame(self.major, self.minor)],
            [START_SYSEX, REPORT_FIRMWARE, END_SYSEX] if !self.silent => {
                vec![firmware_frame(&self.name, self.major, self.minor)]
            }
            [START_SYSEX, CAPABILITY_QUERY, END_SYSEX] => {
                let caps: Vec<_> = self.pins.iter().map(|p| p.capabilities.clone()).collect();
                vec![capability_frame(&caps)]
            }
            [START_SYSEX, PIN_STATE_QUERY, pin, END_SYSEX] => self
                .pins
                .get(*pin as usize)
                .map(|p| vec![pin_state_frame(*pin, p.mode, p.value)])
                .unwrap_or_default(),
            [START_SYSEX, ANALOG_MAPPING_QUERY, END_SYSEX] => {
                let channels: Vec<u8> = self
                    .pins
                    .iter()
                    .map(|p| p.channel.unwrap_or(NO_ANALOG_CHANNEL))
                    .collect();
                vec![analog_mapping_frame(&channels)]
            }
            _ => Vec::new(),
        }
    }

    /// MockTransport answering with this board's responses.
    pub fn transport(self) -> MockTransport {
        MockTransport::with_responder(move |message| self.respond(message))
    }
}

/// Build an inline device on `board`, start it and deliver every response
/// until the handshake is over. Returns the device and its mock.
#[doc(hidden)]
pub fn ready_inline_device(board: BoardSim) -> Result<(Device, MockTransport)> {
    let mock = board.transport();
    let config = DeviceConfig::default()
        .with_execution(Execution::Inline)
        .with_pin_state_throttle(DEFAULT_PIN_STATE_BATCH, Duration::ZERO);
    let device = DeviceBuilder::new()
        .with_transport(Box::new(mock.clone()))
        .with_config(config)
        .build()?;
    device.start()?;
    mock.pump();
    Ok((device, mock))
}
