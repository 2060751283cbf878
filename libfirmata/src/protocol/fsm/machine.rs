// libfirmata-rs/libfirmata/src/protocol/fsm/machine.rs

use std::collections::{BTreeMap, HashSet};

use log::{debug, error, trace, warn};

use super::state::State;
use super::EventSink;
use crate::constants::*;
use crate::protocol::codec::{decode_7bit_le, decode_two_byte_string, join14, unpack_i2c};
use crate::protocol::event::{Event, EventKind};
use crate::types::{FirmwareInfo, PinMode, ProtocolVersion};
use crate::{Error, Result};

/// Incremental Firmata decoder.
///
/// Bytes are fed in wire order through [`process`](Self::process) or
/// [`process_bytes`](Self::process_bytes); every complete message is handed
/// to the sink as an [`Event`]. Malformed input never fails: unknown command
/// bytes become `EventKind::Error` and the machine keeps waiting.
///
/// Not thread-safe. Feed it from a single ordered source.
pub struct StateMachine<S> {
    state: Option<State>,
    buffer: Vec<u8>,
    custom_sysex: HashSet<u8>,
    sink: S,
}

impl<S: EventSink> StateMachine<S> {
    pub fn new(sink: S) -> Self {
        Self {
            state: Some(State::Waiting),
            buffer: Vec::with_capacity(64),
            custom_sysex: HashSet::new(),
            sink,
        }
    }

    /// Route sysex messages with `command` to `EventKind::CustomSysex`.
    /// Built-in sub-commands keep their own decoding.
    pub fn register_custom_sysex(&mut self, command: u8) -> Result<()> {
        if command > 0x7F {
            return Err(Error::InvalidArgument(format!(
                "sysex command {:#04x} is not a 7-bit value",
                command
            )));
        }
        self.custom_sysex.insert(command);
        Ok(())
    }

    /// Current state, `None` once halted.
    pub fn current_state(&self) -> Option<State> {
        self.state
    }

    /// Leave the machine without a state. Every later byte produces a
    /// `TerminalState` event.
    pub fn halt(&mut self) {
        debug!("state machine halted");
        self.state = None;
        self.buffer.clear();
    }

    /// Drop any partial message and wait for a command byte.
    pub fn reset(&mut self) {
        self.enter(State::Waiting);
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn process_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.process(b);
        }
    }

    pub fn process(&mut self, byte: u8) {
        let Some(state) = self.state else {
            error!("byte {:#04x} received without a current state", byte);
            self.publish(EventKind::TerminalState { byte });
            return;
        };
        trace!("{:?} <- {:#04x}", state, byte);
        if let Some(next) = self.step(state, byte) {
            self.enter(next);
        }
    }

    fn enter(&mut self, next: State) {
        self.buffer.clear();
        self.state = Some(next);
    }

    fn publish(&mut self, kind: EventKind) {
        self.sink.publish(Event::new(kind));
    }

    /// Transition function. `Some(next)` enters `next` with a fresh buffer,
    /// `None` stays in the current state.
    fn step(&mut self, state: State, byte: u8) -> Option<State> {
        match state {
            State::Waiting => self.on_command(byte),
            State::ParsingDigital { port } => {
                self.buffer.push(byte);
                if self.buffer.len() < 2 {
                    return None;
                }
                let value = join14(self.buffer[0], self.buffer[1]);
                for i in 0..PINS_PER_PORT {
                    self.publish(EventKind::DigitalValue {
                        pin: port * PINS_PER_PORT as u8 + i as u8,
                        value: ((value >> i) & 0x01) as u8,
                    });
                }
                Some(State::Waiting)
            }
            State::ParsingAnalog { channel } => {
                self.buffer.push(byte);
                if self.buffer.len() < 2 {
                    return None;
                }
                let value = join14(self.buffer[0], self.buffer[1]);
                self.publish(EventKind::AnalogValue { channel, value });
                Some(State::Waiting)
            }
            State::ParsingVersion => {
                self.buffer.push(byte);
                if self.buffer.len() < 2 {
                    return None;
                }
                let version = ProtocolVersion::new(self.buffer[0], self.buffer[1]);
                self.publish(EventKind::ProtocolVersion(version));
                Some(State::Waiting)
            }
            State::ParsingSysex => Some(self.on_sysex_command(byte)),
            State::ParsingCapabilityResponse { pin } => match byte {
                END_SYSEX => {
                    if !self.buffer.is_empty() {
                        debug!("unterminated capability list for pin {} dropped", pin);
                    }
                    self.publish(EventKind::CapabilitiesEnd {
                        pin_count: pin as usize,
                    });
                    Some(State::Waiting)
                }
                CAPABILITY_PIN_END => {
                    let modes = self
                        .buffer
                        .iter()
                        .step_by(2)
                        .map(|&token| PinMode::from_token(token))
                        .collect();
                    self.publish(EventKind::Capability { pin, modes });
                    Some(State::ParsingCapabilityResponse {
                        pin: pin.wrapping_add(1),
                    })
                }
                _ => {
                    self.buffer.push(byte);
                    None
                }
            },
            State::ParsingEncoderPosition => {
                if byte == END_SYSEX {
                    if !self.buffer.is_empty() {
                        debug!(
                            "partial encoder report dropped ({} bytes)",
                            self.buffer.len()
                        );
                    }
                    return Some(State::Waiting);
                }
                self.buffer.push(byte);
                if self.buffer.len() < ENCODER_REPORT_LEN {
                    return None;
                }
                let head = self.buffer[0];
                let magnitude = decode_7bit_le(&self.buffer[1..]) as i64;
                let position = if head & ENCODER_DIRECTION_MASK != 0 {
                    -magnitude
                } else {
                    magnitude
                };
                self.publish(EventKind::EncoderPosition {
                    encoder: head & ENCODER_CHANNEL_MASK,
                    position,
                });
                Some(State::ParsingEncoderPosition)
            }
            _ => {
                if byte != END_SYSEX {
                    self.buffer.push(byte);
                    return None;
                }
                self.finish_sysex(state);
                Some(State::Waiting)
            }
        }
    }

    fn on_command(&mut self, byte: u8) -> Option<State> {
        let command = if byte < START_SYSEX { byte & 0xF0 } else { byte };
        match command {
            DIGITAL_MESSAGE => Some(State::ParsingDigital { port: byte & 0x0F }),
            ANALOG_MESSAGE => Some(State::ParsingAnalog {
                channel: byte & 0x0F,
            }),
            REPORT_VERSION => Some(State::ParsingVersion),
            START_SYSEX => Some(State::ParsingSysex),
            SYSTEM_RESET => {
                self.publish(EventKind::SystemReset);
                None
            }
            _ => {
                debug!("unknown command byte {:#04x} skipped", byte);
                self.publish(EventKind::Error {
                    byte,
                    description: format!("unknown command byte {:#04x}", byte),
                });
                None
            }
        }
    }

    fn on_sysex_command(&mut self, command: u8) -> State {
        match command {
            REPORT_FIRMWARE => State::ParsingFirmware,
            EXTENDED_ANALOG => State::ParsingExtendedAnalog,
            CAPABILITY_RESPONSE => State::ParsingCapabilityResponse { pin: 0 },
            ANALOG_MAPPING_RESPONSE => State::ParsingAnalogMapping,
            PIN_STATE_RESPONSE => State::ParsingPinState,
            STRING_DATA => State::ParsingString,
            I2C_REPLY => State::ParsingI2cReply,
            ENCODER_DATA => State::ParsingEncoderPosition,
            c if self.custom_sysex.contains(&c) => State::ParsingCustomSysex { command: c },
            other => {
                warn!("unsupported sysex command {:#04x}", other);
                State::Waiting
            }
        }
    }

    /// Decode a sysex body collected in the buffer.
    fn finish_sysex(&mut self, state: State) {
        let body = std::mem::take(&mut self.buffer);
        let kind = match state {
            State::ParsingFirmware => {
                if body.len() < 2 {
                    debug!("short firmware report ({} bytes)", body.len());
                    None
                } else {
                    Some(EventKind::Firmware(FirmwareInfo {
                        name: decode_two_byte_string(&body[2..]),
                        major: body[0],
                        minor: body[1],
                    }))
                }
            }
            State::ParsingExtendedAnalog => match body.split_first() {
                Some((&pin, value)) => Some(EventKind::AnalogValue {
                    channel: pin,
                    value: decode_7bit_le(value),
                }),
                None => {
                    debug!("empty extended analog message");
                    None
                }
            },
            State::ParsingAnalogMapping => {
                let mapping: BTreeMap<u8, u8> = body
                    .iter()
                    .enumerate()
                    .filter(|&(_, &channel)| channel != NO_ANALOG_CHANNEL)
                    .map(|(pin, &channel)| (channel, pin as u8))
                    .collect();
                Some(EventKind::AnalogMapping(mapping))
            }
            State::ParsingPinState => {
                if body.len() < 2 {
                    debug!("short pin state response ({} bytes)", body.len());
                    None
                } else {
                    Some(EventKind::PinState {
                        pin: body[0],
                        mode: PinMode::from_token(body[1]),
                        value: decode_7bit_le(&body[2..]),
                    })
                }
            }
            State::ParsingString => Some(EventKind::StringMessage {
                text: decode_two_byte_string(&body),
            }),
            State::ParsingI2cReply => {
                let data = unpack_i2c(&body);
                if data.len() < 2 {
                    debug!("short i2c reply ({} bytes)", body.len());
                    None
                } else {
                    Some(EventKind::I2cReply {
                        address: data[0],
                        register: data[1],
                        data: data[2..].to_vec(),
                    })
                }
            }
            State::ParsingCustomSysex { command } => {
                Some(EventKind::CustomSysex { command, data: body.clone() })
            }
            other => {
                warn!("END_SYSEX in unexpected state {:?}", other);
                None
            }
        };
        if let Some(kind) = kind {
            self.publish(kind);
        }
        // hand the allocation back to the machine
        self.buffer = body;
    }
}
