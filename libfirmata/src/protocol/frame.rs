// libfirmata-rs/libfirmata/src/protocol/frame.rs

use crate::constants::{END_SYSEX, START_SYSEX};
use crate::{Error, Result};

/// Sysex frame helper. Provides encode/decode of the wire frame
/// Format: [START_SYSEX] [command] [payload(n)] [END_SYSEX]
/// Command and payload bytes must be 7-bit.
pub struct Frame {
    pub command: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Minimal sysex frame length: start + command + end
    pub const MIN_LEN: usize = 3;

    /// Encode a command and payload into a sysex frame
    pub fn encode(command: u8, payload: &[u8]) -> Result<Vec<u8>> {
        if command > 0x7F {
            return Err(Error::InvalidArgument(format!(
                "sysex command {:#04x} is not a 7-bit value",
                command
            )));
        }
        if let Some(pos) = payload.iter().position(|&b| b > 0x7F) {
            return Err(Error::InvalidArgument(format!(
                "sysex payload byte {} ({:#04x}) is not a 7-bit value",
                pos, payload[pos]
            )));
        }
        Ok(Self::encode_unchecked(command, payload))
    }

    /// Encode without validating; callers guarantee 7-bit input.
    pub(crate) fn encode_unchecked(command: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(payload.len() + Self::MIN_LEN);
        out.push(START_SYSEX);
        out.push(command);
        out.extend_from_slice(payload);
        out.push(END_SYSEX);
        out
    }

    /// Decode a complete sysex frame
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() < Self::MIN_LEN {
            return Err(Error::InvalidLength {
                expected: Self::MIN_LEN,
                actual: frame.len(),
            });
        }
        if frame[0] != START_SYSEX {
            return Err(Error::FrameFormat("missing START_SYSEX".into()));
        }
        if frame[frame.len() - 1] != END_SYSEX {
            return Err(Error::FrameFormat("missing END_SYSEX".into()));
        }
        let body = &frame[1..frame.len() - 1];
        if body.iter().any(|&b| b > 0x7F) {
            return Err(Error::FrameFormat("command byte inside sysex body".into()));
        }
        Ok(Self {
            command: body[0],
            payload: body[1..].to_vec(),
        })
    }
}
