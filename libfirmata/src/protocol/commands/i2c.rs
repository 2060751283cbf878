// libfirmata-rs/libfirmata/src/protocol/commands/i2c.rs

use crate::constants::*;
use crate::protocol::codec::{pack_i2c, split14};
use crate::protocol::frame::Frame;

/// Encode I2C_CONFIG with the read delay in microseconds (14-bit).
pub fn encode_i2c_config(delay_us: u16) -> Vec<u8> {
    Frame::encode_unchecked(I2C_CONFIG, &split14(delay_us as u32))
}

/// Encode an I2C write request.
/// Layout: F0 76 address 00 (data packed two bytes per byte) F7
pub fn encode_i2c_write(address: u8, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(2 + data.len() * 2);
    payload.push(address & 0x7F);
    payload.push(I2C_WRITE);
    payload.extend(pack_i2c(data));
    Frame::encode_unchecked(I2C_REQUEST, &payload)
}

/// Encode an I2C read request. Register 0 means "no register": the board
/// reads straight from the device and echoes register 0 in its reply.
/// Layout: F0 76 address mode [reg_lsb reg_msb] len_lsb len_msb F7
pub fn encode_i2c_read(address: u8, register: u8, length: u16, continuous: bool) -> Vec<u8> {
    let mode = if continuous {
        I2C_READ_CONTINUOUS
    } else {
        I2C_READ
    };
    let mut payload = vec![address & 0x7F, mode];
    if register != 0 {
        payload.extend_from_slice(&split14(register as u32));
    }
    payload.extend_from_slice(&split14(length as u32));
    Frame::encode_unchecked(I2C_REQUEST, &payload)
}

/// Encode the request that stops a continuous read.
pub fn encode_i2c_stop_continuous(address: u8) -> Vec<u8> {
    Frame::encode_unchecked(I2C_REQUEST, &[address & 0x7F, I2C_STOP_READ_CONTINUOUS])
}
