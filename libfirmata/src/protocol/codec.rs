// libfirmata-rs/libfirmata/src/protocol/codec.rs

//! Byte packing rules shared by the encoders and the decoder.
//!
//! Firmata data bytes only carry 7 bits. Multi-byte values are split into
//! 7-bit chunks, least significant first. I2C payloads and strings use two
//! wire bytes per logical byte / character.

/// Split the low 14 bits of `value` into (lsb, msb) 7-bit bytes.
pub fn split14(value: u32) -> [u8; 2] {
    [(value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8]
}

/// Join a (lsb, msb) pair into a 14-bit value.
pub fn join14(lsb: u8, msb: u8) -> u32 {
    (lsb as u32 & 0x7F) | ((msb as u32 & 0x7F) << 7)
}

/// Encode `value` as `count` little-endian 7-bit chunks.
pub fn encode_7bit_le(value: u32, count: usize) -> Vec<u8> {
    (0..count)
        .map(|i| {
            let shift = 7 * i as u32;
            if shift >= 32 {
                0
            } else {
                ((value >> shift) & 0x7F) as u8
            }
        })
        .collect()
}

/// Decode little-endian 7-bit chunks. Chunks past the fifth are ignored,
/// higher bits of the fifth are truncated.
pub fn decode_7bit_le(chunks: &[u8]) -> u32 {
    chunks
        .iter()
        .take(5)
        .enumerate()
        .fold(0u32, |acc, (i, &b)| acc | (((b & 0x7F) as u32) << (7 * i as u32)))
}

/// Pack one payload byte into its (lsb, msb) wire pair.
pub fn pack_byte(b: u8) -> [u8; 2] {
    [b & 0x7F, (b >> 7) & 0x7F]
}

/// Rebuild a payload byte from its wire pair. Only bit 0 of `msb` matters.
pub fn unpack_byte(lsb: u8, msb: u8) -> u8 {
    ((msb & 0x01) << 7) | (lsb & 0x7F)
}

/// Two-byte-per-byte packing used by I2C requests.
pub fn pack_i2c(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2);
    for &b in data {
        out.extend_from_slice(&pack_byte(b));
    }
    out
}

/// Inverse of [`pack_i2c`]. A trailing unpaired byte is dropped.
pub fn unpack_i2c(wire: &[u8]) -> Vec<u8> {
    wire.chunks_exact(2)
        .map(|pair| unpack_byte(pair[0], pair[1]))
        .collect()
}

/// Decode a string sent as 14-bit characters (two wire bytes each).
pub fn decode_two_byte_string(wire: &[u8]) -> String {
    wire.chunks_exact(2)
        .map(|pair| char::from_u32(join14(pair[0], pair[1])).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Encode a string's bytes as two wire bytes each, as STRING_DATA expects.
pub fn encode_two_byte_string(text: &str) -> Vec<u8> {
    pack_i2c(text.as_bytes())
}
