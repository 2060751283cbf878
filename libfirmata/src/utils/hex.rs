//! Hex formatting for trace logs of wire traffic.

use std::fmt;

/// Lazily formats bytes as spaced lowercase hex, so `trace!` calls pay
/// nothing when the level is disabled.
///
/// Example: `HexBytes(&[0xf0, 0x79, 0xf7])` displays as `"f0 79 f7"`
pub struct HexBytes<'a>(pub &'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self)
    }
}

/// Convert a byte slice to a lowercase hex string with a single space between
/// each byte.
pub fn bytes_to_hex_spaced(bytes: &[u8]) -> String {
    HexBytes(bytes).to_string()
}
