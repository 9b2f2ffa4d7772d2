//! Sync-safe integer decoding.
//!
//! ID3v2 stores sizes with only the low 7 bits of each byte in use, so the
//! on-disk bytes can never form an MPEG audio sync pattern. A 4-byte value
//! therefore carries 28 usable bits, most-significant byte first.

/// Decode a big-endian sync-safe integer of any width.
///
/// Each byte contributes its low 7 bits: `[0x00, 0x00, 0x02, 0x01]`
/// decodes to `2 * 128 + 1 = 257`. The high bit of every byte is ignored.
pub fn decode(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &b| (acc << 7) | u32::from(b & 0x7F))
}
