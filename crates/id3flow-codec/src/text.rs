//! Text decoding for ID3v2 frame sub-fields.
//!
//! Frames that carry text start with a one-byte encoding marker. Decoding is
//! total: malformed sequences degrade to replacement characters, never to an
//! error.

/// Text encoding selected by a frame's leading marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// ISO-8859-1, marker byte `0`. Also the fallback for unknown markers.
    Latin1,
    /// UTF-16 with a byte-order mark, marker byte `1`. Without a BOM the
    /// payload is read as big-endian.
    Utf16,
    /// UTF-16 big-endian without a BOM, marker byte `2`.
    Utf16Be,
    /// UTF-8, marker byte `3`.
    Utf8,
}

impl Encoding {
    /// Map a frame's encoding marker byte to an encoding.
    pub fn from_marker(byte: u8) -> Self {
        match byte {
            1 => Encoding::Utf16,
            2 => Encoding::Utf16Be,
            3 => Encoding::Utf8,
            _ => Encoding::Latin1,
        }
    }

    /// Width of the string terminator for this encoding: one zero byte for
    /// single-byte charsets, two for the UTF-16 family.
    pub fn terminator_len(self) -> usize {
        match self {
            Encoding::Latin1 | Encoding::Utf8 => 1,
            Encoding::Utf16 | Encoding::Utf16Be => 2,
        }
    }
}

/// Decode a byte range as `encoding`. Never fails; empty input yields an
/// empty string and an odd trailing byte of UTF-16 input is dropped.
pub fn decode(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        Encoding::Utf16Be => decode_utf16(bytes, true),
        Encoding::Utf16 => match bytes {
            [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, true),
            [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, false),
            _ => decode_utf16(bytes, true),
        },
    }
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            if big_endian {
                u16::from_be_bytes(pair)
            } else {
                u16::from_le_bytes(pair)
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}
