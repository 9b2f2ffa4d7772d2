//! Frame records and the per-frame-type content decoder.
//!
//! A frame's 4-character id selects a decoding rule for its payload. The
//! decoder is total: any byte sequence produces *some* frame, degrading to
//! best-effort text or an opaque [`Frame::Unknown`] rather than failing.

use std::fmt;

use bytes::Bytes;

use crate::text::{self, Encoding};

/// A four-character frame identifier (e.g. `TIT2`, `APIC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId([u8; 4]);

impl FrameId {
    /// Wrap four raw id bytes.
    pub fn new(raw: [u8; 4]) -> Self {
        Self(raw)
    }

    /// The id as a string slice. Ids produced by the boundary scanner are
    /// always ASCII; anything else reads back as `????`.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FrameId {
    /// Build an id from the first four bytes of `s`, zero-padded when short.
    fn from(s: &str) -> Self {
        let mut raw = [0u8; 4];
        for (slot, byte) in raw.iter_mut().zip(s.bytes()) {
            *slot = byte;
        }
        Self(raw)
    }
}

/// One timed line of a synchronized-lyrics frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEntry {
    /// Timestamp in the frame's declared format (milliseconds or MPEG
    /// frames); zero when the format declares no timestamp width.
    pub timestamp: u32,
    pub text: String,
}

/// A decoded ID3v2 frame.
///
/// One variant per frame shape: generic text (`T...`), user text (`TXXX`),
/// generic URL (`W...`), user URL (`WXXX`), unsynchronized lyrics (`USLT`),
/// synchronized lyrics (`SYLT`), attached picture (`APIC`), and an opaque
/// fallback for everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text {
        id: FrameId,
        text: String,
    },
    UserText {
        id: FrameId,
        descriptor: String,
        text: String,
    },
    Url {
        id: FrameId,
        url: String,
    },
    UserUrl {
        id: FrameId,
        descriptor: String,
        url: String,
    },
    Lyrics {
        id: FrameId,
        language: String,
        descriptor: String,
        text: String,
    },
    SyncLyrics {
        id: FrameId,
        language: String,
        /// Raw timestamp-format byte; `1` (MPEG frames) and `2`
        /// (milliseconds) carry 4-byte timestamps, anything else none.
        timestamp_format: u8,
        /// Raw content-type byte (`01` = lyrics, etc.).
        content_type: u8,
        descriptor: String,
        entries: Vec<SyncEntry>,
    },
    Picture {
        id: FrameId,
        mime_type: String,
        /// The picture-type byte as two lowercase hex digits; doubles as the
        /// composite-key discriminator for repeated `APIC` frames.
        descriptor: String,
        description: String,
        data: Bytes,
    },
    Unknown {
        id: FrameId,
        data: Bytes,
    },
}

impl Frame {
    /// The frame's identifier.
    pub fn id(&self) -> FrameId {
        match self {
            Frame::Text { id, .. }
            | Frame::UserText { id, .. }
            | Frame::Url { id, .. }
            | Frame::UserUrl { id, .. }
            | Frame::Lyrics { id, .. }
            | Frame::SyncLyrics { id, .. }
            | Frame::Picture { id, .. }
            | Frame::Unknown { id, .. } => *id,
        }
    }

    /// Secondary discriminator for frame kinds that may repeat with
    /// different sub-identities, if this frame carries one.
    pub fn descriptor(&self) -> Option<&str> {
        match self {
            Frame::UserText { descriptor, .. }
            | Frame::UserUrl { descriptor, .. }
            | Frame::Lyrics { descriptor, .. }
            | Frame::SyncLyrics { descriptor, .. }
            | Frame::Picture { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }

    /// The content-type byte of a synchronized-lyrics frame.
    pub fn content_type(&self) -> Option<u8> {
        match self {
            Frame::SyncLyrics { content_type, .. } => Some(*content_type),
            _ => None,
        }
    }

    /// The frame's text, for variants that carry one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Frame::Text { text, .. }
            | Frame::UserText { text, .. }
            | Frame::Lyrics { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The frame's URL, for variants that carry one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Frame::Url { url, .. } | Frame::UserUrl { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Decode a frame payload according to its id.
///
/// Dispatch order: exact `TXXX`/`WXXX`/`USLT`/`SYLT`/`APIC`, then prefix
/// `T*` (generic text) and `W*` (generic URL), else opaque fallback.
pub fn decode_frame(id: FrameId, payload: Bytes) -> Frame {
    match id.as_str() {
        "TXXX" => decode_user_text(id, &payload),
        "WXXX" => decode_user_url(id, &payload),
        "USLT" => decode_lyrics(id, &payload),
        "SYLT" => decode_sync_lyrics(id, &payload),
        "APIC" => decode_picture(id, payload),
        s if s.starts_with('T') => {
            let encoding = frame_encoding(&payload);
            Frame::Text {
                id,
                text: text::decode(tail(&payload, 1), encoding),
            }
        }
        s if s.starts_with('W') => Frame::Url {
            id,
            url: text::decode(&payload, Encoding::Latin1),
        },
        _ => Frame::Unknown { id, data: payload },
    }
}

fn frame_encoding(payload: &[u8]) -> Encoding {
    Encoding::from_marker(payload.first().copied().unwrap_or(0))
}

/// Bytes from `from` to the end, empty when `from` is out of range.
fn tail(payload: &[u8], from: usize) -> &[u8] {
    payload.get(from..).unwrap_or_default()
}

/// Find the first terminator (a run of `width` zero bytes) at a
/// `width`-aligned position at or after `from`.
fn find_terminator(payload: &[u8], from: usize, width: usize) -> Option<usize> {
    let mut at = from;
    while at + width <= payload.len() {
        if payload[at..at + width].iter().all(|&b| b == 0) {
            return Some(at);
        }
        at += width;
    }
    None
}

/// Split a terminated sub-field starting at `from`: the field bytes and the
/// offset just past the terminator. A missing terminator means the rest of
/// the payload is the field.
fn split_terminated(payload: &[u8], from: usize, width: usize) -> (&[u8], usize) {
    let from = from.min(payload.len());
    match find_terminator(payload, from, width) {
        Some(end) => (&payload[from..end], end + width),
        None => (&payload[from..], payload.len()),
    }
}

fn decode_user_text(id: FrameId, payload: &[u8]) -> Frame {
    let encoding = frame_encoding(payload);
    let (descriptor, rest) = split_terminated(payload, 1, encoding.terminator_len());
    Frame::UserText {
        id,
        descriptor: text::decode(descriptor, encoding),
        text: text::decode(tail(payload, rest), encoding),
    }
}

fn decode_user_url(id: FrameId, payload: &[u8]) -> Frame {
    let encoding = frame_encoding(payload);
    let (descriptor, rest) = split_terminated(payload, 1, encoding.terminator_len());
    // The URL itself is always Latin-1, only the descriptor follows the
    // frame's declared encoding.
    Frame::UserUrl {
        id,
        descriptor: text::decode(descriptor, encoding),
        url: text::decode(tail(payload, rest), Encoding::Latin1),
    }
}

fn decode_lyrics(id: FrameId, payload: &[u8]) -> Frame {
    let encoding = frame_encoding(payload);
    let language = text::decode(payload.get(1..4).unwrap_or_default(), Encoding::Latin1);
    let (descriptor, rest) = split_terminated(payload, 4, encoding.terminator_len());
    Frame::Lyrics {
        id,
        language,
        descriptor: text::decode(descriptor, encoding),
        text: text::decode(tail(payload, rest), encoding),
    }
}

fn decode_sync_lyrics(id: FrameId, payload: &[u8]) -> Frame {
    let encoding = frame_encoding(payload);
    let width = encoding.terminator_len();
    let language = text::decode(payload.get(1..4).unwrap_or_default(), Encoding::Latin1);
    let timestamp_format = payload.get(4).copied().unwrap_or(0);
    let content_type = payload.get(5).copied().unwrap_or(0);
    let (descriptor, mut pos) = split_terminated(payload, 6, width);

    // Formats 1 (MPEG frames) and 2 (milliseconds) carry 4-byte big-endian
    // timestamps after each line; other formats carry none.
    let timestamp_width = if timestamp_format == 1 || timestamp_format == 2 {
        4
    } else {
        0
    };

    let mut entries = Vec::new();
    while pos < payload.len() {
        let (line, after_text) = split_terminated(payload, pos, width);
        let timestamp_end = (after_text + timestamp_width).min(payload.len());
        let timestamp = payload[after_text..timestamp_end]
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
        entries.push(SyncEntry {
            timestamp,
            text: text::decode(line, encoding),
        });
        pos = timestamp_end;
    }

    Frame::SyncLyrics {
        id,
        language,
        timestamp_format,
        content_type,
        descriptor: text::decode(descriptor, encoding),
        entries,
    }
}

fn decode_picture(id: FrameId, payload: Bytes) -> Frame {
    let bytes = &payload[..];
    let encoding = frame_encoding(bytes);
    let width = encoding.terminator_len();
    let (mime_type, after_mime) = split_terminated(bytes, 1, width);
    let picture_type = bytes.get(after_mime).copied().unwrap_or(0);
    let (description, data_start) = split_terminated(bytes, after_mime + 1, width);
    Frame::Picture {
        id,
        mime_type: text::decode(mime_type, encoding),
        descriptor: format!("{picture_type:02x}"),
        description: text::decode(description, encoding),
        data: payload.slice(data_start.min(payload.len())..),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: &str, payload: &[u8]) -> Frame {
        decode_frame(FrameId::from(id), Bytes::copy_from_slice(payload))
    }

    #[test]
    fn generic_text_latin1() {
        let f = frame("TIT2", b"\x00I am a title");
        assert_eq!(
            f,
            Frame::Text {
                id: FrameId::from("TIT2"),
                text: "I am a title".into(),
            }
        );
    }

    #[test]
    fn generic_text_utf16_with_bom() {
        let mut payload = vec![1, 0xFE, 0xFF];
        for unit in "über".encode_utf16() {
            payload.extend_from_slice(&unit.to_be_bytes());
        }
        let f = frame("TALB", &payload);
        assert_eq!(f.text(), Some("über"));
    }

    #[test]
    fn user_text_splits_descriptor() {
        let f = frame("TXXX", b"\x00mood\x00calm");
        assert_eq!(
            f,
            Frame::UserText {
                id: FrameId::from("TXXX"),
                descriptor: "mood".into(),
                text: "calm".into(),
            }
        );
    }

    #[test]
    fn user_text_empty_descriptor() {
        let f = frame("TXXX", b"\x00\x00value");
        assert_eq!(f.descriptor(), Some(""));
        assert_eq!(f.text(), Some("value"));
    }

    #[test]
    fn user_text_missing_terminator_takes_rest_as_descriptor() {
        let f = frame("TXXX", b"\x00no-terminator");
        assert_eq!(f.descriptor(), Some("no-terminator"));
        assert_eq!(f.text(), Some(""));
    }

    #[test]
    fn generic_url_has_no_encoding_byte() {
        let f = frame("WOAR", b"https://example.com/artist");
        assert_eq!(f.url(), Some("https://example.com/artist"));
    }

    #[test]
    fn user_url_keeps_url_latin1() {
        let mut payload = vec![1, 0xFE, 0xFF];
        for unit in "läbel".encode_utf16() {
            payload.extend_from_slice(&unit.to_be_bytes());
        }
        payload.extend_from_slice(&[0, 0]);
        payload.extend_from_slice(b"https://example.com");
        let f = frame("WXXX", &payload);
        assert_eq!(f.descriptor(), Some("läbel"));
        assert_eq!(f.url(), Some("https://example.com"));
    }

    #[test]
    fn lyrics_carry_language_code() {
        let f = frame("USLT", b"\x00eng\x00some lyrics here");
        assert_eq!(
            f,
            Frame::Lyrics {
                id: FrameId::from("USLT"),
                language: "eng".into(),
                descriptor: "".into(),
                text: "some lyrics here".into(),
            }
        );
    }

    #[test]
    fn sync_lyrics_with_millisecond_timestamps() {
        let mut payload = vec![0x00]; // Latin-1
        payload.extend_from_slice(b"eng");
        payload.push(0x02); // milliseconds
        payload.push(0x01); // content type: lyrics
        payload.extend_from_slice(b"verse\x00");
        payload.extend_from_slice(b"line one\x00");
        payload.extend_from_slice(&1500u32.to_be_bytes());
        payload.extend_from_slice(b"line two\x00");
        payload.extend_from_slice(&4000u32.to_be_bytes());

        let f = frame("SYLT", &payload);
        match f {
            Frame::SyncLyrics {
                language,
                timestamp_format,
                content_type,
                descriptor,
                entries,
                ..
            } => {
                assert_eq!(language, "eng");
                assert_eq!(timestamp_format, 2);
                assert_eq!(content_type, 1);
                assert_eq!(descriptor, "verse");
                assert_eq!(
                    entries,
                    vec![
                        SyncEntry {
                            timestamp: 1500,
                            text: "line one".into()
                        },
                        SyncEntry {
                            timestamp: 4000,
                            text: "line two".into()
                        },
                    ]
                );
            }
            other => panic!("expected SyncLyrics, got {other:?}"),
        }
    }

    #[test]
    fn sync_lyrics_without_timestamp_width() {
        let mut payload = vec![0x00];
        payload.extend_from_slice(b"eng");
        payload.push(0x00); // unknown format: no timestamp bytes
        payload.push(0x01);
        payload.extend_from_slice(b"\x00"); // empty descriptor
        payload.extend_from_slice(b"a\x00b\x00");

        let f = frame("SYLT", &payload);
        match f {
            Frame::SyncLyrics { entries, .. } => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].timestamp, 0);
                assert_eq!(entries[1].text, "b");
            }
            other => panic!("expected SyncLyrics, got {other:?}"),
        }
    }

    #[test]
    fn sync_lyrics_truncated_trailing_timestamp() {
        let mut payload = vec![0x00];
        payload.extend_from_slice(b"eng");
        payload.push(0x02);
        payload.push(0x01);
        payload.push(0x00);
        payload.extend_from_slice(b"end\x00\x01\x02"); // only 2 of 4 timestamp bytes
        let f = frame("SYLT", &payload);
        match f {
            Frame::SyncLyrics { entries, .. } => {
                assert_eq!(entries, vec![SyncEntry { timestamp: 0x0102, text: "end".into() }]);
            }
            other => panic!("expected SyncLyrics, got {other:?}"),
        }
    }

    #[test]
    fn picture_splits_mime_type_and_description() {
        let mut payload = vec![0x00];
        payload.extend_from_slice(b"image/png\x00");
        payload.push(0x03); // front cover
        payload.extend_from_slice(b"cover art\x00");
        payload.extend_from_slice(&[0x89, b'P', b'N', b'G']);

        let f = frame("APIC", &payload);
        match f {
            Frame::Picture {
                mime_type,
                descriptor,
                description,
                data,
                ..
            } => {
                assert_eq!(mime_type, "image/png");
                assert_eq!(descriptor, "03");
                assert_eq!(description, "cover art");
                assert_eq!(data.as_ref(), &[0x89, b'P', b'N', b'G']);
            }
            other => panic!("expected Picture, got {other:?}"),
        }
    }

    #[test]
    fn picture_with_utf16_description_keeps_image_aligned() {
        let mut payload = vec![0x01];
        payload.extend_from_slice(&[0, 0]); // empty mime (2-byte terminator)
        payload.push(0x04);
        payload.extend_from_slice(&[0xFE, 0xFF, 0x00, b'x', 0x00, 0x00]);
        payload.extend_from_slice(&[0xAB, 0xCD]);

        let f = frame("APIC", &payload);
        match f {
            Frame::Picture {
                descriptor,
                description,
                data,
                ..
            } => {
                assert_eq!(descriptor, "04");
                assert_eq!(description, "x");
                assert_eq!(data.as_ref(), &[0xAB, 0xCD]);
            }
            other => panic!("expected Picture, got {other:?}"),
        }
    }

    #[test]
    fn unknown_id_is_opaque() {
        let f = frame("PCNT", &[0, 0, 0, 9]);
        assert_eq!(
            f,
            Frame::Unknown {
                id: FrameId::from("PCNT"),
                data: Bytes::from_static(&[0, 0, 0, 9]),
            }
        );
        assert_eq!(f.descriptor(), None);
        assert_eq!(f.text(), None);
    }

    #[test]
    fn empty_payload_never_panics() {
        for id in ["TIT2", "TXXX", "WOAR", "WXXX", "USLT", "SYLT", "APIC", "PCNT"] {
            let f = frame(id, &[]);
            assert_eq!(f.id(), FrameId::from(id));
        }
    }
}
