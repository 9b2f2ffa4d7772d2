//! Frame-level decoding for ID3v2 tags.
//!
//! This is the leaf layer of id3flow: pure byte-to-record conversion with no
//! I/O and no failure paths. The streaming layer (`id3flow`) locates frame
//! boundaries and hands payloads down to [`decode_frame`].
//!
//! - [`syncsafe`] — the 7-bits-per-byte size encoding
//! - [`text`] — Latin-1/UTF-8/UTF-16 sub-field decoding with BOM sniffing
//! - [`frame`] — the [`Frame`] variant record and per-id decoding rules

pub mod frame;
pub mod syncsafe;
pub mod text;

pub use frame::{decode_frame, Frame, FrameId, SyncEntry};
pub use text::Encoding;
