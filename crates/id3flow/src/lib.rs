//! Streaming ID3v2 tag parsing for MP3 files.
//!
//! id3flow incrementally parses the ID3v2 tag at the start of an MP3 file,
//! tolerating arbitrary chunk fragmentation from the source. Frames come
//! out in on-disk order, either one at a time or collected into a keyed
//! lookup with early termination once a requested subset has been found.
//!
//! # Crate Structure
//!
//! - [`header`] — the 10-byte tag header (signature, version, sync-safe size)
//! - [`parser`] — the chunk-driven state machine with frame resynchronization
//! - [`reader`] — pull-based frame iteration over any `Read` source
//! - [`collect`] — selective and full frame collection into a [`FrameMap`]
//! - [`codec`] — re-export of the frame-level decoding layer
//!
//! # Example
//!
//! ```no_run
//! use id3flow::read_frames_from_path;
//!
//! let frames = read_frames_from_path("song.mp3", &["TIT2", "TPE1"])?;
//! if let Some(title) = frames.get("TIT2").and_then(|f| f.text()) {
//!     println!("title: {title}");
//! }
//! # Ok::<(), id3flow::TagError>(())
//! ```

pub mod collect;
pub mod error;
pub mod header;
pub mod parser;
pub mod reader;

/// Re-export the frame-level decoding layer.
pub mod codec {
    pub use id3flow_codec::*;
}

pub use collect::{
    read_all_frames, read_all_frames_from_path, read_frames, read_frames_from_path, FrameMap,
};
pub use error::{Result, TagError};
pub use header::{TagHeader, TAG_HEADER_SIZE};
pub use id3flow_codec::{Frame, FrameId, SyncEntry};
pub use parser::{TagParser, FRAME_HEADER_SIZE};
pub use reader::TagReader;
