//! The 10-byte tag header.

use id3flow_codec::syncsafe;

use crate::error::{Result, TagError};

/// Size of the tag header: `ID3` + version (2) + flags (1) + size (4).
pub const TAG_HEADER_SIZE: usize = 10;

/// The validated header of an ID3v2 tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    /// Major version; only 3 (ID3v2.3) and 4 (ID3v2.4) are accepted.
    pub major_version: u8,
    /// Revision byte; informational only.
    pub revision: u8,
    /// Declared size of the frame area in bytes, excluding this header and
    /// any footer.
    pub tag_size: u32,
}

impl TagHeader {
    /// Parse the first [`TAG_HEADER_SIZE`] bytes of the tag region.
    ///
    /// The flag byte (offset 5) is read but not interpreted:
    /// unsynchronization and extended headers are a documented limitation.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        debug_assert!(bytes.len() >= TAG_HEADER_SIZE);
        if &bytes[0..3] != b"ID3" {
            return Err(TagError::MissingSignature);
        }
        let major_version = bytes[3];
        let revision = bytes[4];
        if major_version != 3 && major_version != 4 {
            return Err(TagError::UnsupportedVersion {
                major: major_version,
            });
        }
        Ok(Self {
            major_version,
            revision,
            tag_size: syncsafe::decode(&bytes[6..10]),
        })
    }
}
