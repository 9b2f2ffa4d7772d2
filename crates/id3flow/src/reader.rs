//! Pull-based frame reading over any `Read` source.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use id3flow_codec::Frame;
use tracing::debug;

use crate::error::Result;
use crate::header::TagHeader;
use crate::parser::TagParser;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads decoded frames from any `Read` stream.
///
/// Handles arbitrary read fragmentation internally — callers always get
/// complete frames, in on-disk order. Also usable as an
/// `Iterator<Item = Result<Frame>>`.
pub struct TagReader<R> {
    inner: R,
    parser: TagParser,
    scratch: Vec<u8>,
    eof: bool,
}

impl TagReader<File> {
    /// Open a file and read the ID3v2 tag at its start. The file is closed
    /// when the reader is dropped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> TagReader<R> {
    /// Create a reader with the default read granularity.
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, READ_CHUNK_SIZE)
    }

    /// Create a reader with explicit read granularity. Small sizes make the
    /// early-termination guarantee tight; mostly useful in tests.
    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            parser: TagParser::new(),
            scratch: vec![0u8; chunk_size.max(1)],
            eof: false,
        }
    }

    /// Read the next decoded frame, or `None` once the tag is exhausted.
    ///
    /// A source that ends before its declared tag size is treated as a
    /// normal end of tag, not an error.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.parser.next_frame()? {
                return Ok(Some(frame));
            }
            if self.parser.is_done() || self.eof {
                return Ok(None);
            }

            let read = match self.inner.read(&mut self.scratch) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };

            if read == 0 {
                debug!("source ended before declared tag size; treating as end of tag");
                self.eof = true;
                return Ok(None);
            }

            self.parser.feed(&self.scratch[..read]);
        }
    }

    /// The tag header, once enough bytes have been read to parse it.
    pub fn header(&self) -> Option<&TagHeader> {
        self.parser.header()
    }

    /// Stop the parse early. No frame is emitted afterwards and no further
    /// bytes are read from the source.
    pub fn cancel(&mut self) {
        self.parser.cancel();
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Iterator for TagReader<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn syncsafe_bytes(value: u32) -> [u8; 4] {
        [
            ((value >> 21) & 0x7F) as u8,
            ((value >> 14) & 0x7F) as u8,
            ((value >> 7) & 0x7F) as u8,
            (value & 0x7F) as u8,
        ]
    }

    fn sample_tag() -> Vec<u8> {
        let mut frames = Vec::new();
        for (id, text) in [("TIT2", "title"), ("TPE1", "artist")] {
            frames.extend_from_slice(id.as_bytes());
            frames.extend_from_slice(&syncsafe_bytes((text.len() + 1) as u32));
            frames.extend_from_slice(&[0, 0, 0]);
            frames.extend_from_slice(text.as_bytes());
        }
        let mut tag = b"ID3\x04\x00\x00".to_vec();
        tag.extend_from_slice(&syncsafe_bytes(frames.len() as u32));
        tag.extend_from_slice(&frames);
        tag
    }

    #[test]
    fn reads_all_frames_from_cursor() {
        let mut reader = TagReader::new(Cursor::new(sample_tag()));
        let first = reader.next_frame().unwrap().unwrap();
        let second = reader.next_frame().unwrap().unwrap();
        assert_eq!(first.text(), Some("title"));
        assert_eq!(second.text(), Some("artist"));
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn byte_by_byte_source_yields_identical_frames() {
        let tag = sample_tag();
        let mut reader = TagReader::with_chunk_size(Cursor::new(tag), 1);
        let frames: Vec<_> = reader.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].text(), Some("title"));
        assert_eq!(frames[1].text(), Some("artist"));
    }

    #[test]
    fn truncated_source_ends_without_error() {
        let mut tag = sample_tag();
        tag.truncate(tag.len() - 3);
        let mut reader = TagReader::new(Cursor::new(tag));
        let first = reader.next_frame().unwrap().unwrap();
        assert_eq!(first.text(), Some("title"));
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn interrupted_read_retries() {
        struct InterruptedOnce {
            fired: bool,
            inner: Cursor<Vec<u8>>,
        }
        impl Read for InterruptedOnce {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if !self.fired {
                    self.fired = true;
                    return Err(std::io::Error::from(ErrorKind::Interrupted));
                }
                self.inner.read(buf)
            }
        }

        let mut reader = TagReader::new(InterruptedOnce {
            fired: false,
            inner: Cursor::new(sample_tag()),
        });
        assert_eq!(reader.next_frame().unwrap().unwrap().text(), Some("title"));
    }

    #[test]
    fn header_is_exposed_after_first_read() {
        let mut reader = TagReader::new(Cursor::new(sample_tag()));
        assert!(reader.header().is_none());
        let _ = reader.next_frame().unwrap();
        let header = reader.header().unwrap();
        assert_eq!(header.major_version, 4);
    }

    #[test]
    fn cancel_stops_iteration() {
        let mut reader = TagReader::with_chunk_size(Cursor::new(sample_tag()), 16);
        let _ = reader.next_frame().unwrap().unwrap();
        reader.cancel();
        assert!(reader.next_frame().unwrap().is_none());
    }
}
