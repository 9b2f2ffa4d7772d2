//! The chunk-driven tag parsing state machine.
//!
//! [`TagParser`] consumes an ID3v2 tag as an arbitrary sequence of byte
//! chunks — any fragmentation, including splits mid-header and mid-frame —
//! and yields decoded frames in on-disk order. Feed bytes with
//! [`TagParser::feed`], then drain with [`TagParser::next_frame`] until it
//! returns `Ok(None)`; [`TagParser::is_done`] tells a stall from the end of
//! the tag.

use bytes::{Buf, BytesMut};
use id3flow_codec::{decode_frame, syncsafe, Frame, FrameId};
use tracing::debug;

use crate::error::Result;
use crate::header::{TagHeader, TAG_HEADER_SIZE};

/// Size of a frame header: id (4) + size (4) + flags (2).
pub const FRAME_HEADER_SIZE: usize = 10;

const FRAME_ID_LEN: usize = 4;

/// Parse phase. `FrameHeader` and `FrameValue` alternate until the declared
/// tag bytes run out.
#[derive(Debug, Clone, Copy)]
enum State {
    Header,
    FrameHeader,
    FrameValue { id: FrameId, len: usize },
    Done,
}

/// Outcome of scanning the rolling buffer for the next frame header.
enum Scan {
    /// A full 10-byte frame header starts at this offset.
    Found { at: usize },
    /// A plausible frame id starts here but the header is still incomplete.
    Partial { at: usize },
    /// No plausible frame id anywhere in the buffer.
    NotFound,
}

/// Locate the next plausible frame header: three uppercase ASCII letters
/// followed by an uppercase letter or digit.
fn scan_frame_header(buf: &[u8]) -> Scan {
    if buf.len() < FRAME_ID_LEN {
        return Scan::NotFound;
    }
    for at in 0..=buf.len() - FRAME_ID_LEN {
        let id = &buf[at..at + FRAME_ID_LEN];
        let shape_ok = id[..3].iter().all(|b| b.is_ascii_uppercase())
            && (id[3].is_ascii_uppercase() || id[3].is_ascii_digit());
        if shape_ok {
            if buf.len() - at < FRAME_HEADER_SIZE {
                return Scan::Partial { at };
            }
            return Scan::Found { at };
        }
    }
    Scan::NotFound
}

/// Incremental ID3v2 tag parser.
///
/// Owns one rolling buffer and the remaining-byte accounting for a single
/// parse; dropped or cancelled parses release everything.
#[derive(Debug)]
pub struct TagParser {
    state: State,
    buf: BytesMut,
    header: Option<TagHeader>,
    /// Total source bytes accepted so far (header included).
    fed: usize,
    /// Total bytes the tag occupies (header + declared size), known once
    /// the header has been parsed. Feeding truncates at this boundary.
    limit: Option<usize>,
}

impl TagParser {
    pub fn new() -> Self {
        Self {
            state: State::Header,
            buf: BytesMut::new(),
            header: None,
            fed: 0,
            limit: None,
        }
    }

    /// The tag header, once parsed.
    pub fn header(&self) -> Option<&TagHeader> {
        self.header.as_ref()
    }

    /// True once the declared tag bytes are exhausted or the parse was
    /// cancelled. Subsequent chunks are ignored.
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Accept one chunk of source bytes. Bytes past the declared end of the
    /// tag (trailing audio data) are discarded.
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.is_done() {
            return;
        }
        let take = match self.limit {
            Some(limit) => chunk.len().min(limit - self.fed),
            None => chunk.len(),
        };
        self.buf.extend_from_slice(&chunk[..take]);
        self.fed += take;
    }

    /// Abandon the parse. Any partially accumulated frame is discarded and
    /// no frame is emitted afterwards.
    pub fn cancel(&mut self) {
        self.state = State::Done;
        self.buf.clear();
    }

    /// Drain the next decoded frame out of the buffered bytes.
    ///
    /// `Ok(None)` means either "need more input" or "tag complete" —
    /// [`is_done`](Self::is_done) disambiguates. Header validation failures
    /// surface here and halt the parse.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            match self.state {
                State::Done => return Ok(None),

                State::Header => {
                    if self.buf.len() < TAG_HEADER_SIZE {
                        return Ok(None);
                    }
                    let header = match TagHeader::parse(&self.buf[..TAG_HEADER_SIZE]) {
                        Ok(header) => header,
                        Err(err) => {
                            self.cancel();
                            return Err(err);
                        }
                    };
                    self.buf.advance(TAG_HEADER_SIZE);

                    // The header does not count against the declared size;
                    // anything already fed beyond the boundary is outside
                    // the tag.
                    let limit = TAG_HEADER_SIZE + header.tag_size as usize;
                    if self.fed > limit {
                        let over = self.fed - limit;
                        self.buf.truncate(self.buf.len().saturating_sub(over));
                        self.fed = limit;
                    }
                    debug!(
                        major = header.major_version,
                        size = header.tag_size,
                        "tag header accepted"
                    );
                    self.limit = Some(limit);
                    self.header = Some(header);
                    self.state = State::FrameHeader;
                }

                State::FrameHeader => {
                    if self.buf.len() < FRAME_HEADER_SIZE {
                        return self.stall();
                    }
                    match scan_frame_header(&self.buf) {
                        Scan::NotFound => {
                            // Keep the last 3 bytes: a valid id may be
                            // split across the chunk boundary.
                            let skip = self.buf.len() - (FRAME_ID_LEN - 1);
                            self.buf.advance(skip);
                            debug!(skipped = skip, "resynchronizing past unrecognized bytes");
                            return self.stall();
                        }
                        Scan::Partial { at } => {
                            if at > 0 {
                                debug!(skipped = at, "resynchronizing past unrecognized bytes");
                            }
                            self.buf.advance(at);
                            return self.stall();
                        }
                        Scan::Found { at } => {
                            if at > 0 {
                                debug!(skipped = at, "resynchronizing past unrecognized bytes");
                            }
                            self.buf.advance(at);
                            let id = FrameId::new([
                                self.buf[0], self.buf[1], self.buf[2], self.buf[3],
                            ]);
                            // ID3v2.3 frame sizes are plain big-endian;
                            // ID3v2.4 made them sync-safe.
                            let len = if self.major_version() == 3 {
                                u32::from_be_bytes(self.buf[4..8].try_into().unwrap())
                            } else {
                                syncsafe::decode(&self.buf[4..8])
                            } as usize;
                            self.buf.advance(FRAME_HEADER_SIZE);
                            self.state = State::FrameValue { id, len };
                        }
                    }
                }

                State::FrameValue { id, len } => {
                    if self.buf.len() < len {
                        return self.stall();
                    }
                    let payload = self.buf.split_to(len).freeze();
                    self.state = State::FrameHeader;
                    let frame = decode_frame(id, payload);
                    debug!(id = %frame.id(), len, "frame decoded");
                    return Ok(Some(frame));
                }
            }
        }
    }

    fn major_version(&self) -> u8 {
        match &self.header {
            Some(header) => header.major_version,
            None => 4,
        }
    }

    /// No further progress is possible with what is buffered. If every
    /// declared tag byte has been fed, the leftover (padding or a truncated
    /// final frame) is dropped and the parse terminates.
    fn stall(&mut self) -> Result<Option<Frame>> {
        if matches!(self.limit, Some(limit) if self.fed == limit) {
            if !self.buf.is_empty() {
                debug!(dropped = self.buf.len(), "dropping bytes after last whole frame");
            }
            self.cancel();
        }
        Ok(None)
    }
}

impl Default for TagParser {
    fn default() -> Self {
        Self::new()
    }
}
