//! Collecting frames into a keyed lookup, with optional early termination.
//!
//! Frames are keyed by their plain id and, for kinds that may repeat with
//! different sub-identities, by a composite key: `TXXX:descriptor`,
//! `SYLT:content-type` and `SYLT:content-type:descriptor`.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use id3flow_codec::Frame;
use tracing::debug;

use crate::error::Result;
use crate::reader::TagReader;

/// Decoded frames keyed by plain or composite id.
///
/// Lookups for keys that never appeared simply return `None`; asking for a
/// frame the tag does not have is not an error.
#[derive(Debug, Clone, Default)]
pub struct FrameMap {
    entries: HashMap<String, Frame>,
}

impl FrameMap {
    /// Look up a frame by plain or composite key.
    pub fn get(&self, key: &str) -> Option<&Frame> {
        self.entries.get(key)
    }

    /// True if a frame was recorded under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of recorded keys. A frame stored under both its plain and
    /// composite key counts twice.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all recorded `(key, frame)` pairs, in no fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Frame)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Lookup keys a frame can satisfy, most general first.
fn candidate_keys(frame: &Frame) -> Vec<String> {
    let id = frame.id().to_string();
    let mut keys = vec![id.clone()];
    if let Some(content_type) = frame.content_type() {
        let typed = format!("{id}:{content_type:02x}");
        keys.push(typed.clone());
        if let Some(descriptor) = frame.descriptor() {
            keys.push(format!("{typed}:{descriptor}"));
        }
    } else if let Some(descriptor) = frame.descriptor() {
        keys.push(format!("{id}:{descriptor}"));
    }
    keys
}

/// Collect only the frames named by `wanted`, stopping as soon as every key
/// has been satisfied.
///
/// Keys that the tag does not contain are simply absent from the result.
/// With an empty `wanted` set nothing is read from the source at all.
pub fn read_frames<R: Read>(mut reader: TagReader<R>, wanted: &[&str]) -> Result<FrameMap> {
    let mut left: HashSet<String> = wanted.iter().map(|key| (*key).to_string()).collect();
    let mut map = FrameMap::default();

    while !left.is_empty() {
        let Some(frame) = reader.next_frame()? else {
            break;
        };
        for key in candidate_keys(&frame) {
            if left.remove(&key) {
                map.entries.insert(key, frame.clone());
            }
        }
    }

    if left.is_empty() {
        debug!(found = map.len(), "all requested frames found, stopping early");
        reader.cancel();
    }
    Ok(map)
}

/// Collect every frame in the tag, keyed by plain id and additionally by
/// `id:descriptor` where a descriptor is present.
pub fn read_all_frames<R: Read>(mut reader: TagReader<R>) -> Result<FrameMap> {
    let mut map = FrameMap::default();
    while let Some(frame) = reader.next_frame()? {
        if let Some(descriptor) = frame.descriptor() {
            let key = format!("{}:{descriptor}", frame.id());
            map.entries.insert(key, frame.clone());
        }
        map.entries.insert(frame.id().to_string(), frame);
    }
    Ok(map)
}

/// [`read_frames`] over a file path.
pub fn read_frames_from_path(path: impl AsRef<Path>, wanted: &[&str]) -> Result<FrameMap> {
    read_frames(TagReader::open(path)?, wanted)
}

/// [`read_all_frames`] over a file path.
pub fn read_all_frames_from_path(path: impl AsRef<Path>) -> Result<FrameMap> {
    read_all_frames(TagReader::open(path)?)
}
