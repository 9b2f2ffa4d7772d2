/// Errors surfaced while parsing an ID3v2 tag.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    /// The first three bytes of the source are not the `ID3` signature.
    #[error("no ID3v2 tag signature at start of stream")]
    MissingSignature,

    /// The tag's major version is not 3 or 4.
    #[error("ID3v2.{major} is not supported (expected 2.3 or 2.4)")]
    UnsupportedVersion { major: u8 },

    /// An I/O error occurred while reading from the source.
    #[error("tag I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TagError>;
