/// Errors raised while reading or writing a container.
///
/// Every variant is fatal for the whole stream: once framing is lost,
/// subsequent frames cannot be located.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The stream ended inside the fixed header.
    #[error("truncated container header ({got} of {expected} bytes)")]
    Truncated { expected: usize, got: usize },

    /// The header does not start with the "dbin" magic string.
    #[error("invalid container magic (expected \"dbin\")")]
    InvalidMagic,

    /// The header declares a format version this reader does not understand.
    #[error("unsupported dbin format version {0}")]
    UnsupportedFormatVersion(u8),

    /// The header declares a content kind outside the supported set.
    #[error("unsupported dbin content type: {0:?}")]
    UnsupportedContentKind(String),

    /// The header declares a content version this reader does not understand.
    #[error("unsupported dbin content version {0:?}")]
    UnsupportedContentVersion(String),

    /// The stream ended inside a frame length prefix.
    #[error("truncated frame length at offset {offset} ({got} of 4 bytes)")]
    TruncatedLength { offset: u64, got: usize },

    /// The stream ended before a frame's declared length was satisfied.
    #[error("truncated frame at offset {offset}: declared {declared} bytes, got {got}")]
    TruncatedFrame {
        offset: u64,
        declared: usize,
        got: usize,
    },

    /// A frame declares more bytes than the configured maximum.
    #[error("frame at offset {offset} too large ({size} bytes, max {max})")]
    FrameTooLarge { offset: u64, size: usize, max: usize },

    /// An I/O error occurred on the underlying stream.
    #[error("container I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FormatError>;
