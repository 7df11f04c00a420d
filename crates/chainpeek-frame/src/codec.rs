use bytes::{BufMut, Bytes, BytesMut};

use crate::content::ContentKind;
use crate::error::{FormatError, Result};

/// Container header: magic (4) + format version (1) + kind (3) + content version (2).
pub const HEADER_SIZE: usize = 10;

/// Frame length prefix: 4-byte big-endian u32.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Magic bytes: "dbin".
pub const MAGIC: [u8; 4] = *b"dbin";

/// The only container format version this crate understands.
pub const FORMAT_VERSION: u8 = 1;

/// The only content version this crate understands.
pub const CONTENT_VERSION: u8 = 1;

/// Default maximum frame size: 128 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 128 * 1024 * 1024;

/// Container-level metadata, read once before any frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub format_version: u8,
    pub content_kind: ContentKind,
    pub content_version: u8,
}

impl ContainerHeader {
    /// Header for the current format and content version.
    pub fn new(content_kind: ContentKind) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            content_kind,
            content_version: CONTENT_VERSION,
        }
    }
}

/// One opaque frame payload.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Byte offset of the frame's length prefix within the stream.
    pub offset: u64,
    /// The frame payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(offset: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            offset,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (length prefix + payload).
    pub fn wire_size(&self) -> usize {
        LENGTH_PREFIX_SIZE + self.payload.len()
    }
}

/// Encode a container header.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────┬──────────────┬─────────────────┐
/// │ Magic (4B)   │ Format   │ Kind (3B)    │ Content version │
/// │ "dbin"       │ (1B) = 1 │ "EOS"/"ETH"  │ (2B ASCII) "01" │
/// └──────────────┴──────────┴──────────────┴─────────────────┘
/// ```
pub fn encode_header(header: &ContainerHeader, dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE);
    dst.put_slice(&MAGIC);
    dst.put_u8(header.format_version);
    dst.put_slice(header.content_kind.code().as_bytes());
    dst.put_slice(format!("{:02}", header.content_version % 100).as_bytes());
}

/// Decode and validate a container header.
///
/// Rejects anything but format version 1, content version 1, and a
/// supported content kind.
pub fn decode_header(src: &[u8]) -> Result<ContainerHeader> {
    if src.len() < HEADER_SIZE {
        return Err(FormatError::Truncated {
            expected: HEADER_SIZE,
            got: src.len(),
        });
    }

    if src[0..4] != MAGIC {
        return Err(FormatError::InvalidMagic);
    }

    let format_version = src[4];
    if format_version != FORMAT_VERSION {
        return Err(FormatError::UnsupportedFormatVersion(format_version));
    }

    let kind_code = String::from_utf8_lossy(&src[5..8]);
    let content_kind = ContentKind::from_code(&kind_code)
        .ok_or_else(|| FormatError::UnsupportedContentKind(kind_code.to_string()))?;

    let version_text = String::from_utf8_lossy(&src[8..10]);
    let content_version = version_text
        .parse::<u8>()
        .ok()
        .filter(|version| *version == CONTENT_VERSION)
        .ok_or_else(|| FormatError::UnsupportedContentVersion(version_text.to_string()))?;

    Ok(ContainerHeader {
        format_version,
        content_kind,
        content_version,
    })
}

/// Encode one frame into the wire format.
///
/// ```text
/// ┌──────────────────┬─────────────────────┐
/// │ Length (4B BE)   │ Payload (Length B)  │
/// └──────────────────┴─────────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let length = u32::try_from(payload.len()).map_err(|_| FormatError::FrameTooLarge {
        offset: 0,
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(LENGTH_PREFIX_SIZE + payload.len());
    dst.put_u32(length);
    dst.put_slice(payload);
    Ok(())
}

/// Configuration for container reading and writing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum frame size in bytes. Default: 128 MiB.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}
