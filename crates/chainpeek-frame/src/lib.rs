//! Streaming reader and writer for length-framed `dbin` containers.
//!
//! A container starts with a fixed 10-byte header:
//! - A 4-byte magic string ("dbin")
//! - A 1-byte format version (only `1` is understood)
//! - A 3-byte ASCII content kind (`EOS`, `ETH`)
//! - A 2-byte ASCII decimal content version (only `01` is understood)
//!
//! It is followed by any number of frames, each a 4-byte big-endian length
//! and that many opaque payload bytes, terminated by the end of the stream.

pub mod codec;
pub mod content;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_header, encode_frame, encode_header, ContainerHeader, Frame, FrameConfig,
    CONTENT_VERSION, DEFAULT_MAX_FRAME_SIZE, FORMAT_VERSION, HEADER_SIZE, LENGTH_PREFIX_SIZE,
    MAGIC,
};
pub use content::ContentKind;
pub use error::{FormatError, Result};
pub use reader::ContainerReader;
pub use writer::ContainerWriter;
