use chainpeek_schema::Protocol;

use crate::splice::SpliceError;

/// Errors raised while decoding a record. All are fatal for the record.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The bytes do not conform to the descriptor's schema.
    #[error("proto unmarshal of {message_type} ({len} bytes): {source}")]
    Deserialize {
        message_type: String,
        len: usize,
        source: prost::DecodeError,
    },

    /// The decoded record could not be rendered.
    #[error("json marshal of {message_type}: {source}")]
    Render {
        message_type: String,
        source: serde_json::Error,
    },

    /// An envelope declares a payload kind with no registered descriptor.
    #[error("unsupported {protocol} payload kind {kind} in {message_type}.{field}")]
    UnsupportedKind {
        protocol: Protocol,
        kind: String,
        message_type: String,
        field: String,
    },

    /// No frame message type is configured in the registry.
    #[error("no frame message type configured in schema registry")]
    MissingFrameType,

    /// A recursion depth outside `0..=u32::MAX` was requested.
    #[error("invalid decoding depth {0} (must be between 0 and {max})", max = u32::MAX)]
    InvalidDepth(i64),

    /// Assembling the rendered document failed.
    #[error(transparent)]
    Splice(#[from] SpliceError),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
