use std::fmt;
use std::io;

use chainpeek_decode::DecodeError;
use chainpeek_frame::FormatError;
use chainpeek_rows::{ProjectError, StoreError};
use chainpeek_schema::SchemaError;

pub const SUCCESS: i32 = 0;
/// General failure, including a missing row key.
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
/// Malformed container, record, dump or schema input.
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn format_error(context: &str, err: FormatError) -> CliError {
    match err {
        FormatError::Io(source) => io_error(context, source),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    let code = match err {
        SchemaError::LoadFailed(_) => FAILURE,
        SchemaError::UnknownProtocol(_)
        | SchemaError::AmbiguousType { .. }
        | SchemaError::UnknownType { .. } => USAGE,
        SchemaError::InvalidDescriptorSet(_)
        | SchemaError::InvalidMapping(_)
        | SchemaError::UnknownMessage(_) => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn decode_error(context: &str, err: DecodeError) -> CliError {
    let code = match err {
        DecodeError::InvalidDepth(_) | DecodeError::MissingFrameType => USAGE,
        DecodeError::Splice(_) => INTERNAL,
        DecodeError::Deserialize { .. }
        | DecodeError::Render { .. }
        | DecodeError::UnsupportedKind { .. } => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn store_error(context: &str, err: StoreError) -> CliError {
    match err {
        StoreError::Io(source) => io_error(context, source),
        StoreError::NotFound { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        StoreError::InvalidDump { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

pub fn project_error(context: &str, err: ProjectError) -> CliError {
    match err {
        ProjectError::Store(err) => store_error(context, err),
        ProjectError::Decode { source, .. } if matches!(source, DecodeError::Splice(_)) => {
            CliError::new(INTERNAL, format!("{context}: {source}"))
        }
        decode @ ProjectError::Decode { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {decode}"))
        }
    }
}
