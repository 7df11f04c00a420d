/// Errors raised while assembling or querying the schema registry.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A descriptor set or mapping file could not be read.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// The descriptor set is not a valid compiled `FileDescriptorSet`.
    #[error("invalid descriptor set: {0}")]
    InvalidDescriptorSet(#[from] prost_reflect::DescriptorError),

    /// The mapping document is malformed.
    #[error("invalid schema mapping: {0}")]
    InvalidMapping(String),

    /// A mapping names a message type absent from the descriptor pool.
    #[error("unknown message type {0:?}")]
    UnknownMessage(String),

    /// A protocol family name is not recognized.
    #[error("unknown protocol {0:?} (expected one of: EOS, ETH)")]
    UnknownProtocol(String),

    /// A partial type name matches more than one message type.
    #[error("ambiguous type {query:?} ({first:?} or {second:?}?), be more specific")]
    AmbiguousType {
        query: String,
        first: String,
        second: String,
    },

    /// A partial type name matches no message type.
    #[error("type {query:?} doesn't match known types ({known})")]
    UnknownType { query: String, known: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
