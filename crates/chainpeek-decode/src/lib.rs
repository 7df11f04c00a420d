//! Depth-bounded recursive decoder for type-tagged protobuf envelopes.
//!
//! An envelope record carries a payload-kind enumerant and the raw bytes of
//! a nested record whose schema depends on that kind. [`EnvelopeDecoder`]
//! deserializes a record, renders it to JSON, and while the
//! [`RecursionBudget`] allows, resolves the nested schema through the
//! registry, decodes the payload, and splices the result in place of the
//! raw bytes.

pub mod budget;
pub mod config;
pub mod decoder;
pub mod error;
pub mod render;
pub mod splice;

pub use budget::RecursionBudget;
pub use config::DecoderConfig;
pub use decoder::EnvelopeDecoder;
pub use error::{DecodeError, Result};
pub use render::RenderPolicy;
pub use splice::{splice, splice_json, SpliceError};
