//! Protocol-aware registry of protobuf descriptors for chain payloads.
//!
//! Maps a protocol family plus either a payload-kind enumerant (carried in
//! envelope records) or a store column name to the message descriptor used
//! to deserialize the bytes. The registry is assembled once through
//! [`RegistryBuilder`] and is read-only afterwards.

pub mod builtin;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod mapping;
pub mod protocol;
pub mod registry;
pub mod selector;

pub use config::RegistryConfig;
pub use error::{Result, SchemaError};
pub use protocol::Protocol;
pub use registry::{RegistryBuilder, RegistryEntry, SchemaRegistry};
pub use selector::{normalize_column, Selector, SelectorKind};

/// The schema handle used to deserialize and render a record type.
pub type TypeDescriptor = prost_reflect::MessageDescriptor;
