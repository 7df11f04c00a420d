use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use prost_reflect::{DescriptorPool, MessageDescriptor};
use prost_types::FileDescriptorProto;
use serde::Serialize;
use tracing::debug;

use crate::builtin;
use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::mapping::MappingDocument;
use crate::protocol::Protocol;
use crate::selector::{normalize_column, Selector, SelectorKind};

#[derive(Debug, Clone, Default)]
struct ProtocolTable {
    payload_kinds: BTreeMap<String, MessageDescriptor>,
    columns: BTreeMap<String, MessageDescriptor>,
}

/// Immutable (protocol, selector) → descriptor lookup table.
///
/// Built through [`RegistryBuilder`]; it exposes no mutation, so one
/// instance can be shared by every decoder and projector of a run.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    pool: DescriptorPool,
    tables: HashMap<Protocol, ProtocolTable>,
    frame_type: Option<MessageDescriptor>,
}

/// One lookup-table row, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub protocol: &'static str,
    pub selector_kind: &'static str,
    pub selector: String,
    pub message: String,
}

impl SchemaRegistry {
    /// The built-in registry: dfuse bstream, deos and deth schemas.
    pub fn builtin() -> Result<Self> {
        Ok(RegistryBuilder::builtin()?.build())
    }

    /// Resolve the descriptor for `selector` within `protocol`.
    ///
    /// `None` is not an error by itself; callers decide whether a missing
    /// descriptor is fatal.
    pub fn resolve(&self, protocol: Protocol, selector: Selector<'_>) -> Option<MessageDescriptor> {
        let table = self.tables.get(&protocol)?;
        match selector {
            Selector::PayloadKind(kind) => table.payload_kinds.get(kind).cloned(),
            Selector::Column(column) => table.columns.get(&normalize_column(column)).cloned(),
        }
    }

    /// Message type every container frame is decoded as, if configured.
    pub fn frame_type(&self) -> Option<&MessageDescriptor> {
        self.frame_type.as_ref()
    }

    /// Look up a message type by exact full name.
    pub fn message(&self, full_name: &str) -> Option<MessageDescriptor> {
        self.pool.get_message_by_name(full_name)
    }

    /// Find a message type from a (partial) name.
    ///
    /// An exact full-name match wins; otherwise the name must be a substring
    /// of exactly one known type.
    pub fn find_message(&self, partial: &str) -> Result<MessageDescriptor> {
        if let Some(exact) = self.pool.get_message_by_name(partial) {
            return Ok(exact);
        }

        let mut found: Option<MessageDescriptor> = None;
        for candidate in self.pool.all_messages() {
            if partial.is_empty() || !candidate.full_name().contains(partial) {
                continue;
            }
            if let Some(first) = &found {
                return Err(SchemaError::AmbiguousType {
                    query: partial.to_string(),
                    first: first.full_name().to_string(),
                    second: candidate.full_name().to_string(),
                });
            }
            found = Some(candidate);
        }

        found.ok_or_else(|| SchemaError::UnknownType {
            query: partial.to_string(),
            known: self.message_names().join(", "),
        })
    }

    /// Full names of every message type in the pool, sorted.
    pub fn message_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .pool
            .all_messages()
            .map(|message| message.full_name().to_string())
            .collect();
        names.sort_unstable();
        names
    }

    /// Every lookup-table row, ordered by protocol, selector kind, then selector.
    pub fn entries(&self) -> Vec<RegistryEntry> {
        let mut entries = Vec::new();
        for protocol in Protocol::ALL {
            let Some(table) = self.tables.get(&protocol) else {
                continue;
            };
            for (kind, map) in [
                (SelectorKind::PayloadKind, &table.payload_kinds),
                (SelectorKind::Column, &table.columns),
            ] {
                for (selector, message) in map {
                    entries.push(RegistryEntry {
                        protocol: protocol.as_str(),
                        selector_kind: kind.as_str(),
                        selector: selector.clone(),
                        message: message.full_name().to_string(),
                    });
                }
            }
        }
        entries
    }
}

/// Assembles a [`SchemaRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    pool: DescriptorPool,
    tables: HashMap<Protocol, ProtocolTable>,
    frame_type: Option<MessageDescriptor>,
    config: RegistryConfig,
}

impl RegistryBuilder {
    /// An empty builder with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// An empty builder with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            pool: DescriptorPool::new(),
            tables: HashMap::new(),
            frame_type: None,
            config,
        }
    }

    /// A builder preloaded with the built-in schemas and mappings.
    pub fn builtin() -> Result<Self> {
        Self::builtin_with_config(RegistryConfig::default())
    }

    /// A builder preloaded with the built-in schemas, with explicit config.
    pub fn builtin_with_config(config: RegistryConfig) -> Result<Self> {
        let mut builder = Self::with_config(config);
        builder.add_files(builtin::file_descriptors())?;
        builder.set_frame_type(builtin::BSTREAM_BLOCK)?;
        for (protocol, kind, message) in builtin::PAYLOAD_KIND_MAPPINGS {
            builder.register_payload_kind(*protocol, kind, message)?;
        }
        for (protocol, column, message) in builtin::COLUMN_MAPPINGS {
            builder.register_column(*protocol, column, message)?;
        }
        Ok(builder)
    }

    /// Add file descriptors to the pool.
    pub fn add_files(
        &mut self,
        files: impl IntoIterator<Item = FileDescriptorProto>,
    ) -> Result<()> {
        self.pool.add_file_descriptor_protos(files)?;
        Ok(())
    }

    /// Add a compiled `FileDescriptorSet` (as produced by `protoc -o`).
    pub fn add_descriptor_set(&mut self, bytes: &[u8]) -> Result<()> {
        self.pool.decode_file_descriptor_set(bytes)?;
        Ok(())
    }

    /// Load a compiled `FileDescriptorSet` from disk.
    pub fn load_descriptor_set(&mut self, path: &Path) -> Result<()> {
        let bytes = read_limited(path, self.config.max_descriptor_set_size)?;
        self.add_descriptor_set(&bytes)?;
        debug!(path = %path.display(), size = bytes.len(), "loaded descriptor set");
        Ok(())
    }

    /// Apply a JSON mapping document.
    pub fn load_mapping(&mut self, json: &str) -> Result<()> {
        let doc = MappingDocument::parse(json)?;
        if let Some(frame_type) = &doc.frame_type {
            self.set_frame_type(frame_type)?;
        }
        for (protocol_name, mapping) in &doc.protocols {
            let protocol: Protocol = protocol_name.parse()?;
            for (kind, message) in &mapping.payload_kinds {
                self.register_payload_kind(protocol, kind, message)?;
            }
            for (column, message) in &mapping.columns {
                self.register_column(protocol, column, message)?;
            }
        }
        Ok(())
    }

    /// Load a JSON mapping document from disk.
    pub fn load_mapping_file(&mut self, path: &Path) -> Result<()> {
        let bytes = read_limited(path, self.config.max_mapping_file_size)?;
        let json = String::from_utf8(bytes).map_err(|err| {
            SchemaError::LoadFailed(format!("{}: not UTF-8: {err}", path.display()))
        })?;
        self.load_mapping(&json)?;
        debug!(path = %path.display(), "loaded schema mapping");
        Ok(())
    }

    /// Set the message type container frames are decoded as.
    pub fn set_frame_type(&mut self, message: &str) -> Result<()> {
        self.frame_type = Some(self.lookup(message)?);
        Ok(())
    }

    /// Map a payload-kind enumerant name to a message type.
    pub fn register_payload_kind(
        &mut self,
        protocol: Protocol,
        kind: &str,
        message: &str,
    ) -> Result<()> {
        let descriptor = self.lookup(message)?;
        self.tables
            .entry(protocol)
            .or_default()
            .payload_kinds
            .insert(kind.to_string(), descriptor);
        Ok(())
    }

    /// Map a column name to a message type. The name is stored normalized.
    pub fn register_column(
        &mut self,
        protocol: Protocol,
        column: &str,
        message: &str,
    ) -> Result<()> {
        let descriptor = self.lookup(message)?;
        self.tables
            .entry(protocol)
            .or_default()
            .columns
            .insert(normalize_column(column), descriptor);
        Ok(())
    }

    /// Freeze the builder into an immutable registry.
    pub fn build(self) -> SchemaRegistry {
        SchemaRegistry {
            pool: self.pool,
            tables: self.tables,
            frame_type: self.frame_type,
        }
    }

    /// Builder configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn lookup(&self, message: &str) -> Result<MessageDescriptor> {
        self.pool
            .get_message_by_name(message)
            .ok_or_else(|| SchemaError::UnknownMessage(message.to_string()))
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn read_limited(path: &Path, max_bytes: usize) -> Result<Vec<u8>> {
    let file = std::fs::File::open(path)
        .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
    let metadata = file
        .metadata()
        .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
    if metadata.len() > max_bytes as u64 {
        return Err(SchemaError::LoadFailed(format!(
            "{} too large ({} bytes, max {max_bytes})",
            path.display(),
            metadata.len()
        )));
    }

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = Vec::new();
    file.take(read_limit)
        .read_to_end(&mut content)
        .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "{} too large while reading",
            path.display()
        )));
    }
    Ok(content)
}
