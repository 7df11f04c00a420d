//! JSON mapping documents that extend the registry's lookup tables.
//!
//! ```json
//! {
//!   "frame_type": "dfuse.bstream.v1.Block",
//!   "protocols": {
//!     "EOS": {
//!       "payload_kinds": { "EOS": "dfuse.codecs.deos.Block" },
//!       "columns": { "block:proto": "dfuse.codecs.deos.Block" }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{Result, SchemaError};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingDocument {
    /// Message type every container frame is decoded as.
    #[serde(default)]
    pub frame_type: Option<String>,
    /// Per-protocol tables, keyed by protocol name.
    #[serde(default)]
    pub protocols: BTreeMap<String, ProtocolMapping>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolMapping {
    #[serde(default)]
    pub payload_kinds: BTreeMap<String, String>,
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

impl MappingDocument {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| SchemaError::InvalidMapping(err.to_string()))
    }
}
