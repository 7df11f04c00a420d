use std::fmt;
use std::str::FromStr;

use chainpeek_frame::ContentKind;

use crate::error::SchemaError;

/// Protocol family a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Protocol {
    Eos,
    Eth,
}

impl Protocol {
    pub const ALL: [Protocol; 2] = [Protocol::Eos, Protocol::Eth];

    /// Canonical upper-case name, as used in containers and mappings.
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Eos => "EOS",
            Protocol::Eth => "ETH",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|protocol| protocol.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SchemaError::UnknownProtocol(s.to_string()))
    }
}

impl From<ContentKind> for Protocol {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Eos => Protocol::Eos,
            ContentKind::Eth => Protocol::Eth,
        }
    }
}
