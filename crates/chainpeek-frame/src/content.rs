//! Supported container content kinds.

use std::fmt;

/// The closed set of content kinds a container may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// EOSIO blocks wrapped in bstream envelopes.
    Eos,
    /// Ethereum blocks wrapped in bstream envelopes.
    Eth,
}

impl ContentKind {
    /// All supported kinds, in header-code order.
    pub const ALL: [ContentKind; 2] = [ContentKind::Eos, ContentKind::Eth];

    /// The 3-byte code written in the container header.
    pub fn code(self) -> &'static str {
        match self {
            ContentKind::Eos => "EOS",
            ContentKind::Eth => "ETH",
        }
    }

    /// Resolve a header code. Matching is exact, as written on disk.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
