use std::fmt;

/// What a registry lookup is keyed on, besides the protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    /// Symbolic name of a payload-kind enumerant read from an envelope.
    PayloadKind(&'a str),
    /// A store column name; normalized before lookup.
    Column(&'a str),
}

impl Selector<'_> {
    pub fn kind(&self) -> SelectorKind {
        match self {
            Selector::PayloadKind(_) => SelectorKind::PayloadKind,
            Selector::Column(_) => SelectorKind::Column,
        }
    }
}

impl fmt::Display for Selector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::PayloadKind(kind) => write!(f, "payload kind {kind}"),
            Selector::Column(column) => write!(f, "column {column}"),
        }
    }
}

/// Lookup path of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SelectorKind {
    PayloadKind,
    Column,
}

impl SelectorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectorKind::PayloadKind => "payload_kind",
            SelectorKind::Column => "column",
        }
    }
}

/// Derive an identifier-safe field name from a store column name.
///
/// Column family separators (`:`) and dashes become underscores, so
/// `trxs:trxRefsProto` maps to `trxs_trxRefsProto`.
pub fn normalize_column(column: &str) -> String {
    column
        .chars()
        .map(|c| match c {
            '-' | ':' => '_',
            other => other,
        })
        .collect()
}
