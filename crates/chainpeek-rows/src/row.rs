use bytes::Bytes;

/// One versioned value of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Raw column name, as stored (`family:qualifier`).
    pub column: String,
    pub value: Bytes,
    /// Version timestamp in microseconds since the Unix epoch.
    pub timestamp_micros: i64,
}

impl Cell {
    pub fn new(column: impl Into<String>, value: impl Into<Bytes>, timestamp_micros: i64) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            timestamp_micros,
        }
    }
}

/// A row key and its cells, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: String,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(key: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            key: key.into(),
            cells,
        }
    }

    /// Timestamp of the newest cell, if any.
    pub fn newest_timestamp(&self) -> Option<i64> {
        self.cells.iter().map(|cell| cell.timestamp_micros).max()
    }
}
