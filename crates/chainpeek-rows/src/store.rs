use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::ops::Bound;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::filter::CellFilter;
use crate::row::{Cell, Row};

/// Which row keys a scan covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyRange {
    #[default]
    All,
    /// Keys starting with the prefix. An empty prefix covers every key.
    Prefix(String),
    /// Keys in `start..end`. An empty `end` is unbounded.
    Range { start: String, end: String },
}

/// A scan request. Filters and limit are applied by the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadRequest {
    pub range: KeyRange,
    /// Maximum number of rows; `None` is unlimited.
    pub limit: Option<usize>,
    pub filter: CellFilter,
}

pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

/// A readable wide-column table.
pub trait RowSource {
    /// Scan rows in key order. Rows left with no cells after filtering are
    /// skipped and do not count toward the limit.
    fn read_rows(&self, request: &ReadRequest) -> Result<RowIter<'_>>;

    /// Fetch one unfiltered row. Fails with [`StoreError::NotFound`] when the
    /// key does not exist.
    fn read_row(&self, key: &str) -> Result<Row>;
}

/// In-memory table ordered by row key.
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    rows: BTreeMap<String, Vec<Cell>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DumpRow {
    key: String,
    #[serde(default)]
    cells: Vec<DumpCell>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DumpCell {
    column: String,
    /// Hex-encoded value, optionally `0x`-prefixed.
    value: String,
    #[serde(default)]
    timestamp: i64,
}

impl MemoryRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON-lines dump: one `{"key", "cells": [{"column", "value",
    /// "timestamp"}]}` object per line. Blank lines are ignored; repeated
    /// keys append their cells.
    pub fn from_dump<R: BufRead>(reader: R) -> Result<Self> {
        let mut source = Self::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let number = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let dump: DumpRow = serde_json::from_str(&line).map_err(|err| {
                StoreError::InvalidDump {
                    line: number,
                    message: err.to_string(),
                }
            })?;
            let mut cells = Vec::with_capacity(dump.cells.len());
            for cell in dump.cells {
                let digits = cell.value.strip_prefix("0x").unwrap_or(&cell.value);
                let value = hex::decode(digits).map_err(|err| StoreError::InvalidDump {
                    line: number,
                    message: format!("column {}: invalid hex value: {err}", cell.column),
                })?;
                cells.push(Cell::new(cell.column, value, cell.timestamp));
            }
            source.insert(Row::new(dump.key, cells));
        }
        debug!(rows = source.len(), "loaded row dump");
        Ok(source)
    }

    /// Write the table in the format read by [`from_dump`](Self::from_dump).
    pub fn write_dump<W: Write>(&self, mut writer: W) -> Result<()> {
        for (key, cells) in &self.rows {
            let dump = DumpRow {
                key: key.clone(),
                cells: cells
                    .iter()
                    .map(|cell| DumpCell {
                        column: cell.column.clone(),
                        value: hex::encode(&cell.value),
                        timestamp: cell.timestamp_micros,
                    })
                    .collect(),
            };
            serde_json::to_writer(&mut writer, &dump).map_err(std::io::Error::from)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Add a row, appending to any cells already stored under its key.
    pub fn insert(&mut self, row: Row) {
        self.rows.entry(row.key).or_default().extend(row.cells);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn keys_in(
        &self,
        range: &KeyRange,
    ) -> Box<dyn Iterator<Item = (&String, &Vec<Cell>)> + '_> {
        match range {
            KeyRange::All => Box::new(self.rows.iter()),
            KeyRange::Prefix(prefix) => {
                let rows = self
                    .rows
                    .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded));
                let prefix = prefix.clone();
                Box::new(rows.take_while(move |(key, _)| key.starts_with(&prefix)))
            }
            KeyRange::Range { start, end } if end.is_empty() => Box::new(
                self.rows
                    .range::<str, _>((Bound::Included(start.as_str()), Bound::Unbounded)),
            ),
            KeyRange::Range { start, end } if start < end => Box::new(self.rows.range::<str, _>((
                Bound::Included(start.as_str()),
                Bound::Excluded(end.as_str()),
            ))),
            KeyRange::Range { .. } => Box::new(std::iter::empty()),
        }
    }
}

impl FromIterator<Row> for MemoryRowSource {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        let mut source = Self::new();
        for row in iter {
            source.insert(row);
        }
        source
    }
}

impl RowSource for MemoryRowSource {
    fn read_rows(&self, request: &ReadRequest) -> Result<RowIter<'_>> {
        let filter = request.filter.clone();
        let rows = self.keys_in(&request.range).filter_map(move |(key, cells)| {
            let cells = filter.apply(cells);
            (!cells.is_empty()).then(|| Ok(Row::new(key.clone(), cells)))
        });
        Ok(match request.limit {
            Some(limit) => Box::new(rows.take(limit)),
            None => Box::new(rows),
        })
    }

    fn read_row(&self, key: &str) -> Result<Row> {
        self.rows
            .get(key)
            .map(|cells| Row::new(key, cells.clone()))
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }
}
