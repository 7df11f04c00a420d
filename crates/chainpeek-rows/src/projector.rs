use chainpeek_decode::{EnvelopeDecoder, RecursionBudget};
use chainpeek_schema::{normalize_column, Protocol, SchemaRegistry, Selector};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ProjectError;
use crate::row::{Cell, Row};
use crate::store::RowIter;

/// Output field holding the row key.
pub const KEY_FIELD: &str = "_key";

/// Output field holding the newest retained cell timestamp (microseconds).
pub const TIMESTAMP_FIELD: &str = "_timestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// `0` leaves every cell opaque; `n` decodes mapped cells and expands
    /// `n - 1` envelope layers below them.
    pub depth: u32,
    pub include_timestamp: bool,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            depth: 1,
            include_timestamp: false,
        }
    }
}

/// Projects rows of one protocol into flat JSON records.
///
/// The record holds [`KEY_FIELD`], then one field per normalized column in
/// order of first appearance, then [`TIMESTAMP_FIELD`] when enabled. A
/// column with several retained versions becomes an array, newest first.
#[derive(Debug, Clone)]
pub struct RowProjector<'r> {
    decoder: EnvelopeDecoder<'r>,
    protocol: Protocol,
    options: ProjectionOptions,
}

impl<'r> RowProjector<'r> {
    pub fn new(
        registry: &'r SchemaRegistry,
        protocol: Protocol,
        options: ProjectionOptions,
    ) -> Self {
        Self::with_decoder(EnvelopeDecoder::new(registry), protocol, options)
    }

    pub fn with_decoder(
        decoder: EnvelopeDecoder<'r>,
        protocol: Protocol,
        options: ProjectionOptions,
    ) -> Self {
        Self {
            decoder,
            protocol,
            options,
        }
    }

    pub fn options(&self) -> &ProjectionOptions {
        &self.options
    }

    /// Project one row. The first cell that fails to decode aborts the row.
    pub fn project(&self, row: &Row) -> Result<Map<String, Value>, ProjectError> {
        let mut columns: Vec<(String, Vec<(i64, Value)>)> = Vec::new();
        for cell in &row.cells {
            let name = normalize_column(&cell.column);
            let value = self.project_cell(&row.key, &name, cell)?;
            match columns.iter_mut().find(|(existing, _)| *existing == name) {
                Some((_, versions)) => versions.push((cell.timestamp_micros, value)),
                None => columns.push((name, vec![(cell.timestamp_micros, value)])),
            }
        }

        let mut record = Map::new();
        record.insert(KEY_FIELD.to_string(), Value::String(row.key.clone()));
        for (name, mut versions) in columns {
            let value = if versions.len() == 1 {
                versions.remove(0).1
            } else {
                versions.sort_by(|a, b| b.0.cmp(&a.0));
                Value::Array(versions.into_iter().map(|(_, value)| value).collect())
            };
            record.insert(name, value);
        }
        if self.options.include_timestamp {
            if let Some(timestamp) = row.newest_timestamp() {
                record.insert(TIMESTAMP_FIELD.to_string(), Value::from(timestamp));
            }
        }

        debug!(key = %row.key, cells = row.cells.len(), "projected row");
        Ok(record)
    }

    /// Project every row of a scan, stopping at the first error.
    pub fn project_rows<'a>(
        &'a self,
        rows: RowIter<'a>,
    ) -> impl Iterator<Item = Result<Map<String, Value>, ProjectError>> + 'a {
        rows.map(move |row| self.project(&row?))
    }

    fn project_cell(&self, key: &str, column: &str, cell: &Cell) -> Result<Value, ProjectError> {
        let Some(budget) = RecursionBudget::new(self.options.depth).descend() else {
            return Ok(opaque_scalar(&cell.value));
        };
        let Some(descriptor) = self
            .decoder
            .registry()
            .resolve(self.protocol, Selector::Column(column))
        else {
            return Ok(opaque_scalar(&cell.value));
        };

        self.decoder
            .decode(self.protocol, &descriptor, &cell.value, budget)
            .map_err(|source| ProjectError::Decode {
                key: key.to_string(),
                column: cell.column.clone(),
                source,
            })
    }
}

/// Raw rendering of an undecoded cell: the text itself when it is UTF-8,
/// otherwise `0x`-prefixed lowercase hex.
pub fn opaque_scalar(value: &[u8]) -> Value {
    match std::str::from_utf8(value) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => Value::String(format!("0x{}", hex::encode(value))),
    }
}
