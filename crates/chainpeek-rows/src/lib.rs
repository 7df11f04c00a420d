//! Projection of wide-column rows into flat JSON records.
//!
//! A [`RowSource`] yields [`Row`]s of timestamped [`Cell`]s. The
//! [`RowProjector`] turns each row into one object keyed by normalized
//! column name, decoding cells whose column has a registered schema and
//! passing the rest through as opaque scalars.

pub mod error;
pub mod filter;
pub mod projector;
pub mod row;
pub mod store;

pub use chainpeek_schema::normalize_column;
pub use error::{ProjectError, Result, StoreError};
pub use filter::{CellFilter, TimeRange};
pub use projector::{opaque_scalar, ProjectionOptions, RowProjector, KEY_FIELD, TIMESTAMP_FIELD};
pub use row::{Cell, Row};
pub use store::{KeyRange, MemoryRowSource, ReadRequest, RowIter, RowSource};
