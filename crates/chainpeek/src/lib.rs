//! Inspector for dbin block containers and protobuf-encoded chain records.
//!
//! chainpeek reads length-framed block containers and wide-column rows and
//! renders every record as JSON, expanding type-tagged envelope payloads up
//! to a caller-chosen depth.
//!
//! # Crate Structure
//!
//! - [`frame`]: dbin container header and frame codec
//! - [`schema`]: protocol-aware descriptor registry
//! - [`decode`]: depth-bounded envelope decoder and JSON splicing
//! - [`rows`]: row projection (behind the `rows` feature)

/// Re-export container types.
pub mod frame {
    pub use chainpeek_frame::*;
}

/// Re-export registry types.
pub mod schema {
    pub use chainpeek_schema::*;
}

/// Re-export decoder types.
pub mod decode {
    pub use chainpeek_decode::*;
}

/// Re-export row projection types (requires `rows` feature).
#[cfg(feature = "rows")]
pub mod rows {
    pub use chainpeek_rows::*;
}
