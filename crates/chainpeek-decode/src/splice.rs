//! Substitution of a rendered child document into its parent.

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SpliceError {
    #[error("invalid JSON document: {0}")]
    InvalidDocument(#[source] serde_json::Error),

    #[error("cannot splice {path:?}: parent is not an object")]
    NotAnObject { path: String },

    #[error("cannot splice {path:?}: field not present in parent")]
    MissingField { path: String },
}

/// Replace the value at `path` (dot-separated field names) with `child`.
///
/// The field keeps its position among its siblings; nothing else in the
/// parent changes.
pub fn splice(parent: &mut Value, path: &str, child: Value) -> Result<(), SpliceError> {
    let mut current = parent;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get_mut(segment).ok_or_else(|| SpliceError::MissingField {
                path: path.to_string(),
            })?,
            _ => {
                return Err(SpliceError::NotAnObject {
                    path: path.to_string(),
                })
            }
        };
    }
    *current = child;
    Ok(())
}

/// Text-level [`splice`]: both documents are JSON text and the result is
/// compact JSON text.
pub fn splice_json(parent: &str, path: &str, child: &str) -> Result<String, SpliceError> {
    let mut document: Value = serde_json::from_str(parent).map_err(SpliceError::InvalidDocument)?;
    let child: Value = serde_json::from_str(child).map_err(SpliceError::InvalidDocument)?;
    splice(&mut document, path, child)?;
    serde_json::to_string(&document).map_err(SpliceError::InvalidDocument)
}
