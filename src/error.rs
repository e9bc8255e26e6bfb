//! Failures surfaced to callers of the sizing engine

use thiserror::Error;

use crate::catalog::CatalogError;

/// Typed failures of a sizing call.
///
/// Catalog misses, missing install references and similar gaps are not
/// errors: they degrade to fallback estimates and show up as advisory notes.
#[derive(Debug, Error)]
pub enum SizingError {
    #[error("invalid sizing request: {reason}")]
    InvalidRequest { reason: String },

    #[error("catalog unavailable")]
    CatalogUnavailable(#[source] CatalogError),
}

impl From<CatalogError> for SizingError {
    fn from(err: CatalogError) -> Self {
        SizingError::CatalogUnavailable(err)
    }
}

impl SizingError {
    /// A quote whose figures do not fit the integer price range.
    pub(crate) fn out_of_range(what: &str) -> Self {
        SizingError::InvalidRequest {
            reason: format!("{what} exceeds the representable price range"),
        }
    }
}
