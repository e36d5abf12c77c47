pub mod case;
pub mod draft;
pub mod query;

use thiserror::Error;

/// Field-level validation failure on one of the records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Blank(&'static str),

    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: String, end: String },

    #[error("at least one business search is required")]
    NoSearches,

    #[error("no search at position {0}")]
    NoSuchSearch(usize),
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank(field));
    }
    Ok(())
}
