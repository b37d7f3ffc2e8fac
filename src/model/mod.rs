pub mod attendance;
pub mod event;
pub mod od_request;
pub mod role;
pub mod user;

use thiserror::Error;

/// Raised when a stored row cannot be turned back into a domain value.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown value in column {column}: {source}")]
    UnknownValue {
        column: &'static str,
        #[source]
        source: strum::ParseError,
    },

    #[error("column {column} is missing for a {kind} record")]
    MissingColumn {
        column: &'static str,
        kind: &'static str,
    },

    #[error("column {column} is out of range: {value}")]
    OutOfRange { column: &'static str, value: i64 },
}

pub(crate) fn parse_column<T>(column: &'static str, value: &str) -> Result<T, ModelError>
where
    T: std::str::FromStr<Err = strum::ParseError>,
{
    value
        .parse()
        .map_err(|source| ModelError::UnknownValue { column, source })
}

pub(crate) fn require_column<T>(
    column: &'static str,
    kind: &'static str,
    value: Option<T>,
) -> Result<T, ModelError> {
    value.ok_or(ModelError::MissingColumn { column, kind })
}

pub(crate) fn count_column(column: &'static str, value: i64) -> Result<u32, ModelError> {
    u32::try_from(value).map_err(|_| ModelError::OutOfRange { column, value })
}
