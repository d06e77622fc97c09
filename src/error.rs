use std::fmt;
use std::path::PathBuf;

/// Failures the HTTP layer maps to specific status codes.
///
/// Everything else travels as a plain `anyhow::Error`.
#[derive(Debug)]
pub enum DataError {
    /// A year's tabular resource is absent on disk.
    ResourceNotFound(PathBuf),
    InvalidYear(u16),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::ResourceNotFound(path) => write!(f, "resource not found: {:?}", path),
            DataError::InvalidYear(year) => write!(
                f,
                "year {} is outside {}..={}",
                year,
                crate::types::FIRST_YEAR,
                crate::types::LAST_YEAR
            ),
        }
    }
}

impl std::error::Error for DataError {}
