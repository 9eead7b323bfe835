use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Malformed input: {0}")]
    MalformedInput(Malformed),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Geocode simulation failed: {0}")]
    GeocodeSimulation(#[source] GeocodeFault),

    #[error("Config: {0}")]
    Config(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, PrepError>;

/// Why an input file could not be turned into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    Empty,
    Parse(String),
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Malformed::Empty => write!(f, "empty"),
            Malformed::Parse(detail) => write!(f, "parse error: {detail}"),
        }
    }
}

/// Underlying cause of a [`PrepError::GeocodeSimulation`].
#[derive(Error, Debug)]
pub enum GeocodeFault {
    #[error("invalid zone weights: {0}")]
    InvalidWeights(String),

    #[error("weighted sampler: {0}")]
    Sampler(#[from] rand::distributions::WeightedError),

    #[error("assembling coordinate columns: {0}")]
    Frame(#[from] polars::error::PolarsError),
}

impl From<GeocodeFault> for PrepError {
    fn from(fault: GeocodeFault) -> Self {
        PrepError::GeocodeSimulation(fault)
    }
}

#[cfg(feature = "python")]
mod py {
    use pyo3::exceptions::{PyFileNotFoundError, PyKeyError, PyRuntimeError, PyValueError};
    use pyo3::PyErr;

    use super::PrepError;

    impl From<PrepError> for PyErr {
        fn from(err: PrepError) -> PyErr {
            let message = err.to_string();
            match err {
                PrepError::NotFound(_) => PyFileNotFoundError::new_err(message),
                PrepError::MalformedInput(_) => PyValueError::new_err(message),
                PrepError::MissingColumn(_) => PyKeyError::new_err(message),
                _ => PyRuntimeError::new_err(message),
            }
        }
    }
}
