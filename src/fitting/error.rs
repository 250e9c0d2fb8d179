use crate::dataset::DatasetError;
use thiserror::Error;

/// Enum of the possible error variants that may be encountered while fitting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FittingError {
    /// Too few distinct frequencies to define a line
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The significance of a fit could not be evaluated
    #[error("fit statistics: {0}")]
    Statistics(String),

    /// The channel being fitted is unusable
    #[error("{0}")]
    Dataset(#[from] DatasetError),
}
