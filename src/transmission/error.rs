use crate::dataset::DatasetError;
use thiserror::Error;

/// Enum of the possible error variants that may be encountered while converting reflection
/// measurements to one-way transmission
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransmissionError {
    /// The cable loss is too large for the measured VSWR; the implied transmitted power
    /// is not positive
    #[error("inconsistent cable model: {0}")]
    InconsistentCableModel(String),

    #[error("invalid VSWR: {0}")]
    InvalidVswr(String),

    #[error("no cable model for '{0}'")]
    UnknownCable(String),

    #[error("{0}")]
    Dataset(#[from] DatasetError),
}
