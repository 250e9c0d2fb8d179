use crate::dataset::DatasetError;
use crate::fitting::FittingError;
use crate::transmission::TransmissionError;
use crate::utils::mapping::MappingError;
use crate::utils::radar::RadarError;
use crate::utils::vna::VnaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TdiffError {
    /// Channels that cannot be aligned, combined or differenced
    #[error("{0}")]
    Dataset(#[from] DatasetError),

    #[error("{0}")]
    Fitting(#[from] FittingError),

    /// Reflection sweeps that cannot be converted with the chosen cable model
    #[error("{0}")]
    Transmission(#[from] TransmissionError),

    /// Unreadable analyser export
    #[error("{0}")]
    Vna(#[from] VnaError),

    /// Unusable mapping file
    #[error("{0}")]
    Mapping(#[from] MappingError),

    #[error("{0}")]
    Radar(#[from] RadarError),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed time-difference file
    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("cannot write summary: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "python")]
impl From<TdiffError> for pyo3::PyErr {
    fn from(value: TdiffError) -> Self {
        let msg = value.to_string();
        pyo3::exceptions::PyValueError::new_err(msg)
    }
}
