use thiserror::Error;

/// Errors raised while building, aligning or combining channels.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    /// A channel is missing a field, or its columns do not line up
    #[error("invalid channel shape: {0}")]
    InvalidChannelShape(String),

    /// Two channels that must share a frequency axis do not
    #[error("frequency mismatch: {0}")]
    FrequencyMismatch(String),

    /// No channel of the set belongs to the requested group
    #[error("no channels in group {0}")]
    EmptyGroup(String),
}
