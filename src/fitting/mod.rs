//! Straight-line fits of phase against frequency.
pub mod error;
pub mod least_squares;
pub mod linear_fit;

pub use error::FittingError;
pub use linear_fit::{fit, par_fit_channels, windowed_time_delay_ns, LinearFitResult};
