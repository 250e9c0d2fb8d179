//! Approximating an interferometer array that was never measured.
use crate::dataset::{Channel, DatasetError};
use crate::fitting::LinearFitResult;
use log::warn;

/// Key of the synthesised interferometer channel.
pub const ESTIMATED_INTF_KEY: &str = "I_estimated";

/// Builds an interferometer response from the main array's phase fit.
///
/// The result is a straight-line phase `slope·f + intercept` with 0 dB magnitude on
/// `frequency_hz`. It is an extrapolation, not a measurement, and differences taken against
/// it only show how far the main array departs from a pure delay.
///
/// # Errors
/// Will return `Err` if `frequency_hz` is not a valid channel axis.
pub fn estimate_interferometer(
    frequency_hz: &[i64],
    main_fit: &LinearFitResult,
) -> Result<Channel, DatasetError> {
    warn!(
        "Approximating the interferometer array as a pure delay of {:.3} ns; it was not measured",
        main_fit.time_delay_ns
    );
    let phase_rad = frequency_hz
        .iter()
        .map(|&f| main_fit.slope * f as f64 + main_fit.intercept)
        .collect();
    Channel::new(frequency_hz.to_vec())?
        .with_magnitude_db(vec![0.0; frequency_hz.len()])?
        .with_phase_rad(phase_rad)
}

/// A flat 0 dB, 0° response on `frequency_hz`, standing in for an interferometer array that
/// has no path to measure, such as one without transmitters.
///
/// # Errors
/// Will return `Err` if `frequency_hz` is not a valid channel axis.
pub fn zero_reference_channel(frequency_hz: &[i64]) -> Result<Channel, DatasetError> {
    warn!("No interferometer path; differencing against a flat zero reference");
    Channel::new(frequency_hz.to_vec())?
        .with_magnitude_db(vec![0.0; frequency_hz.len()])?
        .with_phase_deg(vec![0.0; frequency_hz.len()])
}
