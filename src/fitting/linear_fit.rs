use crate::dataset::phase::{unwrap_phase_with_threshold, wrap_radian, UNWRAP_THRESHOLD_DEG};
use crate::dataset::{Channel, ChannelSet};
use crate::fitting::error::FittingError;
use crate::fitting::least_squares::LeastSquares;
use indexmap::IndexMap;
use log::{debug, info};
use rayon::prelude::*;
use std::f64::consts::TAU;

type Result<T> = std::result::Result<T, FittingError>;

/// Half-width of the sliding window used for local group delay.
const DELAY_WINDOW_HALF_WIDTH: usize = 3;

/// Straight-line model of phase (radians) against frequency (Hz) for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFitResult {
    /// rad/Hz
    pub slope: f64,
    /// rad
    pub intercept: f64,
    pub r_value: f64,
    pub p_value: f64,
    pub std_err: f64,
    /// Group delay implied by the slope, in ns
    pub time_delay_ns: f64,
    /// Fitted line at each frequency, wrapped to (-π, π]
    pub best_fit_curve: Vec<f64>,
    /// Measured minus fitted phase at each frequency, wrapped to (-π, π]
    pub residuals: Vec<f64>,
}

/// Fits a line to the phase of `channel`.
///
/// The phase is unwrapped first, which leaves an already continuous channel untouched.
///
/// # Errors
/// Will return `Err` if the channel has no phase or fewer than 2 samples.
pub fn fit(channel: &Channel) -> Result<LinearFitResult> {
    fit_with_threshold(channel, UNWRAP_THRESHOLD_DEG)
}

pub fn fit_with_threshold(channel: &Channel, threshold_deg: f64) -> Result<LinearFitResult> {
    let unwrapped = unwrap_phase_with_threshold(channel, threshold_deg)?;
    let phase_rad = unwrapped.phase_rad()?;
    let freqs: Vec<f64> = unwrapped.frequencies().iter().map(|&f| f as f64).collect();

    let lsq = LeastSquares::two_parameter_line_fit(&freqs, &phase_rad)?;

    let fitted: Vec<f64> = freqs.iter().map(|f| lsq.slope * f + lsq.intercept).collect();
    let residuals = phase_rad
        .iter()
        .zip(fitted.iter())
        .map(|(p, b)| wrap_radian(p - b))
        .collect();
    let best_fit_curve = fitted.into_iter().map(wrap_radian).collect();

    Ok(LinearFitResult {
        slope: lsq.slope,
        intercept: lsq.intercept,
        r_value: lsq.r_value,
        p_value: lsq.p_value,
        std_err: lsq.std_err,
        time_delay_ns: delay_from_slope_ns(lsq.slope),
        best_fit_curve,
        residuals,
    })
}

/// Converts a phase slope in rad/Hz to a delay in ns, resolved to 10 ps.
pub fn delay_from_slope_ns(slope_rad_per_hz: f64) -> f64 {
    round_to_decimals(slope_rad_per_hz / TAU, 11) * -1e9
}

fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Local group delay in ns at every frequency.
///
/// Each point uses a least-squares slope of phase against angular frequency over a window of
/// up to 7 samples centred on it, clipped at the ends of the sweep.
///
/// # Errors
/// Will return `Err` if the inputs differ in length or hold fewer than 2 points.
pub fn windowed_time_delay_ns(freqs: &[i64], phase_rad: &[f64]) -> Result<Vec<f64>> {
    if freqs.len() != phase_rad.len() {
        Err(FittingError::InsufficientData(format!(
            "{} frequencies but {} phases",
            freqs.len(),
            phase_rad.len()
        )))?
    }
    let n = freqs.len();
    if n < 2 {
        Err(FittingError::InsufficientData(format!(
            "a local slope needs at least 2 points, got {n}"
        )))?
    }
    let angular: Vec<f64> = freqs.iter().map(|&f| f as f64 * TAU).collect();
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(DELAY_WINDOW_HALF_WIDTH);
            let end = (i + DELAY_WINDOW_HALF_WIDTH + 1).min(n);
            let lsq = LeastSquares::two_parameter_line_fit(
                &angular[start..end],
                &phase_rad[start..end],
            )?;
            Ok(lsq.slope * -1e9)
        })
        .collect()
}

/// Fits every channel of `channels` in parallel, keeping the set's order.
///
/// # Errors
/// Will return the first error in channel order if any fit fails.
pub fn par_fit_channels(channels: &ChannelSet) -> Result<IndexMap<String, LinearFitResult>> {
    par_fit_channels_with_threshold(channels, UNWRAP_THRESHOLD_DEG)
}

pub fn par_fit_channels_with_threshold(
    channels: &ChannelSet,
    threshold_deg: f64,
) -> Result<IndexMap<String, LinearFitResult>> {
    let members: Vec<(&str, &Channel)> = channels.iter().collect();
    debug!("Fitting {} channels", members.len());

    // Fit the channels!
    let results: Vec<(String, Result<LinearFitResult>)> = members
        .par_iter()
        .map(|(name, channel)| (name.to_string(), fit_with_threshold(channel, threshold_deg)))
        .collect();

    let mut fits = IndexMap::new();
    for (name, res) in results {
        match res {
            Ok(x) => {
                info!("{name}: time delay {:.3} ns (r = {:.5})", x.time_delay_ns, x.r_value);
                fits.insert(name, x);
            }
            Err(e) => Err(e)?,
        }
    }
    Ok(fits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetError;
    use approx::assert_abs_diff_eq;

    fn line(slope_rad_per_hz: f64, intercept: f64) -> Channel {
        let freqs: Vec<i64> = (0..100).map(|i| 8_000_000 + i * 100_000).collect();
        let phase: Vec<f64> = freqs
            .iter()
            .map(|&f| slope_rad_per_hz * f as f64 + intercept)
            .collect();
        Channel::new(freqs).unwrap().with_phase_rad(phase).unwrap()
    }

    #[test]
    fn recovers_exact_line() {
        // 20 ns of delay
        let slope = -TAU * 20e-9;
        let result = fit(&line(slope, 0.5)).unwrap();
        assert_abs_diff_eq!(result.slope, slope, epsilon = 1e-15);
        assert_abs_diff_eq!(result.intercept, 0.5, epsilon = 1e-6);
        assert_eq!(result.time_delay_ns, delay_from_slope_ns(result.slope));
        assert_abs_diff_eq!(result.time_delay_ns, 20.0, epsilon = 1e-6);
        for r in result.residuals.iter() {
            assert_abs_diff_eq!(*r, 0.0, epsilon = 1e-6);
        }
        assert!(result
            .best_fit_curve
            .iter()
            .all(|p| *p > -std::f64::consts::PI && *p <= std::f64::consts::PI));
    }

    #[test]
    fn fits_wrapped_input() {
        let slope = -TAU * 35e-9;
        let wrapped = crate::dataset::phase::wrap_phase(&line(slope, 0.0)).unwrap();
        let result = fit(&wrapped).unwrap();
        assert_abs_diff_eq!(result.time_delay_ns, 35.0, epsilon = 1e-6);
    }

    #[test]
    fn delay_is_rounded_to_ten_picoseconds() {
        let slope = -TAU * 12.345_678e-9;
        assert_abs_diff_eq!(delay_from_slope_ns(slope), 12.35, epsilon = 1e-9);
    }

    #[test]
    fn single_sample_is_insufficient() {
        let c = Channel::new(vec![10_000_000])
            .unwrap()
            .with_phase_deg(vec![1.0])
            .unwrap();
        assert!(matches!(fit(&c), Err(FittingError::InsufficientData(_))));
    }

    #[test]
    fn missing_phase_is_reported() {
        let c = Channel::new(vec![1, 2, 3]).unwrap();
        assert!(matches!(
            fit(&c),
            Err(FittingError::Dataset(DatasetError::InvalidChannelShape(_)))
        ));
    }

    #[test]
    fn windowed_delay_of_a_line_is_constant() {
        let slope = -TAU * 20e-9;
        let c = line(slope, 0.0);
        let delays = windowed_time_delay_ns(c.frequencies(), &c.phase_rad().unwrap()).unwrap();
        assert_eq!(delays.len(), c.len());
        for d in delays {
            assert_abs_diff_eq!(d, 20.0, epsilon = 1e-5);
        }
        assert!(windowed_time_delay_ns(&[1], &[0.0]).is_err());
        assert_eq!(windowed_time_delay_ns(&[1, 2], &[0.0, 1.0]).unwrap().len(), 2);
    }

    #[test]
    fn parallel_fits_keep_order() {
        let mut set = ChannelSet::new();
        set.insert("M3", line(-TAU * 3e-9, 0.0));
        set.insert("M0", line(-TAU * 1e-9, 0.0));
        set.insert("I1", line(-TAU * 2e-9, 0.0));
        let fits = par_fit_channels(&set).unwrap();
        assert_eq!(fits.keys().collect::<Vec<_>>(), vec!["M3", "M0", "I1"]);
        assert_abs_diff_eq!(fits["M3"].time_delay_ns, 3.0, epsilon = 1e-6);

        set.insert("M9", Channel::new(vec![1, 2]).unwrap());
        assert!(par_fit_channels(&set).is_err());
    }
}
