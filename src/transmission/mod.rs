//! Conversion of feedline reflection (VSWR) sweeps to one-way transmission.
pub mod cable;
pub mod error;

pub use cable::{CableLossModel, CableModel, CableRun, CableType, FixedCableLoss};
pub use error::TransmissionError;

use crate::dataset::phase::{unwrap_phase_with_threshold, wrap_degree, UNWRAP_THRESHOLD_DEG};
use crate::dataset::Channel;
use is_close::is_close;
use log::debug;

type Result<T> = std::result::Result<T, TransmissionError>;

/// One-way magnitude (dB) from the antenna through the mismatch point and the feedline.
///
/// The mismatch is taken to be symmetric, so the power transmitted through it on receive is
/// the power it transmits on the reflection measurement's outbound leg.
///
/// # Errors
/// Will return `Err` if `vswr` is NaN or below 1, or if `cable_loss_db` leaves no power to
/// be transmitted at the mismatch. An infinite VSWR reflects everything, so it always fails
/// the second check.
pub fn vswr_to_one_way_magnitude(vswr: f64, cable_loss_db: f64) -> Result<f64> {
    if vswr.is_nan() || vswr < 1.0 {
        Err(TransmissionError::InvalidVswr(format!(
            "{vswr} is outside [1, inf]"
        )))?
    }
    if is_close!(vswr, 1.0) {
        // perfect match, everything incident is transmitted
        return Ok(-cable_loss_db);
    }
    let return_loss_db = if vswr.is_infinite() {
        0.0
    } else {
        20.0 * ((vswr + 1.0) / (vswr - 1.0)).log10()
    };
    let incident_power = 10f64.powf(-cable_loss_db / 10.0);
    let reflected_db = -return_loss_db + cable_loss_db;
    let reflected_power = 10f64.powf(reflected_db / 10.0);
    let transmitted_power = incident_power - reflected_power;
    if !(transmitted_power > 0.0) {
        Err(TransmissionError::InconsistentCableModel(format!(
            "VSWR {vswr:.5} reflects more power than reaches the mismatch through \
             {cable_loss_db:.3} dB of cable; the cable loss model is too lossy"
        )))?
    }
    let transmission_db = 10.0 * (transmitted_power / incident_power).log10();
    Ok(transmission_db - cable_loss_db)
}

/// Converts a reflection sweep into a one-way transmission sweep.
///
/// Magnitude comes from the VSWR and the cable model at each frequency. Phase is unwrapped,
/// halved, then wrapped again. The VSWR column is kept.
///
/// # Errors
/// Will return `Err` if the channel lacks VSWR or phase, or if any sample fails
/// [`vswr_to_one_way_magnitude`].
pub fn reflection_to_transmission(
    channel: &Channel,
    model: &dyn CableLossModel,
) -> Result<Channel> {
    reflection_to_transmission_with_threshold(channel, model, UNWRAP_THRESHOLD_DEG)
}

pub fn reflection_to_transmission_with_threshold(
    channel: &Channel,
    model: &dyn CableLossModel,
    threshold_deg: f64,
) -> Result<Channel> {
    let vswr = channel.vswr()?;
    let unwrapped = unwrap_phase_with_threshold(channel, threshold_deg)?;

    let magnitude = channel
        .frequencies()
        .iter()
        .zip(vswr.iter())
        .map(|(&f, &v)| {
            let loss = model.loss_db(f);
            vswr_to_one_way_magnitude(v, loss).map_err(|e| match e {
                TransmissionError::InconsistentCableModel(msg) => {
                    TransmissionError::InconsistentCableModel(format!("at {f} Hz: {msg}"))
                }
                TransmissionError::InvalidVswr(msg) => {
                    TransmissionError::InvalidVswr(format!("at {f} Hz: {msg}"))
                }
                other => other,
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    let phase = unwrapped
        .phase_deg()?
        .iter()
        .map(|p| wrap_degree(p / 2.0))
        .collect();
    debug!(
        "Converted {} reflection samples to one-way transmission",
        channel.len()
    );

    Ok(Channel::new(channel.frequencies().to_vec())?
        .with_vswr(vswr.to_vec())?
        .with_magnitude_db(magnitude)?
        .with_phase_deg(phase)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn perfect_match_only_loses_cable() {
        assert_eq!(vswr_to_one_way_magnitude(1.0, 3.6).unwrap(), -3.6);
        assert_eq!(vswr_to_one_way_magnitude(1.0, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn lossless_mismatch_loss() {
        // VSWR 2 reflects |Γ|² = 1/9 of the power
        let expected = 10.0 * (8.0f64 / 9.0).log10();
        let got = vswr_to_one_way_magnitude(2.0, 0.0).unwrap();
        assert_abs_diff_eq!(got, expected, epsilon = 1e-12);
    }

    #[test]
    fn mismatch_and_cable_loss() {
        let got = vswr_to_one_way_magnitude(1.5, 2.0).unwrap();
        assert!(got < -2.0);
        assert!(got > -4.0);
    }

    #[test]
    fn near_total_reflection_is_inconsistent() {
        assert!(matches!(
            vswr_to_one_way_magnitude(1.0e6, 2.0),
            Err(TransmissionError::InconsistentCableModel(_))
        ));
        for loss in [0.0, 2.0, 3.6] {
            assert!(matches!(
                vswr_to_one_way_magnitude(f64::INFINITY, loss),
                Err(TransmissionError::InconsistentCableModel(_))
            ));
        }
    }

    #[test]
    fn vswr_below_one_is_invalid() {
        assert!(matches!(
            vswr_to_one_way_magnitude(0.5, 2.0),
            Err(TransmissionError::InvalidVswr(_))
        ));
        assert!(matches!(
            vswr_to_one_way_magnitude(f64::NAN, 2.0),
            Err(TransmissionError::InvalidVswr(_))
        ));
        assert!(matches!(
            vswr_to_one_way_magnitude(f64::NEG_INFINITY, 0.0),
            Err(TransmissionError::InvalidVswr(_))
        ));
    }

    fn reflection(phase_deg: Vec<f64>, vswr: f64) -> Channel {
        let n = phase_deg.len() as i64;
        Channel::new((0..n).map(|i| 8_000_000 + i * 30_000).collect())
            .unwrap()
            .with_vswr(vec![vswr; n as usize])
            .unwrap()
            .with_phase_deg(phase_deg)
            .unwrap()
    }

    #[test]
    fn halves_unwrapped_phase() {
        // a wrapped ramp falling 20 degrees per sample
        let raw: Vec<f64> = (0..40).map(|i| wrap_degree(-20.0 * i as f64)).collect();
        let converted =
            reflection_to_transmission(&reflection(raw, 1.0), &FixedCableLoss(2.5)).unwrap();
        for (i, p) in converted.phase_deg().unwrap().iter().enumerate() {
            assert_abs_diff_eq!(*p, wrap_degree(-10.0 * i as f64), epsilon = 1e-9);
        }
        assert!(converted.magnitude_db().unwrap().iter().all(|m| *m == -2.5));
        assert_eq!(converted.vswr().unwrap().len(), 40);
    }

    #[test]
    fn needs_vswr() {
        let c = Channel::new(vec![1, 2]).unwrap().with_phase_deg(vec![0.0, 1.0]).unwrap();
        assert!(matches!(
            reflection_to_transmission(&c, &FixedCableLoss(1.0)),
            Err(TransmissionError::Dataset(_))
        ));
    }

    #[test]
    fn reports_frequency_of_inconsistency() {
        let channel = reflection(vec![0.0, 1.0], 1.0e6);
        let err = reflection_to_transmission(&channel, &FixedCableLoss(3.0)).unwrap_err();
        assert!(err.to_string().contains("8000000 Hz"));
    }
}
