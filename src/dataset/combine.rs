//! Phasor summation of antenna channels into an array response.
use crate::dataset::phase::unwrap_phase;
use crate::dataset::{Channel, ChannelSet, DatasetError};
use is_close::is_close;
use itertools::izip;
use log::{debug, trace};
use std::f64::consts::TAU;

type Result<T> = std::result::Result<T, DatasetError>;

/// Sums the channels whose names satisfy `group` into one array channel.
///
/// Every member is treated as a voltage phasor referenced to a unit incident amplitude.
/// Members are folded in name order, starting from the smallest name, and the result's
/// phase is unwrapped afterwards since each fold returns a principal value.
///
/// # Errors
/// Will return `Err` if no channel matches `group`, if the members do not share one
/// frequency axis, or if a member lacks magnitude or phase.
pub fn combine<P>(channels: &ChannelSet, group: P) -> Result<Channel>
where
    P: Fn(&str) -> bool,
{
    let mut members: Vec<(&str, &Channel)> =
        channels.iter().filter(|(name, _)| group(name)).collect();
    members.sort_by(|(a, _), (b, _)| a.cmp(b));

    let (reference_name, reference) = match members.first() {
        Some(&first) => first,
        None => Err(DatasetError::EmptyGroup(format!(
            "none of [{}] selected",
            channels.names().collect::<Vec<_>>().join(", ")
        )))?,
    };
    for (name, channel) in members.iter() {
        if let Some(i) = reference.axis_mismatch(channel) {
            Err(DatasetError::FrequencyMismatch(format!(
                "{name} and {reference_name} differ at index {i} ({:?} Hz vs {:?} Hz)",
                channel.frequencies().get(i),
                reference.frequencies().get(i)
            )))?
        }
    }
    debug!(
        "Combining {} channels: {}",
        members.len(),
        members.iter().map(|(n, _)| *n).collect::<Vec<_>>().join(", ")
    );

    let mut magnitude = reference.magnitude_db()?.to_vec();
    let mut phase = reference.phase_rad()?;
    for (name, channel) in members.iter().skip(1) {
        trace!("Adding {name} into {reference_name}");
        let other_magnitude = channel.magnitude_db()?;
        let other_phase = channel.phase_rad()?;
        for (mag, ph, &mag2, &ph2) in izip!(
            magnitude.iter_mut(),
            phase.iter_mut(),
            other_magnitude.iter(),
            other_phase.iter()
        ) {
            (*mag, *ph) = add_phasors(*mag, *ph, mag2, ph2);
        }
    }

    let combined = Channel::new(reference.frequencies().to_vec())?
        .with_magnitude_db(magnitude)?
        .with_phase_rad(phase)?;
    unwrap_phase(&combined)
}

/// Adds two phasors given as (dB, radians), returning the sum in the same form.
///
/// Phases are negated before and after the sum to follow the cos(x - A) reference
/// convention the historical tdiff results were produced with.
pub fn add_phasors(
    magnitude_1_db: f64,
    phase_1_rad: f64,
    magnitude_2_db: f64,
    phase_2_rad: f64,
) -> (f64, f64) {
    let phase_1 = -phase_1_rad.rem_euclid(TAU);
    let phase_2 = -phase_2_rad.rem_euclid(TAU);

    // voltage amplitudes
    let amplitude_1 = 10f64.powf(magnitude_1_db / 20.0);
    let amplitude_2 = 10f64.powf(magnitude_2_db / 20.0);

    let amplitude_squared = amplitude_1 * amplitude_1
        + amplitude_2 * amplitude_2
        + 2.0 * amplitude_1 * amplitude_2 * (phase_1 - phase_2).cos();
    let combined_amplitude = if amplitude_squared <= 0.0 || is_close!(amplitude_squared, 0.0) {
        0.0
    } else {
        amplitude_squared.sqrt()
    };
    let combined_phase = (amplitude_1 * phase_1.sin() + amplitude_2 * phase_2.sin())
        .atan2(amplitude_1 * phase_1.cos() + amplitude_2 * phase_2.cos());

    (20.0 * combined_amplitude.log10(), -combined_phase)
}
