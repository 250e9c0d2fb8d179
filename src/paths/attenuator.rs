//! Removing a test attenuator from measured paths.
use crate::dataset::{Channel, ChannelSet, DatasetError};
use log::info;

type Result<T> = std::result::Result<T, DatasetError>;

/// Subtracts a fixed attenuation from every channel's magnitude. Phase is untouched since
/// every path carried the same attenuator.
pub fn apply_fixed_attenuation(channels: &ChannelSet, attenuation_db: f64) -> Result<ChannelSet> {
    info!("Removing a fixed {attenuation_db} dB attenuator from {} channels", channels.len());
    channels.try_map(|_, channel| -> Result<Channel> {
        let magnitude = channel.magnitude_db()?.iter().map(|m| m - attenuation_db).collect();
        channel.clone().with_magnitude_db(magnitude)
    })
}

/// Subtracts a measured attenuator sweep from every channel, sample by sample.
///
/// # Errors
/// Will return `Err` if a channel is not on the attenuator's frequency axis.
pub fn apply_attenuator_sweep(channels: &ChannelSet, attenuator: &Channel) -> Result<ChannelSet> {
    info!("Removing a measured attenuator from {} channels", channels.len());
    let attenuator_magnitude = attenuator.magnitude_db()?;
    let attenuator_phase = attenuator.phase_deg()?;
    channels.try_map(|name, channel| -> Result<Channel> {
        if let Some(i) = attenuator.axis_mismatch(channel) {
            Err(DatasetError::FrequencyMismatch(format!(
                "{name} and the attenuator differ at index {i}"
            )))?
        }
        let magnitude = channel
            .magnitude_db()?
            .iter()
            .zip(attenuator_magnitude)
            .map(|(m, a)| m - a)
            .collect();
        let phase = channel
            .phase_deg()?
            .iter()
            .zip(attenuator_phase)
            .map(|(p, a)| p - a)
            .collect();
        channel.clone().with_magnitude_db(magnitude)?.with_phase_deg(phase)
    })
}
