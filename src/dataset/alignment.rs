//! Bringing channels recorded with different sweep settings onto one frequency axis.
use crate::dataset::{Channel, ChannelSet, DatasetError};
use crate::utils::interpolate::interp;
use log::debug;

type Result<T> = std::result::Result<T, DatasetError>;

/// Decimates every channel down to the length of the shortest one.
///
/// Sweeps are often recorded with 200, 400 or 800 points over the same span. Each longer
/// channel keeps every `k`-th sample, where `k` is its length divided by the shortest
/// length, starting from the first offset whose frequencies land exactly on the reference
/// axis. The reference is the shortest channel, ties going to the smallest name.
///
/// # Errors
/// Will return `Err` if a length is not an exact multiple of the shortest length, or if no
/// decimation reproduces the reference frequencies.
pub fn reduce_to_common_length(channels: &ChannelSet) -> Result<ChannelSet> {
    let reference = match channels.shortest() {
        Some(name) => name,
        None => return Ok(channels.clone()),
    };
    debug!("Aligning {} channels to the axis of {reference}", channels.len());
    let axis = channels
        .get(reference)
        .map(|c| c.frequencies().to_vec())
        .unwrap_or_default();
    reduce_to_reference(channels, &axis)
}

/// Decimates every channel onto an explicit reference frequency axis.
pub fn reduce_to_reference(channels: &ChannelSet, reference: &[i64]) -> Result<ChannelSet> {
    if reference.is_empty() {
        Err(DatasetError::FrequencyMismatch(
            "reference frequency axis is empty".to_string(),
        ))?
    }
    channels.try_map(|name, channel| decimate(name, channel, reference))
}

fn decimate(name: &str, channel: &Channel, reference: &[i64]) -> Result<Channel> {
    let indices = decimation_indices(name, channel.frequencies(), reference)?;
    if indices.len() == channel.len() {
        return Ok(channel.clone());
    }
    channel.select(&indices)
}

/// Indices into `freqs` that keep every `k`-th sample so that the kept frequencies equal
/// `reference`.
pub(crate) fn decimation_indices(
    name: &str,
    freqs: &[i64],
    reference: &[i64],
) -> Result<Vec<usize>> {
    let n = reference.len();
    let len = freqs.len();
    if n == 0 || len % n != 0 {
        Err(DatasetError::FrequencyMismatch(format!(
            "{name} has {len} samples, which is not a multiple of the {n}-sample reference axis"
        )))?
    }
    let step = len / n;
    let offset = (0..step)
        .find(|&o| (0..n).all(|i| freqs[o + i * step] == reference[i]))
        .ok_or_else(|| {
            DatasetError::FrequencyMismatch(format!(
                "{name} has {len} samples but no decimation by {step} matches the reference \
                 frequencies"
            ))
        })?;
    if step > 1 {
        debug!("Decimating {name} by {step} from offset {offset}");
    }
    Ok((0..n).map(|i| offset + i * step).collect())
}

/// Interpolates every channel onto the frequencies of the longest channel, trimmed to the
/// band every channel covers.
///
/// Used when sample spacings are not integer multiples of each other. All non-frequency
/// fields are linearly interpolated, so phase should be unwrapped beforehand.
///
/// # Errors
/// Will return `Err` if the channels share no common frequency band.
pub fn interpolate_to_common_range(channels: &ChannelSet) -> Result<ChannelSet> {
    let reference = match channels.longest() {
        Some(name) => name,
        None => return Ok(channels.clone()),
    };
    let latest_start = channels
        .iter()
        .map(|(_, c)| c.frequencies()[0])
        .max()
        .unwrap_or_default();
    let earliest_end = channels
        .iter()
        .map(|(_, c)| c.frequencies()[c.len() - 1])
        .min()
        .unwrap_or_default();
    if latest_start > earliest_end {
        Err(DatasetError::FrequencyMismatch(format!(
            "channels share no frequency band: latest start {latest_start} Hz is above earliest \
             end {earliest_end} Hz"
        )))?
    }
    let axis: Vec<i64> = channels
        .get(reference)
        .map(|c| c.frequencies().to_vec())
        .unwrap_or_default()
        .into_iter()
        .filter(|f| (latest_start..=earliest_end).contains(f))
        .collect();
    if axis.is_empty() {
        Err(DatasetError::FrequencyMismatch(format!(
            "{reference} has no samples between {latest_start} Hz and {earliest_end} Hz"
        )))?
    }
    debug!(
        "Interpolating {} channels onto {} points of {reference} \
         ({latest_start}-{earliest_end} Hz)",
        channels.len(),
        axis.len()
    );
    let targets: Vec<f64> = axis.iter().map(|&f| f as f64).collect();
    channels.try_map(|_, channel| {
        let xs: Vec<f64> = channel.frequencies().iter().map(|&f| f as f64).collect();
        channel.map_columns(axis.clone(), |column| interp(&targets, &xs, column))
    })
}
