//! Path analysis of a whole receiver: from mapping file to array phase difference.
pub mod attenuator;
pub mod difference;
pub mod estimate;
pub mod load;

pub use difference::{array_difference, total_path, PhaseDifference};
pub use estimate::{estimate_interferometer, zero_reference_channel, ESTIMATED_INTF_KEY};
pub use load::{load_channels, LoadedChannels, Measurement};

use crate::dataset::alignment::{interpolate_to_common_range, reduce_to_common_length};
use crate::dataset::combine::combine;
use crate::dataset::phase::UNWRAP_THRESHOLD_DEG;
use crate::dataset::{
    ArrayGroup, Channel, ChannelSet, ATTENUATOR_KEY, COMBINED_INTF_KEY, COMBINED_MAIN_KEY,
};
use crate::error::TdiffError;
use crate::fitting::linear_fit::{
    fit_with_threshold, par_fit_channels_with_threshold, windowed_time_delay_ns,
};
use crate::fitting::LinearFitResult;
use crate::utils::mapping::ChannelMapping;
use attenuator::{apply_attenuator_sweep, apply_fixed_attenuation};
use difference::array_difference_with_threshold;
use indexmap::IndexMap;
use log::{info, warn};
use serde::Serialize;
use std::path::Path;

/// How channels recorded with different sweep settings are brought onto one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentPolicy {
    /// Keep every k-th sample of the longer sweeps
    #[default]
    Decimate,
    /// Interpolate onto the densest sweep over the common band
    Interpolate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathOptions {
    pub measurement: Measurement,
    pub alignment: AlignmentPolicy,
    pub unwrap_threshold_deg: f64,
    /// Without a measured or estimated interferometer, difference against a flat 0 dB, 0°
    /// reference. Transmitter runs need this since interferometer antennas have no
    /// transmitters.
    pub zero_reference: bool,
}
impl PathOptions {
    pub fn new(measurement: Measurement) -> PathOptions {
        PathOptions {
            measurement,
            alignment: AlignmentPolicy::default(),
            unwrap_threshold_deg: UNWRAP_THRESHOLD_DEG,
            zero_reference: false,
        }
    }
}

/// Everything a path analysis produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PathAnalysis {
    pub comment: Option<String>,
    /// Channels the mapping marked as not measured
    pub missing: Vec<String>,
    /// Aligned, attenuator-corrected channels including measured composites
    pub channels: ChannelSet,
    /// Fit of every channel, then of `M_all` and `I_all`
    pub fits: IndexMap<String, LinearFitResult>,
    pub combined_main: Channel,
    pub combined_intf: Channel,
    /// The interferometer composite is a straight-line approximation, not a measurement
    pub estimated_interferometer: bool,
    /// The interferometer composite is the flat zero reference
    pub zero_reference_interferometer: bool,
    /// Difference of the summed arrays
    pub calculated: PhaseDifference,
    /// Difference of the measured composites, when both were measured
    pub measured: Option<PhaseDifference>,
    /// Local group delay of each composite
    pub group_delays_ns: IndexMap<String, Vec<f64>>,
}

/// Runs the full path analysis of the channels `mapping` names below `data_location`.
///
/// Channels are loaded and unwrapped (and converted to one-way when reflection was
/// measured), aligned, corrected for the attenuator, fitted, and summed into the main and
/// interferometer arrays, whose phase difference is the result.
///
/// # Errors
/// Will return `Err` if any file is unusable, the channels cannot be aligned, or an array has
/// no members and neither an estimate nor the zero reference was requested.
pub fn analyse(
    data_location: &Path,
    mapping: &ChannelMapping,
    options: &PathOptions,
) -> Result<PathAnalysis, TdiffError> {
    let threshold = options.unwrap_threshold_deg;
    let loaded = load_channels(data_location, mapping, &options.measurement, threshold)?;

    // the attenuator is aligned with everything else so it can be subtracted by index
    let mut everything = loaded.members.clone();
    for (name, channel) in loaded.composites.iter() {
        everything.insert(name, channel.clone());
    }
    if let Some(attenuator) = &loaded.attenuator {
        everything.insert(ATTENUATOR_KEY, attenuator.clone());
    }
    let mut aligned = match options.alignment {
        AlignmentPolicy::Decimate => reduce_to_common_length(&everything)?,
        AlignmentPolicy::Interpolate => interpolate_to_common_range(&everything)?,
    };
    let attenuator = aligned.remove(ATTENUATOR_KEY);

    let channels = match (attenuator, mapping.attenuation_db) {
        (Some(sweep), fixed) => {
            if let Some(db) = fixed {
                warn!(
                    "Both a fixed {db} dB attenuator and an attenuator sweep given; using the \
                     sweep"
                );
            }
            apply_attenuator_sweep(&aligned, &sweep)?
        }
        (None, Some(db)) => apply_fixed_attenuation(&aligned, db)?,
        (None, None) => aligned,
    };

    let mut fits = par_fit_channels_with_threshold(&channels, threshold)?;

    let combined_main = combine(&channels, |name| ArrayGroup::Main.contains(name))?;
    let main_fit = fit_with_threshold(&combined_main, threshold)?;
    let has_intf = channels.names().any(|name| ArrayGroup::Interferometer.contains(name));
    let estimated_interferometer = !has_intf && !mapping.estimated.is_empty();
    let zero_reference_interferometer =
        !has_intf && !estimated_interferometer && options.zero_reference;
    let combined_intf = if estimated_interferometer {
        estimate_interferometer(combined_main.frequencies(), &main_fit)?
    } else if zero_reference_interferometer {
        zero_reference_channel(combined_main.frequencies())?
    } else {
        combine(&channels, |name| ArrayGroup::Interferometer.contains(name))?
    };
    let intf_fit = fit_with_threshold(&combined_intf, threshold)?;
    info!(
        "{}: time delay {:.3} ns, {}: time delay {:.3} ns{}",
        ArrayGroup::Main.combined_name(),
        main_fit.time_delay_ns,
        ArrayGroup::Interferometer.combined_name(),
        intf_fit.time_delay_ns,
        if estimated_interferometer {
            " (estimated)"
        } else if zero_reference_interferometer {
            " (zero reference)"
        } else {
            ""
        }
    );
    fits.insert(ArrayGroup::Main.combined_name().to_string(), main_fit);
    fits.insert(ArrayGroup::Interferometer.combined_name().to_string(), intf_fit);

    let calculated = array_difference_with_threshold(&combined_main, &combined_intf, threshold)?;
    let measured = match (channels.get(COMBINED_MAIN_KEY), channels.get(COMBINED_INTF_KEY)) {
        (Some(main), Some(intf)) => {
            Some(array_difference_with_threshold(main, intf, threshold)?)
        }
        _ => None,
    };

    let mut group_delays_ns = IndexMap::new();
    for (name, channel) in [
        (ArrayGroup::Main.combined_name(), &combined_main),
        (ArrayGroup::Interferometer.combined_name(), &combined_intf),
    ] {
        let delays = windowed_time_delay_ns(channel.frequencies(), &channel.phase_rad()?)?;
        group_delays_ns.insert(name.to_string(), delays);
    }

    Ok(PathAnalysis {
        comment: mapping.comment.clone(),
        missing: mapping.missing.clone(),
        channels,
        fits,
        combined_main,
        combined_intf,
        estimated_interferometer,
        zero_reference_interferometer,
        calculated,
        measured,
        group_delays_ns,
    })
}

/// Fit figures of one channel in a [`PathSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitSummary {
    pub time_delay_ns: f64,
    pub slope: f64,
    pub intercept: f64,
    pub r_value: f64,
    pub p_value: f64,
    pub std_err: f64,
}
impl From<&LinearFitResult> for FitSummary {
    fn from(fit: &LinearFitResult) -> Self {
        FitSummary {
            time_delay_ns: fit.time_delay_ns,
            slope: fit.slope,
            intercept: fit.intercept,
            r_value: fit.r_value,
            p_value: fit.p_value,
            std_err: fit.std_err,
        }
    }
}

/// The scalar results of a [`PathAnalysis`], as written next to the run's outputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSummary {
    pub radar: String,
    pub comment: Option<String>,
    pub missing: Vec<String>,
    pub estimated_interferometer: bool,
    pub zero_reference_interferometer: bool,
    pub fits: IndexMap<String, FitSummary>,
    pub mean_time_difference_ns: f64,
    pub measured_mean_time_difference_ns: Option<f64>,
}
impl PathAnalysis {
    pub fn summary(&self, radar: &str) -> PathSummary {
        let mean = |d: &PhaseDifference| d.time_ns.iter().sum::<f64>() / d.len() as f64;
        PathSummary {
            radar: radar.to_string(),
            comment: self.comment.clone(),
            missing: self.missing.clone(),
            estimated_interferometer: self.estimated_interferometer,
            zero_reference_interferometer: self.zero_reference_interferometer,
            fits: self
                .fits
                .iter()
                .map(|(name, fit)| (name.clone(), FitSummary::from(fit)))
                .collect(),
            mean_time_difference_ns: mean(&self.calculated),
            measured_mean_time_difference_ns: self.measured.as_ref().map(mean),
        }
    }
}
impl PathSummary {
    /// Writes the summary as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), TdiffError> {
        let file = std::fs::File::create(path).map_err(|source| TdiffError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        info!("Wrote summary to {}", path.display());
        Ok(())
    }
}
