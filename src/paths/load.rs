//! Reading the channels a mapping file names.
use crate::dataset::phase::unwrap_phase_with_threshold;
use crate::dataset::{Channel, ChannelSet, COMBINED_INTF_KEY, COMBINED_MAIN_KEY};
use crate::error::TdiffError;
use crate::transmission::{reflection_to_transmission_with_threshold, CableModel};
use crate::utils::mapping::ChannelMapping;
use crate::utils::vna::{read_channel, ColumnSpec, MeasurementKind};
use log::{debug, info, warn};
use std::path::Path;

/// How the channels of a run were measured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// S21 sweeps, already one-way
    Transmission,
    /// S11 sweeps of feedlines, converted to one-way with the given cable model
    Reflection(CableModel),
}
impl Measurement {
    pub fn kind(&self) -> MeasurementKind {
        match self {
            Measurement::Transmission => MeasurementKind::Transmission,
            Measurement::Reflection(_) => MeasurementKind::Reflection,
        }
    }
}

/// Unwrapped one-way channels of a run, before alignment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedChannels {
    /// Array members, in mapping order
    pub members: ChannelSet,
    /// Measured composite sweeps under `M_combined` / `I_combined`
    pub composites: ChannelSet,
    pub attenuator: Option<Channel>,
}

/// Reads every file of `mapping` below `data_location`.
///
/// Members and composites are read with the column layout of `measurement`, unwrapped and,
/// for reflection sweeps, converted to one-way transmission. The attenuator is always read
/// as a transmission sweep.
///
/// # Errors
/// Will return `Err` if a named file cannot be read or converted.
pub fn load_channels(
    data_location: &Path,
    mapping: &ChannelMapping,
    measurement: &Measurement,
    threshold_deg: f64,
) -> Result<LoadedChannels, TdiffError> {
    for name in mapping.missing.iter() {
        warn!("{name} was not measured and is skipped");
    }
    let spec = ColumnSpec::for_kind(measurement.kind());
    let load = |name: &str, file: &str| -> Result<Channel, TdiffError> {
        let path = data_location.join(file);
        debug!("Reading {name} from {}", path.display());
        let raw = read_channel(&path, &spec)?;
        let channel = match measurement {
            Measurement::Transmission => raw,
            Measurement::Reflection(cable) => {
                reflection_to_transmission_with_threshold(&raw, cable, threshold_deg)?
            }
        };
        Ok(unwrap_phase_with_threshold(&channel, threshold_deg)?)
    };

    let mut loaded = LoadedChannels::default();
    for (name, file) in mapping.channel_files.iter() {
        loaded.members.insert(name.as_str(), load(name.as_str(), file.as_str())?);
    }
    for (name, file) in [
        (COMBINED_MAIN_KEY, &mapping.combined_main_file),
        (COMBINED_INTF_KEY, &mapping.combined_intf_file),
    ] {
        if let Some(file) = file {
            loaded.composites.insert(name, load(name, file.as_str())?);
        }
    }
    if let Some(file) = &mapping.attenuator_file {
        let path = data_location.join(file);
        debug!("Reading attenuator from {}", path.display());
        let raw = read_channel(&path, &ColumnSpec::transmission())?;
        loaded.attenuator = Some(unwrap_phase_with_threshold(&raw, threshold_deg)?);
    }
    info!(
        "Loaded {} channels and {} composites from {}",
        loaded.members.len(),
        loaded.composites.len(),
        data_location.display()
    );
    Ok(loaded)
}
