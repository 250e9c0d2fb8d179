//! Command-line plumbing shared by the path binaries.
use crate::dataset::phase::UNWRAP_THRESHOLD_DEG;
use crate::error::TdiffError;
use crate::paths::{
    analyse, total_path, AlignmentPolicy, Measurement, PathAnalysis, PathOptions, PhaseDifference,
};
use crate::transmission::{CableModel, CableRun, CableType};
use crate::utils::mapping::ChannelMapping;
use crate::utils::radar::RadarInfo;
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};

/// Value of `time_output_file` that disables the time-difference output.
pub const NO_OUTPUT: &str = "None";

/// Directories under the data location holding each measured part of the signal path.
pub const PATH_DIRECTORIES: [&str; 3] = ["Feedline-Path", "Transmitter-Path", "PM-Path"];
/// Directory the total path is written to.
pub const TOTAL_PATH_DIRECTORY: &str = "Total-Path";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct PathArgs {
    /// Radar name, matched against the radar table (e.g. "Saskatoon")
    #[arg()]
    pub radar_name: String,

    /// Directory holding the measurement files
    #[arg()]
    pub data_location: PathBuf,

    /// Directory the run summary is written to
    #[arg()]
    pub plot_location: PathBuf,

    /// JSON file mapping channel names to measurement files
    #[arg()]
    pub mapping_file: PathBuf,

    /// CSV file for the array time difference, or "None"
    #[arg()]
    pub time_output_file: Option<String>,

    /// Phase jump (degrees) treated as a wrap when unwrapping
    #[arg(long, default_value_t = UNWRAP_THRESHOLD_DEG)]
    pub threshold: f64,

    /// Interpolate onto the densest sweep instead of decimating
    #[arg(long)]
    pub interpolate: bool,

    /// Feedline cable type, overriding the radar's tabulated loss
    #[arg(long, requires = "cable_length")]
    pub cable: Option<String>,

    /// Feedline length in feet, used with --cable
    #[arg(long, requires = "cable")]
    pub cable_length: Option<f64>,

    /// Difference against a flat 0 dB, 0° interferometer when none was measured or estimated
    #[arg(long)]
    pub zero_reference: bool,

    /// The verbosity of the program. The default is to print high-level information.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl PathArgs {
    /// The feedline model: an explicit cable run if given, otherwise the radar's loss.
    pub fn cable_model(&self) -> Result<CableModel, TdiffError> {
        match (&self.cable, self.cable_length) {
            (Some(cable), Some(length_ft)) => {
                let cable: CableType = cable.parse()?;
                Ok(CableModel::Run(CableRun::new(cable, length_ft)))
            }
            _ => Ok(CableModel::Fixed(RadarInfo::from_name(&self.radar_name)?.cable_loss())),
        }
    }

    /// Where the time difference is written, unless disabled.
    pub fn time_output(&self) -> Option<PathBuf> {
        self.time_output_file
            .as_deref()
            .filter(|file| *file != NO_OUTPUT)
            .map(PathBuf::from)
    }

    fn options(&self, measurement: Measurement) -> PathOptions {
        PathOptions {
            measurement,
            alignment: if self.interpolate {
                AlignmentPolicy::Interpolate
            } else {
                AlignmentPolicy::Decimate
            },
            unwrap_threshold_deg: self.threshold,
            zero_reference: self.zero_reference,
        }
    }
}

/// Runs a path analysis for a binary and writes its outputs.
///
/// Reflection runs convert with [`PathArgs::cable_model`]. The summary goes to
/// `plot_location` and the calculated time difference to `time_output_file`.
pub fn run_paths(args: &PathArgs, reflection: bool) -> Result<PathAnalysis, TdiffError> {
    info!(
        "{}: analysing {} with {}",
        args.radar_name,
        args.data_location.display(),
        args.mapping_file.display()
    );
    let measurement = if reflection {
        let cable = args.cable_model()?;
        info!("Feedline model: {cable}");
        Measurement::Reflection(cable)
    } else {
        Measurement::Transmission
    };
    let mapping = ChannelMapping::from_file(&args.mapping_file)?;
    if let Some(comment) = &mapping.comment {
        info!("{comment}");
    }
    let analysis = analyse(&args.data_location, &mapping, &args.options(measurement))?;
    if !analysis.missing.is_empty() {
        info!("Missing data: {}", analysis.missing.join(", "));
    }

    let stem = args
        .mapping_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "paths".to_string());
    create_dir(&args.plot_location)?;
    analysis
        .summary(&args.radar_name)
        .write_json(&args.plot_location.join(format!("{} {stem}.json", args.radar_name)))?;
    if let Some(path) = args.time_output() {
        analysis.calculated.write_csv(&path)?;
    }
    Ok(analysis)
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct TotalPathArgs {
    /// Radar name, used to name the output
    #[arg()]
    pub radar_name: String,

    /// Directory holding the Feedline-Path, Transmitter-Path and PM-Path directories
    #[arg()]
    pub data_location: PathBuf,

    /// Name of the time-difference file inside each path directory
    #[arg()]
    pub path_file: String,

    /// The verbosity of the program. The default is to print high-level information.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

/// Sums the time differences of every part of the signal path and writes the total.
pub fn run_total_path(args: &TotalPathArgs) -> Result<PhaseDifference, TdiffError> {
    let paths = PATH_DIRECTORIES
        .iter()
        .map(|dir| PhaseDifference::read_csv(&args.data_location.join(dir).join(&args.path_file)))
        .collect::<Result<Vec<_>, _>>()?;
    let total = total_path(&paths)?;
    let out_dir = args.data_location.join(TOTAL_PATH_DIRECTORY);
    create_dir(&out_dir)?;
    total.write_csv(&out_dir.join(format!("{} total-path.csv", args.radar_name)))?;
    Ok(total)
}

fn create_dir(path: &Path) -> Result<(), TdiffError> {
    std::fs::create_dir_all(path).map_err(|source| TdiffError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Activate a logger. All log messages are put onto `stdout`. Source code lines are
/// displayed in log messages when verbosity >= 3.
pub fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positionals_and_flags() {
        let args = PathArgs::parse_from([
            "feedline_paths",
            "Saskatoon",
            "data/",
            "plots/",
            "mapping.json",
            "None",
            "--threshold",
            "320",
            "-vv",
        ]);
        assert_eq!(args.radar_name, "Saskatoon");
        assert_eq!(args.time_output(), None);
        assert_eq!(args.threshold, 320.0);
        assert_eq!(args.verbosity, 2);
        assert!(!args.interpolate);
        assert!(!args.zero_reference);
        assert_eq!(
            args.cable_model().unwrap(),
            CableModel::Fixed(crate::transmission::FixedCableLoss(3.6))
        );
    }

    #[test]
    fn explicit_cable_overrides_radar() {
        let args = PathArgs::parse_from([
            "feedline_paths",
            "Nowhere",
            "data/",
            "plots/",
            "mapping.json",
            "out.csv",
            "--cable",
            "LMR400",
            "--cable-length",
            "600",
        ]);
        assert_eq!(args.time_output(), Some(PathBuf::from("out.csv")));
        assert_eq!(
            args.cable_model().unwrap(),
            CableModel::Run(CableRun::new(CableType::Lmr400, 600.0))
        );
        assert!(PathArgs::try_parse_from(["x", "a", "b", "c", "d", "--cable", "LMR400"]).is_err());
    }
}
