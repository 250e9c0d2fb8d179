//! Phase and time differences between the two arrays.
use crate::dataset::alignment::decimation_indices;
use crate::dataset::phase::{unwrap_degrees_with_threshold, wrap_degree, UNWRAP_THRESHOLD_DEG};
use crate::dataset::{Channel, DatasetError};
use crate::error::TdiffError;
use crate::utils::constants::{DEGREES_PER_CYCLE, NS_PER_S};
use itertools::izip;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Phase (degrees) of the main array relative to the interferometer array, and the time
/// offset it represents at each frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseDifference {
    pub frequency_hz: Vec<i64>,
    pub phase_deg: Vec<f64>,
    pub time_ns: Vec<f64>,
}

/// One row of a time-difference file.
#[derive(Debug, Serialize, Deserialize)]
struct TimeRow {
    freq: i64,
    phase_deg: f64,
    time_ns: f64,
}

/// Time offset in ns equivalent to `phase_deg` at `frequency_hz`.
pub fn phase_to_time_ns(phase_deg: f64, frequency_hz: i64) -> f64 {
    phase_deg * NS_PER_S / (frequency_hz as f64 * DEGREES_PER_CYCLE)
}

impl PhaseDifference {
    /// Builds a difference from phases, deriving the times.
    pub fn from_phase(frequency_hz: Vec<i64>, phase_deg: Vec<f64>) -> PhaseDifference {
        let time_ns = frequency_hz
            .iter()
            .zip(phase_deg.iter())
            .map(|(&f, &p)| phase_to_time_ns(p, f))
            .collect();
        PhaseDifference {
            frequency_hz,
            phase_deg,
            time_ns,
        }
    }

    pub fn len(&self) -> usize {
        self.frequency_hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency_hz.is_empty()
    }

    /// Writes `freq,phase_deg,time_ns` rows with a header line.
    pub fn write_csv(&self, path: &Path) -> Result<(), TdiffError> {
        let mut wtr = csv::Writer::from_path(path)?;
        let rows = izip!(&self.frequency_hz, &self.phase_deg, &self.time_ns);
        for (&freq, &phase_deg, &time_ns) in rows {
            wtr.serialize(TimeRow {
                freq,
                phase_deg,
                time_ns,
            })?;
        }
        wtr.flush().map_err(|source| TdiffError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!("Wrote {} time differences to {}", self.len(), path.display());
        Ok(())
    }

    /// Reads a file written by [`PhaseDifference::write_csv`].
    pub fn read_csv(path: &Path) -> Result<PhaseDifference, TdiffError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        let mut diff = PhaseDifference {
            frequency_hz: vec![],
            phase_deg: vec![],
            time_ns: vec![],
        };
        for result in rdr.deserialize() {
            let row: TimeRow = result?;
            diff.frequency_hz.push(row.freq);
            diff.phase_deg.push(row.phase_deg);
            diff.time_ns.push(row.time_ns);
        }
        debug!("Read {} time differences from {}", diff.len(), path.display());
        Ok(diff)
    }
}

/// Difference of two array responses: `main - intf`, wrapped then unwrapped.
///
/// # Errors
/// Will return `Err` if the arrays do not share a frequency axis or lack phase.
pub fn array_difference(main: &Channel, intf: &Channel) -> Result<PhaseDifference, DatasetError> {
    array_difference_with_threshold(main, intf, UNWRAP_THRESHOLD_DEG)
}

pub fn array_difference_with_threshold(
    main: &Channel,
    intf: &Channel,
    threshold_deg: f64,
) -> Result<PhaseDifference, DatasetError> {
    if let Some(i) = main.axis_mismatch(intf) {
        Err(DatasetError::FrequencyMismatch(format!(
            "main and interferometer arrays differ at index {i} ({:?} Hz vs {:?} Hz)",
            main.frequencies().get(i),
            intf.frequencies().get(i)
        )))?
    }
    let wrapped: Vec<f64> = main
        .phase_deg()?
        .iter()
        .zip(intf.phase_deg()?)
        .map(|(m, i)| wrap_degree(m - i))
        .collect();
    let phase = unwrap_degrees_with_threshold(&wrapped, threshold_deg);
    Ok(PhaseDifference::from_phase(main.frequencies().to_vec(), phase))
}

/// Sums several path differences, such as feedline, transmitter and phasing matrix, into
/// the difference of the whole signal path.
///
/// Paths are first decimated onto a common frequency axis. Phases and times add.
///
/// # Errors
/// Will return `Err` if no paths are given or they cannot be aligned.
pub fn total_path(paths: &[PhaseDifference]) -> Result<PhaseDifference, DatasetError> {
    let reference = paths
        .iter()
        .min_by_key(|p| p.len())
        .ok_or_else(|| DatasetError::EmptyGroup("no path differences to sum".to_string()))?;
    let frequency_hz = reference.frequency_hz.clone();
    let mut phase_deg = vec![0.0; frequency_hz.len()];
    let mut time_ns = vec![0.0; frequency_hz.len()];
    for (i, path) in paths.iter().enumerate() {
        let indices = decimation_indices(&format!("path {i}"), &path.frequency_hz, &frequency_hz)?;
        for (tp, tt, &j) in izip!(phase_deg.iter_mut(), time_ns.iter_mut(), &indices) {
            *tp += path.phase_deg[j];
            *tt += path.time_ns[j];
        }
    }
    debug!("Summed {} paths over {} frequencies", paths.len(), frequency_hz.len());
    Ok(PhaseDifference {
        frequency_hz,
        phase_deg,
        time_ns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn array(phase_deg: impl Fn(f64) -> f64) -> Channel {
        let freqs: Vec<i64> = (0..41).map(|i| 8_000_000 + i * 300_000).collect();
        let phase = freqs.iter().map(|&f| phase_deg(f as f64 * 1e-6)).collect();
        Channel::new(freqs)
            .unwrap()
            .with_magnitude_db(vec![0.0; 41])
            .unwrap()
            .with_phase_deg(phase)
            .unwrap()
    }

    #[test]
    fn constant_offset() {
        let main = array(|mhz| 10.0 * mhz);
        let intf = array(|mhz| 10.0 * mhz + 5.0);
        let diff = array_difference(&main, &intf).unwrap();
        for (f, p, t) in izip!(&diff.frequency_hz, &diff.phase_deg, &diff.time_ns) {
            assert_abs_diff_eq!(*p, -5.0, epsilon = 1e-9);
            assert_abs_diff_eq!(*t, -5.0 * 1e9 / (*f as f64 * 360.0), epsilon = 1e-9);
        }
    }

    #[test]
    fn difference_is_continuous() {
        // the arrays drift apart by 30 degrees per MHz
        let main = array(|mhz| wrap_degree(40.0 * mhz));
        let intf = array(|mhz| wrap_degree(10.0 * mhz));
        let diff = array_difference(&main, &intf).unwrap();
        for pair in diff.phase_deg.windows(2) {
            assert_abs_diff_eq!(pair[1] - pair[0], 9.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn mismatched_axes() {
        let main = array(|mhz| mhz);
        let intf = Channel::new(vec![1, 2]).unwrap().with_phase_deg(vec![0.0, 0.0]).unwrap();
        assert!(matches!(
            array_difference(&main, &intf),
            Err(DatasetError::FrequencyMismatch(_))
        ));
    }

    #[test]
    fn totals_add_after_alignment() {
        let a = PhaseDifference::from_phase(vec![10, 20, 30, 40], vec![1.0, 2.0, 3.0, 4.0]);
        let b = PhaseDifference::from_phase(vec![10, 30], vec![10.0, 30.0]);
        let total = total_path(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(total.frequency_hz, vec![10, 30]);
        assert_eq!(total.phase_deg, vec![11.0, 33.0]);
        assert_abs_diff_eq!(total.time_ns[1], a.time_ns[2] + b.time_ns[1], epsilon = 1e-12);
        assert!(total_path(&[]).is_err());
    }

    #[test]
    fn totals_keep_stored_times() {
        // times read back from a file need not match the phase at every frequency
        let mut fine = PhaseDifference::from_phase(vec![10, 15, 20, 25], vec![1.0; 4]);
        fine.time_ns = vec![-3.0, 7.5, -12.25, 99.0];
        let coarse = PhaseDifference::from_phase(vec![15, 25], vec![2.0, 2.0]);
        let total = total_path(&[fine, coarse.clone()]).unwrap();
        assert_eq!(total.frequency_hz, vec![15, 25]);
        assert_eq!(total.phase_deg, vec![3.0, 3.0]);
        assert_eq!(total.time_ns, vec![7.5 + coarse.time_ns[0], 99.0 + coarse.time_ns[1]]);

        let uneven = PhaseDifference::from_phase(vec![10, 20, 30], vec![0.0; 3]);
        assert!(matches!(
            total_path(&[uneven, coarse]),
            Err(DatasetError::FrequencyMismatch(_))
        ));
    }

    #[test]
    fn csv_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("time.csv");
        let diff = PhaseDifference::from_phase(vec![8_000_000, 8_030_000], vec![-5.0, -5.25]);
        diff.write_csv(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("freq,phase_deg,time_ns"));
        assert!(text.contains("8000000,-5.0,"));
        assert_eq!(PhaseDifference::read_csv(&path).unwrap(), diff);
    }
}
