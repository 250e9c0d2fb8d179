//! Reading sweeps exported by a vector network analyser.
//!
//! Exports start with a free-form preamble, then a header row whose first cell begins with
//! `Freq. [Hz`, then one sample per row. A row may repeat several sweeps side by side:
//!
//! ```text
//! Freq. [Hz],VSWR,Phase [],,Freq. [Hz],Phase [],VSWR,,...
//! 8000000,1.57760946277922,-77.9415435791016,,8000000,-77.9415435791016,1.57760946277922,,...
//! ```
//!
//! Only the first sweep whose columns sit together is read.
use crate::dataset::{Channel, DatasetError, Field, Sample};
use csv::StringRecord;
use glob::Pattern;
use log::{debug, warn};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Columns of one sweep follow its frequency column within this many places.
const MAX_COLUMN_SPAN: usize = 2;

#[derive(Error, Debug)]
pub enum VnaError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("invalid header pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("missing header in {source_name}: {msg}")]
    MissingHeader { source_name: String, msg: String },

    #[error("{source_name}: {error}")]
    Dataset {
        source_name: String,
        #[source]
        error: DatasetError,
    },
}

/// What the analyser measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementKind {
    /// S11 sweeps giving VSWR and reflected phase
    Reflection,
    /// S21 sweeps giving magnitude and phase
    Transmission,
}

/// Header globs identifying the three columns of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub header_row: String,
    pub frequency: String,
    pub value: String,
    pub phase: String,
    /// The field the value column holds
    pub value_field: Field,
}
impl ColumnSpec {
    pub fn reflection() -> ColumnSpec {
        ColumnSpec {
            header_row: format!("{}*", Pattern::escape("Freq. [Hz")),
            frequency: "Freq*".to_string(),
            value: "VSWR*".to_string(),
            phase: "Phase*".to_string(),
            value_field: Field::Vswr,
        }
    }

    pub fn transmission() -> ColumnSpec {
        ColumnSpec {
            header_row: format!("{}*", Pattern::escape("Freq. [Hz")),
            frequency: "*Freq*".to_string(),
            value: "*Magnit*".to_string(),
            phase: "*Phase*".to_string(),
            value_field: Field::Magnitude,
        }
    }

    pub fn for_kind(kind: MeasurementKind) -> ColumnSpec {
        match kind {
            MeasurementKind::Reflection => ColumnSpec::reflection(),
            MeasurementKind::Transmission => ColumnSpec::transmission(),
        }
    }
}

/// Positions of one sweep's columns within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndices {
    pub frequency: usize,
    pub value: usize,
    pub phase: usize,
}

/// Finds the first sweep in `header` whose value and phase columns closely follow its
/// frequency column.
pub fn locate_columns(header: &[&str], spec: &ColumnSpec) -> Result<ColumnIndices, VnaError> {
    let matching = |glob: &str| -> Result<Vec<usize>, VnaError> {
        let pattern = Pattern::new(glob)?;
        Ok(header
            .iter()
            .enumerate()
            .filter(|(_, cell)| pattern.matches(cell.trim()))
            .map(|(i, _)| i)
            .collect())
    };
    let frequency_columns = matching(&spec.frequency)?;
    let value_columns = matching(&spec.value)?;
    let phase_columns = matching(&spec.phase)?;
    for (glob, columns) in [
        (&spec.frequency, &frequency_columns),
        (&spec.value, &value_columns),
        (&spec.phase, &phase_columns),
    ] {
        if columns.is_empty() {
            Err(VnaError::MissingHeader {
                source_name: String::new(),
                msg: format!("no column matches '{glob}'"),
            })?
        }
    }

    let near = |columns: &[usize], anchor: usize| {
        columns
            .iter()
            .copied()
            .find(|&c| c > anchor && c - anchor <= MAX_COLUMN_SPAN)
    };
    frequency_columns
        .iter()
        .find_map(|&frequency| {
            let value = near(&value_columns, frequency)?;
            let phase = near(&phase_columns, frequency)?;
            (value != phase).then_some(ColumnIndices {
                frequency,
                value,
                phase,
            })
        })
        .ok_or_else(|| VnaError::MissingHeader {
            source_name: String::new(),
            msg: format!(
                "'{}' and '{}' columns never follow a '{}' column within {MAX_COLUMN_SPAN} places",
                spec.value, spec.phase, spec.frequency
            ),
        })
}

/// Reads the first sweep of an analyser export.
pub fn read_channel(path: &Path, spec: &ColumnSpec) -> Result<Channel, VnaError> {
    let file = File::open(path).map_err(|source| VnaError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_channel(file, spec, &path.display().to_string())
}

/// Parses an analyser export from any reader. `source_name` only labels errors.
pub fn parse_channel<R: Read>(
    reader: R,
    spec: &ColumnSpec,
    source_name: &str,
) -> Result<Channel, VnaError> {
    let header_pattern = Pattern::new(&spec.header_row)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = rdr.records();
    let mut columns = None;
    for result in records.by_ref() {
        let record = result?;
        if record
            .get(0)
            .map_or(false, |first| header_pattern.matches(first.trim()))
        {
            let header: Vec<&str> = record.iter().collect();
            columns = Some(locate_columns(&header, spec).map_err(|e| with_source(e, source_name))?);
            break;
        }
    }
    let columns = columns.ok_or_else(|| VnaError::MissingHeader {
        source_name: source_name.to_string(),
        msg: format!("no row starts with '{}'", spec.header_row),
    })?;
    debug!("{source_name}: reading columns {columns:?}");

    let mut samples = vec![];
    let mut skipped = 0;
    for result in records {
        let record = result?;
        match parse_sample(&record, &columns, spec.value_field) {
            Some(sample) => samples.push(sample),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("{source_name}: skipped {skipped} rows without numeric data");
    }
    if samples.is_empty() {
        Err(VnaError::MissingHeader {
            source_name: source_name.to_string(),
            msg: "header found but no data rows follow it".to_string(),
        })?
    }

    Channel::from_samples(&samples).map_err(|error| VnaError::Dataset {
        source_name: source_name.to_string(),
        error,
    })
}

fn parse_sample(
    record: &StringRecord,
    columns: &ColumnIndices,
    value_field: Field,
) -> Option<Sample> {
    let number = |i: usize| record.get(i).and_then(|s| s.trim().parse::<f64>().ok());
    let frequency = number(columns.frequency)?;
    let value = number(columns.value)?;
    let phase = number(columns.phase)?;
    let sample = Sample::new(frequency.round() as i64).with_phase_deg(phase);
    Some(match value_field {
        Field::Vswr => sample.with_vswr(value),
        _ => sample.with_magnitude_db(value),
    })
}

fn with_source(e: VnaError, source_name: &str) -> VnaError {
    match e {
        VnaError::MissingHeader { msg, .. } => VnaError::MissingHeader {
            source_name: source_name.to_string(),
            msg,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const REFLECTION: &str = "\
Instrument,ZNB8
Date,2019-08-14
Points,3

Freq. [Hz],VSWR,Phase [],,Freq. [Hz],Phase [],VSWR,,
8000000,1.57760946277922,-77.9415435791016,,8000000,-77.9415435791016,1.57760946277922,,
8030000,1.56166475375156,-91.4963989257813,,8030000,-91.4963989257813,1.56166475375156,,
8060000,1.55,-105.0,,8060000,-105.0,1.55,,
";

    #[test]
    fn reads_first_reflection_sweep() {
        let c = parse_channel(REFLECTION.as_bytes(), &ColumnSpec::reflection(), "test").unwrap();
        assert_eq!(c.frequencies(), &[8_000_000, 8_030_000, 8_060_000]);
        assert_abs_diff_eq!(c.vswr().unwrap()[1], 1.56166475375156);
        assert_abs_diff_eq!(c.phase_deg().unwrap()[0], -77.9415435791016);
        assert!(c.magnitude_db().is_err());
    }

    #[test]
    fn skips_units_and_blank_rows() {
        let data = "\
Freq. [Hz],Magnitude [dB],Phase [deg]
Hz,dB,deg
8000000,-1.5,10.0

8.1E6,-1.6,11.0
";
        let c = parse_channel(data.as_bytes(), &ColumnSpec::transmission(), "test").unwrap();
        assert_eq!(c.frequencies(), &[8_000_000, 8_100_000]);
        assert_eq!(c.magnitude_db().unwrap(), &[-1.5, -1.6]);
    }

    #[test]
    fn picks_grouped_columns() {
        // the first magnitude column belongs to no sweep
        let header = [
            "Freq. [Hz]",
            "Phase",
            "x",
            "x",
            "Magnitude",
            "Freq. [Hz]",
            "Magnitude",
            "Phase",
        ];
        let columns = locate_columns(&header, &ColumnSpec::transmission()).unwrap();
        assert_eq!(
            columns,
            ColumnIndices {
                frequency: 5,
                value: 6,
                phase: 7
            }
        );
    }

    #[test]
    fn missing_header() {
        let err = parse_channel("a,b,c\n1,2,3\n".as_bytes(), &ColumnSpec::reflection(), "feed.csv")
            .unwrap_err();
        assert!(matches!(err, VnaError::MissingHeader { .. }));
        assert!(err.to_string().contains("feed.csv"));

        let err = parse_channel(
            "Freq. [Hz],Phase\n1,2\n".as_bytes(),
            &ColumnSpec::reflection(),
            "feed.csv",
        )
        .unwrap_err();
        assert!(err.to_string().contains("VSWR*"));
    }
}
