//! The JSON file naming the measurement file of every channel.
//!
//! ```json
//! {
//!   "_comment": "Saskatoon phasing matrix, 2019-08",
//!   "atten": "20",
//!   "M0": "M0.csv",
//!   "M1": "dne",
//!   "I0": "estimate_intf"
//! }
//! ```
use crate::dataset::{ATTENUATOR_KEY, COMBINED_INTF_KEY, COMBINED_MAIN_KEY};
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

pub const COMMENT_KEY: &str = "_comment";
pub const FIXED_ATTENUATION_KEY: &str = "atten";
/// File name marking a channel that was not measured
pub const MISSING_SENTINEL: &str = "dne";
/// File name asking for an approximated interferometer channel
pub const ESTIMATE_SENTINEL: &str = "estimate_intf";

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("cannot read mapping file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("mapping file is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid key '{0}': channel names must start with M or I")]
    InvalidKey(String),

    #[error("invalid value for '{key}': {msg}")]
    InvalidValue { key: String, msg: String },
}

/// The parsed contents of a mapping file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelMapping {
    pub comment: Option<String>,
    /// Fixed attenuator correction in dB
    pub attenuation_db: Option<f64>,
    /// Measured attenuator sweep
    pub attenuator_file: Option<String>,
    /// Array member files, in file order
    pub channel_files: IndexMap<String, String>,
    pub combined_main_file: Option<String>,
    pub combined_intf_file: Option<String>,
    /// Channels marked as not measured
    pub missing: Vec<String>,
    /// Channels marked for estimation
    pub estimated: Vec<String>,
}

impl ChannelMapping {
    pub fn from_file(path: &Path) -> Result<ChannelMapping, MappingError> {
        let file = File::open(path).map_err(|source| MappingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let raw: IndexMap<String, Value> = serde_json::from_reader(BufReader::new(file))?;
        ChannelMapping::from_entries(raw)
    }

    pub fn from_json_str(json: &str) -> Result<ChannelMapping, MappingError> {
        let raw: IndexMap<String, Value> = serde_json::from_str(json)?;
        ChannelMapping::from_entries(raw)
    }

    fn from_entries(raw: IndexMap<String, Value>) -> Result<ChannelMapping, MappingError> {
        let mut mapping = ChannelMapping::default();
        for (key, value) in raw {
            if key == COMMENT_KEY {
                mapping.comment = Some(comment_text(&value));
                continue;
            }
            if key == FIXED_ATTENUATION_KEY {
                mapping.attenuation_db = Some(number(&key, &value)?);
                continue;
            }
            let file = match value {
                Value::String(s) => s,
                other => Err(MappingError::InvalidValue {
                    key: key.clone(),
                    msg: format!("expected a file name, found {other}"),
                })?,
            };
            if file == MISSING_SENTINEL {
                debug!("{key} is marked as not measured");
                mapping.missing.push(key);
                continue;
            }
            if file == ESTIMATE_SENTINEL {
                debug!("{key} is marked for estimation");
                mapping.estimated.push(key);
                continue;
            }
            match key.as_str() {
                ATTENUATOR_KEY => mapping.attenuator_file = Some(file),
                COMBINED_MAIN_KEY => mapping.combined_main_file = Some(file),
                COMBINED_INTF_KEY => mapping.combined_intf_file = Some(file),
                k if k.starts_with('M') || k.starts_with('I') => {
                    mapping.channel_files.insert(key.clone(), file);
                }
                _ => Err(MappingError::InvalidKey(key.clone()))?,
            }
        }
        Ok(mapping)
    }
}

fn comment_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(lines) => lines
            .iter()
            .map(|l| match l {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

fn number(key: &str, value: &Value) -> Result<f64, MappingError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| MappingError::InvalidValue {
        key: key.to_string(),
        msg: format!("expected a number of dB, found {value}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_entries() {
        let mapping = ChannelMapping::from_json_str(
            r#"{
                "_comment": ["Saskatoon", "phasing matrix"],
                "atten": "20",
                "M1": "m1.csv",
                "M0": "m0.csv",
                "M2": "dne",
                "I0": "i0.csv",
                "I1": "estimate_intf",
                "M_combined": "main.csv",
                "atten_file": "atten.csv"
            }"#,
        )
        .unwrap();
        assert_eq!(mapping.comment.as_deref(), Some("Saskatoon phasing matrix"));
        assert_eq!(mapping.attenuation_db, Some(20.0));
        assert_eq!(
            mapping.channel_files.keys().collect::<Vec<_>>(),
            vec!["M1", "M0", "I0"]
        );
        assert_eq!(mapping.missing, vec!["M2"]);
        assert_eq!(mapping.estimated, vec!["I1"]);
        assert_eq!(mapping.combined_main_file.as_deref(), Some("main.csv"));
        assert_eq!(mapping.combined_intf_file, None);
        assert_eq!(mapping.attenuator_file.as_deref(), Some("atten.csv"));
    }

    #[test]
    fn rejects_bad_entries() {
        assert!(matches!(
            ChannelMapping::from_json_str(r#"{"X0": "x.csv"}"#),
            Err(MappingError::InvalidKey(_))
        ));
        assert!(matches!(
            ChannelMapping::from_json_str(r#"{"atten": "lots"}"#),
            Err(MappingError::InvalidValue { .. })
        ));
        assert!(matches!(
            ChannelMapping::from_json_str(r#"{"M0": 3}"#),
            Err(MappingError::InvalidValue { .. })
        ));
        assert!(matches!(
            ChannelMapping::from_json_str("[1, 2]"),
            Err(MappingError::Json(_))
        ));
    }
}
