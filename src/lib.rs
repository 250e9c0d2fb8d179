//! Time-difference (tdiff) calibration of SuperDARN receiver paths.
//!
//! Sweeps of every antenna's signal path are read from network analyser exports, aligned
//! onto one frequency axis, summed into the main and interferometer array responses, and
//! compared to find the phase and time offset between the two arrays.
pub mod cli;
pub mod dataset;
pub mod error;
pub mod fitting;
pub mod paths;
pub mod transmission;
pub mod utils;

#[cfg(feature = "python")]
mod python;
