use crate::cli::{run_paths, run_total_path, setup_logging, PathArgs, TotalPathArgs};
use crate::dataset::phase::{unwrap_degrees_with_threshold, wrap_degrees, UNWRAP_THRESHOLD_DEG};
use crate::dataset::Channel;
use crate::error::TdiffError;
use crate::fitting::linear_fit::fit_with_threshold;
use crate::transmission::vswr_to_one_way_magnitude;
use clap::Parser;
use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};
use pyo3::prelude::{PyAnyMethods, PyModule};
use pyo3::{pyfunction, pymodule, wrap_pyfunction, Bound, PyResult, Python};

/// Wraps phases in degrees into (-180, 180].
#[pyfunction]
#[pyo3(name = "wrap_phase")]
#[pyo3(text_signature = "(phase_deg: np.ndarray, /)")]
fn wrap_phase_py<'py>(
    py: Python<'py>,
    phase_deg: PyReadonlyArray1<'py, f64>,
) -> Bound<'py, PyArray1<f64>> {
    wrap_degrees(&phase_deg.as_array().to_vec()).into_pyarray_bound(py)
}

/// Unwraps phases in degrees sampled in ascending frequency order.
#[pyfunction]
#[pyo3(name = "unwrap_phase")]
#[pyo3(signature = (phase_deg, threshold_deg = UNWRAP_THRESHOLD_DEG))]
fn unwrap_phase_py<'py>(
    py: Python<'py>,
    phase_deg: PyReadonlyArray1<'py, f64>,
    threshold_deg: f64,
) -> Bound<'py, PyArray1<f64>> {
    unwrap_degrees_with_threshold(&phase_deg.as_array().to_vec(), threshold_deg)
        .into_pyarray_bound(py)
}

/// Fits a line to phase (degrees) against frequency (Hz).
///
/// Returns (slope, intercept, r_value, p_value, std_err, time_delay_ns) with the slope in
/// rad/Hz and the intercept in rad.
#[pyfunction]
#[pyo3(name = "linear_fit")]
#[pyo3(signature = (freqs, phase_deg, threshold_deg = UNWRAP_THRESHOLD_DEG))]
fn linear_fit_py(
    freqs: PyReadonlyArray1<'_, i64>,
    phase_deg: PyReadonlyArray1<'_, f64>,
    threshold_deg: f64,
) -> PyResult<(f64, f64, f64, f64, f64, f64)> {
    let channel = Channel::new(freqs.as_array().to_vec())
        .and_then(|c| c.with_phase_deg(phase_deg.as_array().to_vec()))
        .map_err(TdiffError::from)?;
    let fit = fit_with_threshold(&channel, threshold_deg).map_err(TdiffError::from)?;
    Ok((
        fit.slope,
        fit.intercept,
        fit.r_value,
        fit.p_value,
        fit.std_err,
        fit.time_delay_ns,
    ))
}

/// One-way magnitude in dB through a mismatch of `vswr` and `cable_loss_db` of feedline.
#[pyfunction]
#[pyo3(name = "vswr_to_one_way_magnitude")]
#[pyo3(text_signature = "(vswr: float, cable_loss_db: float, /)")]
fn vswr_to_one_way_magnitude_py(vswr: f64, cable_loss_db: f64) -> PyResult<f64> {
    Ok(vswr_to_one_way_magnitude(vswr, cable_loss_db).map_err(TdiffError::from)?)
}

fn argv(py: Python) -> PyResult<Vec<String>> {
    py.import_bound("sys")?.getattr("argv")?.extract::<Vec<String>>()
}

/// Feedline path analysis from reflection sweeps, taking arguments from `sys.argv`.
#[pyfunction]
#[pyo3(name = "feedline_paths")]
fn feedline_paths_cli(py: Python) -> PyResult<()> {
    let args = PathArgs::parse_from(argv(py)?);
    // a logger may already be installed by an earlier call
    let _ = setup_logging(args.verbosity);
    run_paths(&args, true)?;
    Ok(())
}

/// Phasing matrix path analysis from transmission sweeps, taking arguments from `sys.argv`.
#[pyfunction]
#[pyo3(name = "phasing_matrix_paths")]
fn phasing_matrix_paths_cli(py: Python) -> PyResult<()> {
    let args = PathArgs::parse_from(argv(py)?);
    let _ = setup_logging(args.verbosity);
    run_paths(&args, false)?;
    Ok(())
}

/// Transmitter path analysis from transmission sweeps, differencing against a flat zero
/// reference when no interferometer was measured. Arguments come from `sys.argv`.
#[pyfunction]
#[pyo3(name = "transmitter_paths")]
fn transmitter_paths_cli(py: Python) -> PyResult<()> {
    let mut args = PathArgs::parse_from(argv(py)?);
    let _ = setup_logging(args.verbosity);
    args.zero_reference = true;
    run_paths(&args, false)?;
    Ok(())
}

/// Sums the path time differences, taking arguments from `sys.argv`.
#[pyfunction]
#[pyo3(name = "total_path")]
fn total_path_cli(py: Python) -> PyResult<()> {
    let args = TotalPathArgs::parse_from(argv(py)?);
    let _ = setup_logging(args.verbosity);
    run_total_path(&args)?;
    Ok(())
}

/// Functions for SuperDARN time-difference calibration.
#[pymodule]
fn tdiff_path(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(wrap_phase_py, m)?)?;
    m.add_function(wrap_pyfunction!(unwrap_phase_py, m)?)?;
    m.add_function(wrap_pyfunction!(linear_fit_py, m)?)?;
    m.add_function(wrap_pyfunction!(vswr_to_one_way_magnitude_py, m)?)?;
    m.add_wrapped(wrap_pyfunction!(feedline_paths_cli))?;
    m.add_wrapped(wrap_pyfunction!(phasing_matrix_paths_cli))?;
    m.add_wrapped(wrap_pyfunction!(transmitter_paths_cli))?;
    m.add_wrapped(wrap_pyfunction!(total_path_cli))?;

    Ok(())
}
