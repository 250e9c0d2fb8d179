//! Transmitter path analysis: sums transmission sweeps through each main array transmitter
//! and reports their phase and time relative to the interferometer array. Interferometer
//! antennas usually have no transmitters, so without one the reference is flat at 0 dB, 0°.
use clap::Parser;
use tdiff_path::cli::{run_paths, setup_logging, PathArgs};

pub type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;

fn main() {
    if let Err(e) = bin_main() {
        eprintln!("error: {e}");
        if let Some(e) = e.source() {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}

fn bin_main() -> BinResult<()> {
    let mut args = PathArgs::parse();
    setup_logging(args.verbosity)?;

    args.zero_reference = true;
    let analysis = run_paths(&args, false)?;
    for (name, fit) in analysis.fits.iter() {
        println!("{name}: {:.3} ns", fit.time_delay_ns);
    }
    Ok(())
}
