//! Feedline path analysis: converts VSWR sweeps of each antenna's feedline to one-way
//! transmission and reports the phase and time difference between the two arrays.
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
    let args = PathArgs::parse();
    setup_logging(args.verbosity)?;

    let analysis = run_paths(&args, true)?;
    for (name, fit) in analysis.fits.iter() {
        println!("{name}: {:.3} ns", fit.time_delay_ns);
    }
    Ok(())
}
