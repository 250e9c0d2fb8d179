//! Phasing matrix path analysis: sums transmission sweeps through the phasing matrix
//! into each array and reports the phase and time difference between them.
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

    let analysis = run_paths(&args, false)?;
    for (name, fit) in analysis.fits.iter() {
        println!("{name}: {:.3} ns", fit.time_delay_ns);
    }
    Ok(())
}
