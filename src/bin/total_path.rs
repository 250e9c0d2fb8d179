//! Sums the feedline, transmitter and phasing matrix time differences into the total
//! difference between the arrays.
use clap::Parser;
use tdiff_path::cli::{run_total_path, setup_logging, TotalPathArgs};

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
    let args = TotalPathArgs::parse();
    setup_logging(args.verbosity)?;

    let total = run_total_path(&args)?;
    if let (Some(first), Some(last)) = (total.time_ns.first(), total.time_ns.last()) {
        println!("Total time difference: {first:.3} ns to {last:.3} ns");
    }
    Ok(())
}
