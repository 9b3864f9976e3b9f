//! `niemtran` — assemble NIEM schema bundles, compile translation models,
//! and translate instance documents to linked-data JSON.

use clap::Parser;
use niem_translate::cli::{run, Cli};

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    std::process::exit(run(&cli));
}
