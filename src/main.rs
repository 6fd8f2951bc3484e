#![forbid(unsafe_code)]

//! cleevio-tempo-cli entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    if let Err(e) = cli_app::run(&args) {
        eprintln!("cleevio-tempo-cli: {e}");
        std::process::exit(1);
    }
}
