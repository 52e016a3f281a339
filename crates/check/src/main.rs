// standard library
use std::process::ExitCode;

// external crates
use clap::Parser;

// mcnptools modules
use mcnptools_check::{run, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("deckcheck: {e}");
            ExitCode::from(mcnptools_check::EXIT_FATAL)
        }
    }
}
