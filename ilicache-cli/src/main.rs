//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use ilicache_cli::CliError;

fn main() {
    match ilicache_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("ilicache: {err}");
            std::process::exit(1);
        }
    }
}
