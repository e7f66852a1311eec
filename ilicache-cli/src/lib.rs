//! Command-line interface for inspecting INTERLIS repository caches.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use ilicache_core::CacheSettings;
use ilicache_data::repository::HttpDownloader;

mod error;
mod models;
mod output;
mod toppings;

pub use error::CliError;

use models::{ModelsArgs, run_models_with};
use output::WriterSink;
use toppings::{MetaConfigArgs, ToppingArgs, run_metaconfigs_with, run_toppings_with};

const ARG_MODEL_DIR: &str = "model-dir";
const ARG_ILI_FILE: &str = "ili-file";
const ARG_TOPPING_DIR: &str = "topping-dir";
const ARG_MODELS: &str = "models";
const ARG_FILE_IDS: &str = "file-ids";
const ARG_CACHE_DIR: &str = "cache-dir";
const ENV_MODELS: &str = "ILICACHE_CMDS_METACONFIGS_MODELS";
const ENV_FILE_IDS: &str = "ILICACHE_CMDS_TOPPINGS_FILE_IDS";
const USER_AGENT: &str = concat!("ilicache-cli/", env!("CARGO_PKG_VERSION"));

/// Run the ilicache CLI with the current process arguments and environment.
///
/// Results are written to stdout as JSON; parse messages and failed
/// downloads are reported on stderr.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, a
/// model source file is malformed, or the output cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let downloader = http_downloader()?;
    let mut stdout = std::io::stdout().lock();
    let mut sink = WriterSink::new(std::io::stderr());
    match cli.command {
        Command::Models(args) => run_models_with(args, &downloader, &mut stdout, &mut sink),
        Command::Metaconfigs(args) => {
            run_metaconfigs_with(args, &downloader, &mut stdout, &mut sink)
        }
        Command::Toppings(args) => run_toppings_with(args, &downloader, &mut stdout, &mut sink),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "ilicache",
    about = "Resolve INTERLIS models and Model Baker toppings from repositories",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the models available from the configured repositories.
    Models(ModelsArgs),
    /// List Model Baker metaconfigurations for a set of models.
    Metaconfigs(MetaConfigArgs),
    /// Resolve topping files by dataset identifier.
    Toppings(ToppingArgs),
}

/// HTTP downloader identifying itself as this CLI.
fn http_downloader() -> Result<HttpDownloader, CliError> {
    Ok(HttpDownloader::new()
        .map_err(CliError::BuildDownloader)?
        .with_user_agent(USER_AGENT))
}

/// Default settings, rooted at `cache_dir` when given.
fn base_settings(cache_dir: Option<&Utf8Path>) -> Result<CacheSettings, CliError> {
    match cache_dir {
        Some(dir) => Ok(CacheSettings::under(dir)),
        None => CacheSettings::from_home_dir().map_err(CliError::from),
    }
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    Ok(runtime.block_on(future))
}

#[cfg(test)]
mod tests;
