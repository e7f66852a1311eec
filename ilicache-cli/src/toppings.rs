//! `metaconfigs` and `toppings` commands.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ilicache_core::{CacheSettings, MessageSink, SourceList};
use ilicache_data::repository::{
    Downloader, MetaConfigCache, MetaConfigCatalog, ToppingFileCache, ToppingFileCatalog,
};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_CACHE_DIR, ARG_FILE_IDS, ARG_MODELS, ARG_TOPPING_DIR, CliError, ENV_FILE_IDS, ENV_MODELS,
    base_settings, block_on,
    output::{report_failures, write_json},
};

/// CLI arguments for the `metaconfigs` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "metaconfigs",
    long_about = "Refresh the topping cache and print, as JSON, the Model \
                 Baker metaconfigurations covering any of the given models.",
    about = "List Model Baker metaconfigurations for a set of models"
)]
#[ortho_config(prefix = "ILICACHE")]
pub(crate) struct MetaConfigArgs {
    /// Semicolon-separated model names.
    #[arg(long = ARG_MODELS, value_name = "names")]
    #[serde(default)]
    pub(crate) models: Option<String>,
    /// Semicolon-separated topping sources.
    #[arg(long = ARG_TOPPING_DIR, value_name = "sources")]
    #[serde(default)]
    pub(crate) topping_dir: Option<String>,
    /// Directory below which the caches are kept (defaults to the home directory).
    #[arg(long = ARG_CACHE_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) cache_dir: Option<Utf8PathBuf>,
}

/// CLI arguments for the `toppings` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "toppings",
    long_about = "Refresh the topping cache for the given `ilidata:` \
                 identifiers, downloading remote files, and print the \
                 resolved records as JSON.",
    about = "Resolve topping files by dataset identifier"
)]
#[ortho_config(prefix = "ILICACHE")]
pub(crate) struct ToppingArgs {
    /// Semicolon-separated `ilidata:<id>` identifiers.
    #[arg(long = ARG_FILE_IDS, value_name = "ids")]
    #[serde(default)]
    pub(crate) file_ids: Option<String>,
    /// Semicolon-separated topping sources.
    #[arg(long = ARG_TOPPING_DIR, value_name = "sources")]
    #[serde(default)]
    pub(crate) topping_dir: Option<String>,
    /// Directory below which the caches are kept (defaults to the home directory).
    #[arg(long = ARG_CACHE_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) cache_dir: Option<Utf8PathBuf>,
}

/// Settings shared by both topping commands, with `--topping-dir` applied.
fn topping_settings(
    topping_dir: Option<&str>,
    cache_dir: Option<&Utf8Path>,
) -> Result<CacheSettings, CliError> {
    let settings = base_settings(cache_dir)?;
    Ok(match topping_dir {
        Some(sources) => settings.with_topping_sources(SourceList::parse(sources)),
        None => settings,
    })
}

/// Resolved `metaconfigs` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MetaConfigConfig {
    pub(crate) models: String,
    pub(crate) settings: CacheSettings,
}

impl TryFrom<MetaConfigArgs> for MetaConfigConfig {
    type Error = CliError;

    fn try_from(args: MetaConfigArgs) -> Result<Self, Self::Error> {
        let models = required(args.models, ARG_MODELS, ENV_MODELS)?;
        let settings = topping_settings(args.topping_dir.as_deref(), args.cache_dir.as_deref())?;
        Ok(Self { models, settings })
    }
}

/// Resolved `toppings` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ToppingConfig {
    pub(crate) file_ids: SourceList,
    pub(crate) settings: CacheSettings,
}

impl TryFrom<ToppingArgs> for ToppingConfig {
    type Error = CliError;

    fn try_from(args: ToppingArgs) -> Result<Self, Self::Error> {
        let file_ids = SourceList::parse(&required(args.file_ids, ARG_FILE_IDS, ENV_FILE_IDS)?);
        let settings = topping_settings(args.topping_dir.as_deref(), args.cache_dir.as_deref())?;
        Ok(Self { file_ids, settings })
    }
}

/// A value that must be present and non-blank after merging.
fn required(
    value: Option<String>,
    field: &'static str,
    env: &'static str,
) -> Result<String, CliError> {
    value
        .filter(|text| !text.trim().is_empty())
        .ok_or(CliError::MissingArgument { field, env })
}

pub(crate) fn run_metaconfigs_with<D: Downloader>(
    args: MetaConfigArgs,
    downloader: D,
    writer: &mut dyn Write,
    sink: &mut dyn MessageSink,
) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = MetaConfigConfig::try_from(merged)?;
    let mut cache = MetaConfigCache::from_settings(
        MetaConfigCatalog::from_joined(&config.models),
        downloader,
        &config.settings,
    );
    let report = block_on(cache.refresh_configured(&config.settings, sink))??;
    report_failures(&report, sink);
    write_json(writer, cache.index().all_records())
}

pub(crate) fn run_toppings_with<D: Downloader>(
    args: ToppingArgs,
    downloader: D,
    writer: &mut dyn Write,
    sink: &mut dyn MessageSink,
) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = ToppingConfig::try_from(merged)?;
    let mut cache = ToppingFileCache::from_settings(
        ToppingFileCatalog::new(config.file_ids.iter()),
        downloader,
        &config.settings,
    );
    let report = block_on(cache.refresh_configured(&config.settings, sink))??;
    report_failures(&report, sink);
    write_json(writer, cache.index().all_records())
}
