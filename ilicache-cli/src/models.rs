//! `models` command: list the models of the configured repositories.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ilicache_core::{CacheSettings, MessageSink, SourceList};
use ilicache_data::repository::{Downloader, ModelCache, ModelCatalog};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_CACHE_DIR, ARG_ILI_FILE, ARG_MODEL_DIR, CliError, base_settings, block_on,
    output::{report_failures, write_json},
};

/// CLI arguments for the `models` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "models",
    long_about = "Refresh the model cache from local directories and remote \
                 repositories and print the deduplicated models as JSON. \
                 Sources can come from CLI flags, configuration files, or \
                 environment variables.",
    about = "List the models available from the configured repositories"
)]
#[ortho_config(prefix = "ILICACHE")]
pub(crate) struct ModelsArgs {
    /// Semicolon-separated model sources (directories, URLs, `%` placeholders).
    #[arg(long = ARG_MODEL_DIR, value_name = "sources")]
    #[serde(default)]
    pub(crate) model_dir: Option<String>,
    /// Additional model source file indexed outside any repository.
    #[arg(long = ARG_ILI_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) ili_file: Option<Utf8PathBuf>,
    /// Directory below which the caches are kept (defaults to the home directory).
    #[arg(long = ARG_CACHE_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) cache_dir: Option<Utf8PathBuf>,
}

impl ModelsArgs {
    pub(crate) fn into_config(self) -> Result<ModelsConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ModelsConfig::try_from(merged)
    }
}

/// Resolved `models` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModelsConfig {
    /// Model sources and cache root, with CLI overrides applied.
    pub(crate) settings: CacheSettings,
    /// Single file indexed into the `no_repo` bucket.
    pub(crate) ili_file: Option<Utf8PathBuf>,
}

impl ModelsConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        match &self.ili_file {
            Some(path) => require_existing(path, ARG_ILI_FILE),
            None => Ok(()),
        }
    }
}

impl TryFrom<ModelsArgs> for ModelsConfig {
    type Error = CliError;

    fn try_from(args: ModelsArgs) -> Result<Self, Self::Error> {
        let mut settings = base_settings(args.cache_dir.as_deref())?;
        if let Some(model_dir) = args.model_dir.as_deref() {
            settings = settings.with_model_sources(SourceList::parse(model_dir));
        }
        Ok(Self {
            settings,
            ili_file: args.ili_file,
        })
    }
}

/// Check that `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match ilicache_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub(crate) fn run_models_with<D: Downloader>(
    args: ModelsArgs,
    downloader: D,
    writer: &mut dyn Write,
    sink: &mut dyn MessageSink,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    execute_models(&config, downloader, writer, sink)
}

pub(crate) fn execute_models<D: Downloader>(
    config: &ModelsConfig,
    downloader: D,
    writer: &mut dyn Write,
    sink: &mut dyn MessageSink,
) -> Result<(), CliError> {
    let mut cache = ModelCache::from_settings(ModelCatalog, downloader, &config.settings);
    let report = block_on(cache.refresh_configured(&config.settings, sink))??;
    report_failures(&report, sink);
    if let Some(path) = &config.ili_file {
        cache.refresh_single_file(path, sink)?;
    }
    write_json(writer, cache.index().all_records())
}
