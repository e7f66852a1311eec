//! Error types emitted by the ilicache CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use ilicache_core::SettingsError;
use ilicache_data::{MalformedCatalogError, repository::TransportError};
use thiserror::Error;

/// Errors emitted by the ilicache CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// Default cache locations could not be derived.
    #[error("failed to derive default settings: {0}")]
    Settings(#[from] SettingsError),
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The HTTP client could not be built.
    #[error("failed to build downloader: {0}")]
    BuildDownloader(#[source] TransportError),
    /// The async runtime could not be started.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// A local model source file is malformed.
    #[error(transparent)]
    MalformedCatalog(#[from] MalformedCatalogError),
    /// Serializing the command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
