//! Focused unit tests covering CLI configuration and output helpers.

use super::helpers::{TOPPING_ID, Workspace, write_utf8};
use super::*;
use crate::models::{ModelsConfig, execute_models};
use crate::output::write_json;
use crate::toppings::{MetaConfigConfig, ToppingConfig};
use ilicache_core::{
    CacheMessage, CacheSettings, DEFAULT_SOURCES, MODEL_CACHE_DIR_NAME, MessageSink, Severity,
    SourceList, TOPPING_CACHE_DIR_NAME,
};
use ilicache_data::repository::test_support::StubDownloader;
use rstest::{fixture, rstest};
use serde_json::Value;

#[fixture]
fn workspace() -> Workspace {
    Workspace::new()
}

fn parse_output(bytes: &[u8]) -> Vec<Value> {
    serde_json::from_slice(bytes).expect("output should be a JSON array")
}

fn local_models(workspace: &Workspace) -> CacheSettings {
    CacheSettings::under(&workspace.cache_dir())
        .with_model_sources(SourceList::parse(workspace.model_repository().as_str()))
}

fn field<'a>(record: &'a Value, name: &str) -> Option<&'a str> {
    record.get(name).and_then(Value::as_str)
}

#[rstest]
fn models_config_defaults_sources_below_the_cache_dir(workspace: Workspace) {
    let args = ModelsArgs {
        cache_dir: Some(workspace.cache_dir()),
        ..ModelsArgs::default()
    };
    let config = ModelsConfig::try_from(args).expect("config should build");
    assert_eq!(config.settings.model_sources, SourceList::parse(DEFAULT_SOURCES));
    assert_eq!(
        config.settings.model_cache_root,
        workspace.cache_dir().join(MODEL_CACHE_DIR_NAME)
    );
    assert_eq!(config.ili_file, None);
}

#[rstest]
fn models_config_splits_model_dirs(workspace: Workspace) {
    let args = ModelsArgs {
        model_dir: Some("%XTF_DIR; /data/models ;http://models.interlis.ch/".to_owned()),
        cache_dir: Some(workspace.cache_dir()),
        ili_file: None,
    };
    let config = ModelsConfig::try_from(args).expect("config should build");
    assert_eq!(
        config.settings.model_sources.iter().collect::<Vec<_>>(),
        ["%XTF_DIR", "/data/models", "http://models.interlis.ch/"]
    );
}

#[rstest]
fn validate_sources_reports_missing_ili_file(workspace: Workspace) {
    let config = ModelsConfig {
        settings: CacheSettings::under(&workspace.cache_dir()),
        ili_file: Some(workspace.cache_dir().join("Missing.ili")),
    };
    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_ILI_FILE),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_directories(workspace: Workspace) {
    let config = ModelsConfig {
        settings: CacheSettings::under(&workspace.cache_dir()),
        ili_file: Some(workspace.model_repository()),
    };
    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::SourcePathNotFile { field, .. } => assert_eq!(field, ARG_ILI_FILE),
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
#[case(None)]
#[case(Some("   ".to_owned()))]
fn metaconfigs_require_models(workspace: Workspace, #[case] models: Option<String>) {
    let args = MetaConfigArgs {
        models,
        topping_dir: None,
        cache_dir: Some(workspace.cache_dir()),
    };
    let err = MetaConfigConfig::try_from(args).expect_err("missing models should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_MODELS);
            assert_eq!(env, ENV_MODELS);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn toppings_require_file_ids(workspace: Workspace) {
    let args = ToppingArgs {
        cache_dir: Some(workspace.cache_dir()),
        ..ToppingArgs::default()
    };
    let err = ToppingConfig::try_from(args).expect_err("missing ids should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_FILE_IDS);
            assert_eq!(env, ENV_FILE_IDS);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn topping_config_uses_the_topping_cache_root(workspace: Workspace) {
    let args = ToppingArgs {
        file_ids: Some(format!("{TOPPING_ID};")),
        topping_dir: Some(workspace.topping_repository().into_string()),
        cache_dir: Some(workspace.cache_dir()),
    };
    let config = ToppingConfig::try_from(args).expect("config should build");
    assert_eq!(config.file_ids.iter().collect::<Vec<_>>(), [TOPPING_ID]);
    assert_eq!(
        config.settings.topping_cache_root,
        workspace.cache_dir().join(TOPPING_CACHE_DIR_NAME)
    );
    assert_eq!(
        config.settings.topping_sources.iter().collect::<Vec<_>>(),
        [workspace.topping_repository().as_str()]
    );
    assert_eq!(config.settings.model_sources, SourceList::parse(DEFAULT_SOURCES));
}

#[rstest]
fn models_are_printed_as_json(workspace: Workspace) {
    let config = ModelsConfig {
        settings: local_models(&workspace),
        ili_file: Some(workspace.standalone_model()),
    };
    let mut stdout = Vec::new();
    let mut messages: Vec<CacheMessage> = Vec::new();
    execute_models(&config, StubDownloader::new(), &mut stdout, &mut messages)
        .expect("models command succeeds");

    let records = parse_output(&stdout);
    let names: Vec<&str> = records
        .iter()
        .filter_map(|record| field(record, "name"))
        .collect();
    assert_eq!(names, ["RoadsSimple", "Units", "Standalone"]);
    let standalone = records.last().expect("standalone record");
    assert_eq!(field(standalone, "source"), Some("no_repo"));
    assert!(messages.is_empty());
}

#[rstest]
fn malformed_sources_fail_the_command(workspace: Workspace) {
    write_utf8(
        &workspace.model_repository().join("Broken.ili"),
        b"INTERLIS 2.3;\nVERSION \"1\" =\n",
    );
    let config = ModelsConfig {
        settings: local_models(&workspace),
        ili_file: None,
    };
    let mut stdout = Vec::new();
    let mut messages: Vec<CacheMessage> = Vec::new();
    let err = execute_models(&config, StubDownloader::new(), &mut stdout, &mut messages)
        .expect_err("malformed file should fail");
    match err {
        CliError::MalformedCatalog(malformed) => assert_eq!(malformed.line, 2),
        other => panic!("expected MalformedCatalog, found {other:?}"),
    }
    assert!(stdout.is_empty());
}

#[rstest]
fn writer_sink_prefixes_severity() {
    let mut sink = WriterSink::new(Vec::new());
    sink.notify(Severity::Warning, "file read as Latin-1".to_owned());
    sink.notify(Severity::Critical, "file unreadable".to_owned());
    let text = String::from_utf8(sink.into_inner()).expect("utf-8 output");
    assert_eq!(
        text,
        "warning: file read as Latin-1\ncritical: file unreadable\n"
    );
}

#[rstest]
fn downloader_identifies_the_cli() {
    let downloader = http_downloader().expect("downloader builds");
    assert!(downloader.user_agent().starts_with("ilicache-cli/"));
}

#[rstest]
fn json_output_ends_with_newline() {
    let mut buffer = Vec::new();
    write_json(&mut buffer, &["a", "b"]).expect("write succeeds");
    assert!(buffer.ends_with(b"]\n"));
}
