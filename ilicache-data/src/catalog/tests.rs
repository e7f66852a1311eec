use super::*;
use crate::encoding::DEFAULT_ENCODINGS;
use ilicache_core::CacheMessage;
use rstest::{fixture, rstest};
use tempfile::TempDir;

#[fixture]
fn fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ilimodels")
}

fn write_fixture(dir: &TempDir, name: &str, bytes: &[u8]) -> Utf8PathBuf {
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .unwrap_or_else(|path| panic!("temporary directory {path:?} is not UTF-8"));
    let path = root.join(name);
    ilicache_fs::write_bytes(&path, bytes)
        .unwrap_or_else(|err| panic!("failed to write fixture {path}: {err}"));
    path
}

const LATIN1_CATALOG: &[u8] = b"INTERLIS 1;\n\
MODEL DM01AVLV95LU2401\n\
  DOMAIN\n\
    Geb\xe4udeart = (Wohnhaus, Scheune);\n\
END DM01AVLV95LU2401.\n";

#[rstest]
#[case("RoadsSimple.ili", "RoadsSimple", "2016-08-11")]
#[case("RoadsSimpleNoSpace.ili", "RoadsSimple", "2016-08-11")]
#[case("SIA405_Base_f-20181005.ili", "SIA405_Base_f", "05.10.2018")]
fn parses_first_model_and_version(
    fixtures_dir: Utf8PathBuf,
    #[case] file: &str,
    #[case] name: &str,
    #[case] version: &str,
) {
    let path = fixtures_dir.join(file);
    let models = parse_catalog(&path, TextEncoding::Utf8).expect("catalog should parse");
    let first = models.first().expect("at least one model");
    assert_eq!(first.name, name);
    assert_eq!(first.version.as_deref(), Some(version));
    assert_eq!(first.source, path.as_str());
}

#[rstest]
fn comments_never_open_models(fixtures_dir: Utf8PathBuf) {
    let models = parse_catalog(
        &fixtures_dir.join("SIA405_Base_f-20181005.ili"),
        TextEncoding::Utf8,
    )
    .expect("catalog should parse");
    assert_eq!(models.len(), 1);
}

#[rstest]
fn model_without_version_keeps_empty_string(fixtures_dir: Utf8PathBuf) {
    let models =
        parse_catalog(&fixtures_dir.join("TwoModels.ili"), TextEncoding::Utf8).expect("parse");
    let summary: Vec<(&str, Option<&str>)> = models
        .iter()
        .map(|model| (model.name.as_str(), model.version.as_deref()))
        .collect();
    assert_eq!(
        summary,
        [("Units", Some("2012-02-20")), ("Unversioned", Some(""))]
    );
}

#[rstest]
fn version_before_model_names_the_line(fixtures_dir: Utf8PathBuf) {
    let path = fixtures_dir.join("RoadsInvalid.ili");
    let err = parse_catalog(&path, TextEncoding::Utf8).expect_err("catalog is malformed");
    match err {
        CatalogError::Malformed(malformed) => {
            assert_eq!(malformed.line, 3);
            assert_eq!(malformed.path, path);
        }
        other => panic!("expected malformed catalog, got {other:?}"),
    }
}

#[rstest]
fn second_version_without_model_is_malformed() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_fixture(
        &dir,
        "Twice.ili",
        b"MODEL Twice (en)\nVERSION \"1\" =\nVERSION \"2\" =\n",
    );
    let err = parse_catalog(&path, TextEncoding::Utf8).expect_err("second version is dangling");
    assert!(matches!(err, CatalogError::Malformed(MalformedCatalogError { line: 3, .. })));
}

#[rstest]
fn reparsing_is_idempotent(fixtures_dir: Utf8PathBuf) {
    let path = fixtures_dir.join("TwoModels.ili");
    let first = parse_catalog(&path, TextEncoding::Utf8).expect("first parse");
    let second = parse_catalog(&path, TextEncoding::Utf8).expect("second parse");
    assert_eq!(first, second);
}

#[rstest]
fn latin1_fallback_warns_exactly_once() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_fixture(&dir, "DM01AVLV95LU2401.ili", LATIN1_CATALOG);
    let mut messages: Vec<CacheMessage> = Vec::new();
    let models =
        process_catalog_file(&path, &DEFAULT_ENCODINGS, &mut messages).expect("not malformed");

    assert_eq!(models.len(), 1);
    assert_eq!(
        models.first().map(|model| model.name.as_str()),
        Some("DM01AVLV95LU2401")
    );
    assert_eq!(messages.len(), 1);
    let message = messages.first().expect("one message");
    assert_eq!(message.severity, Severity::Warning);
    assert!(message.text.contains("DM01AVLV95LU2401.ili"));
}

#[rstest]
fn exhausted_encodings_report_critical_and_return_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_fixture(&dir, "Broken.ili", LATIN1_CATALOG);
    let mut messages: Vec<CacheMessage> = Vec::new();
    let models = process_catalog_file(&path, &[TextEncoding::Utf8], &mut messages)
        .expect("decode failures are not fatal");
    assert!(models.is_empty());
    assert_eq!(
        messages.iter().map(|message| message.severity).collect::<Vec<_>>(),
        [Severity::Critical]
    );
}

#[rstest]
fn unreadable_file_reports_critical(fixtures_dir: Utf8PathBuf) {
    let mut messages: Vec<CacheMessage> = Vec::new();
    let models = process_catalog_file(
        &fixtures_dir.join("Missing.ili"),
        &DEFAULT_ENCODINGS,
        &mut messages,
    )
    .expect("missing files are not fatal");
    assert!(models.is_empty());
    let [message] = messages.as_slice() else {
        panic!("expected one message, found {messages:?}");
    };
    assert_eq!(message.severity, Severity::Critical);
    assert!(message.text.starts_with("Could not read ili file `Missing.ili`"));
    assert!(!message.text.contains("encodings"));
}

#[rstest]
fn malformed_catalog_propagates(fixtures_dir: Utf8PathBuf) {
    let mut messages: Vec<CacheMessage> = Vec::new();
    let err = process_catalog_file(
        &fixtures_dir.join("RoadsInvalid.ili"),
        &DEFAULT_ENCODINGS,
        &mut messages,
    )
    .expect_err("malformed catalogs are fatal");
    assert_eq!(err.line, 3);
    assert!(messages.is_empty());
}
