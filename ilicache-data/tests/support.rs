use camino::Utf8PathBuf;
use std::future::Future;
use tempfile::TempDir;

/// Directory holding the repository fixtures.
pub fn fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Contents of a fixture file below [`fixtures_dir`].
pub fn fixture_bytes(relative: &str) -> Vec<u8> {
    let path = fixtures_dir().join(relative);
    ilicache_fs::read_bytes(&path).unwrap_or_else(|err| {
        panic!("failed to read fixture {path}: {err}");
    })
}

/// UTF-8 path of a temporary directory.
pub fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .unwrap_or_else(|path| panic!("temporary directory {} is not UTF-8", path.display()))
}

/// Drive `future` to completion on a current-thread runtime.
pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|err| panic!("failed to build Tokio runtime: {err}"))
        .block_on(future)
}
