//! Behavioural tests for selecting Model Baker metaconfigurations.

use camino::Utf8PathBuf;
use ilicache_core::{CacheMessage, ToppingRecord};
use ilicache_data::{
    FILES_DIR_NAME,
    repository::{MetaConfigCache, MetaConfigCatalog, test_support::StubDownloader},
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::{cell::RefCell, fs};
use tempfile::TempDir;

mod support;

use support::{block_on, fixture_bytes, fixtures_dir, utf8_dir};

const MODEL: &str = "KbS_LV95_V1_4";
const REMOTE: &str = "http://models.opengis.example/";
const CONFIG_ID: &str = "ch.opengis.ili.config.KbS_LV95_V1_4_config_V1_0";
const CONFIG_PATH: &str = "metaconfig/opengisch_KbS_LV95_V1_4.ini";

struct Selection {
    cache_dir: TempDir,
    downloader: StubDownloader,
    source: String,
    cache: Option<MetaConfigCache<StubDownloader>>,
    fetched: Option<Utf8PathBuf>,
}

impl Selection {
    fn request(&mut self) {
        let downloader = std::mem::take(&mut self.downloader);
        let mut cache = MetaConfigCache::new(
            MetaConfigCatalog::new([MODEL]),
            downloader,
            utf8_dir(&self.cache_dir),
        );
        let mut messages: Vec<CacheMessage> = Vec::new();
        block_on(cache.refresh([self.source.as_str()], &mut messages))
            .unwrap_or_else(|err| panic!("refresh failed: {err}"));
        self.cache = Some(cache);
    }

    fn cache(&self) -> &MetaConfigCache<StubDownloader> {
        self.cache
            .as_ref()
            .unwrap_or_else(|| panic!("metaconfigurations must be requested first"))
    }

    fn ids(&self) -> Vec<&str> {
        self.cache()
            .index()
            .all_records()
            .iter()
            .map(|record| record.id.as_str())
            .collect()
    }

    fn config(&self) -> &ToppingRecord {
        self.cache()
            .index()
            .find_by_id(CONFIG_ID)
            .unwrap_or_else(|| panic!("{CONFIG_ID} missing"))
    }
}

#[fixture]
fn selection() -> RefCell<Selection> {
    RefCell::new(Selection {
        cache_dir: TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}")),
        downloader: StubDownloader::new(),
        source: String::new(),
        cache: None,
        fetched: None,
    })
}

#[given("the local test repository")]
fn local(#[from(selection)] selection: &RefCell<Selection>) {
    selection.borrow_mut().source = fixtures_dir().join("ilirepo/24").into_string();
}

#[given("a remote repository publishing a metaconfiguration")]
fn remote(#[from(selection)] selection: &RefCell<Selection>) {
    let mut state = selection.borrow_mut();
    state.downloader = StubDownloader::new()
        .with_file(
            &format!("{REMOTE}ilidata.xml"),
            fixture_bytes("ilirepo/24/ilidata.xml"),
        )
        .with_file(
            &format!("{REMOTE}{CONFIG_PATH}"),
            fixture_bytes(&format!("ilirepo/24/{CONFIG_PATH}")),
        );
    state.source = REMOTE.to_owned();
}

#[when("metaconfigurations for KbS_LV95_V1_4 are requested")]
fn request_local(#[from(selection)] selection: &RefCell<Selection>) {
    selection.borrow_mut().request();
}

#[when("metaconfigurations for KbS_LV95_V1_4 are requested from it")]
fn request_remote(#[from(selection)] selection: &RefCell<Selection>) {
    selection.borrow_mut().request();
}

#[when("the first metaconfiguration file is fetched")]
fn fetch_first(#[from(selection)] selection: &RefCell<Selection>) {
    let mut state = selection.borrow_mut();
    let fetched = block_on(state.cache().fetch_file(state.config()))
        .unwrap_or_else(|err| panic!("fetch failed: {err}"));
    state.fetched = Some(fetched);
}

#[then("four metaconfigurations are listed")]
fn four_listed(#[from(selection)] selection: &RefCell<Selection>) {
    let state = selection.borrow();
    let mut ids = state.ids();
    ids.sort_unstable();
    assert_eq!(
        ids,
        [
            "ch.opengis.ili.config.KbS_LV95_V1_4_config_V1_0",
            "ch.opengis.ili.config.KbS_LV95_V1_4_config_V1_0-technical",
            "ch.opengis.ili.config.KbS_both_frames",
            "ch.sh.ili.config.KbS_LV95_V1_4_config_V1_0",
        ]
    );
    assert_eq!(state.config().model.as_deref(), Some(MODEL));
}

#[then("the entry without a tool code is not listed")]
fn without_tool_excluded(#[from(selection)] selection: &RefCell<Selection>) {
    let state = selection.borrow();
    assert!(!state.ids().iter().any(|id| id.ends_with("_without_tool")));
}

#[then("the entry for another tool is not listed")]
fn other_tool_excluded(#[from(selection)] selection: &RefCell<Selection>) {
    let state = selection.borrow();
    assert!(!state.ids().iter().any(|id| id.ends_with("_other_tool")));
}

#[then("the file is stored in the topping file cache")]
fn stored_in_cache(#[from(selection)] selection: &RefCell<Selection>) {
    let state = selection.borrow();
    let fetched = state
        .fetched
        .as_ref()
        .unwrap_or_else(|| panic!("file must be fetched first"));
    assert!(fetched.starts_with(utf8_dir(&state.cache_dir).join(FILES_DIR_NAME)));
    assert_eq!(fetched.file_name(), Some("opengisch_KbS_LV95_V1_4.ini"));
    let stored = fs::read(fetched).unwrap_or_else(|err| panic!("read {fetched}: {err}"));
    assert_eq!(stored, fixture_bytes(&format!("ilirepo/24/{CONFIG_PATH}")));
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/features/metaconfig_selection.feature");
    let contents = fs::read_to_string(&feature).unwrap_or_else(|err| {
        panic!("failed to read feature file {feature}: {err}");
    });
    let titles: Vec<String> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .map(|title| title.to_owned())
        .collect();
    assert_eq!(
        titles,
        [
            "only Model Baker metaconfigurations for the requested model are listed",
            "a remote metaconfiguration is downloaded on demand",
        ]
    );
}

#[scenario(path = "tests/features/metaconfig_selection.feature", index = 0)]
fn local_metaconfigs(selection: RefCell<Selection>) {
    let _ = selection;
}

#[scenario(path = "tests/features/metaconfig_selection.feature", index = 1)]
fn remote_metaconfig_download(selection: RefCell<Selection>) {
    let _ = selection;
}
