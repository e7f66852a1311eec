//! Test helpers writing small local repositories to disk.

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

pub(super) const METACONFIG_ID: &str = "ch.opengis.ili.config.KbS_LV95_V1_4_config_V1_0";
pub(super) const TOPPING_ID: &str = "ilidata:ch.opengis.topping.kbs_polygon";
pub(super) const TOPPING_PATH: &str = "qml/kbs_polygon.qml";

const MODEL_INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TRANSFER xmlns="http://www.interlis.ch/INTERLIS2.3">
  <DATASECTION>
    <IliRepository20.RepositoryIndex BID="b1">
      <IliRepository20.RepositoryIndex.ModelMetadata TID="1">
        <Name>Units</Name>
        <Version>2012-02-20</Version>
      </IliRepository20.RepositoryIndex.ModelMetadata>
    </IliRepository20.RepositoryIndex>
  </DATASECTION>
</TRANSFER>
"#;

const ROADS_MODEL: &str = "INTERLIS 2.3;\n\
MODEL RoadsSimple (en) AT \"http://www.interlis.ch/models\"\n\
  VERSION \"2016-08-11\" =\n\
END RoadsSimple.\n";

const STANDALONE_MODEL: &str = "INTERLIS 2.3;\n\
MODEL Standalone (en) AT \"http://www.example.org\"\n\
  VERSION \"2024-01-01\" =\n\
END Standalone.\n";

const DATA_INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TRANSFER xmlns="http://www.interlis.ch/INTERLIS2.3">
  <DATASECTION>
    <DatasetIdx16.DataIndex BID="b1">
      <DatasetIdx16.DataIndex.DatasetMetadata TID="1">
        <id>ch.opengis.ili.config.KbS_LV95_V1_4_config_V1_0</id>
        <version>2021-01-06</version>
        <categories>
          <DatasetIdx16.Code_><value>http://codes.interlis.ch/type/metaconfig</value></DatasetIdx16.Code_>
          <DatasetIdx16.Code_><value>http://codes.opengis.ch/modelbaker</value></DatasetIdx16.Code_>
          <DatasetIdx16.Code_><value>http://codes.interlis.ch/model/KbS_LV95_V1_4</value></DatasetIdx16.Code_>
        </categories>
        <files>
          <DatasetIdx16.DataFile>
            <file><DatasetIdx16.File><path>metaconfig/kbs.ini</path></DatasetIdx16.File></file>
          </DatasetIdx16.DataFile>
        </files>
      </DatasetIdx16.DataIndex.DatasetMetadata>
      <DatasetIdx16.DataIndex.DatasetMetadata TID="2">
        <id>ch.opengis.topping.kbs_polygon</id>
        <version>2021-01-20</version>
        <categories>
          <DatasetIdx16.Code_><value>http://codes.interlis.ch/type/layertopping</value></DatasetIdx16.Code_>
        </categories>
        <files>
          <DatasetIdx16.DataFile>
            <file><DatasetIdx16.File><path>qml/kbs_polygon.qml</path></DatasetIdx16.File></file>
          </DatasetIdx16.DataFile>
        </files>
      </DatasetIdx16.DataIndex.DatasetMetadata>
    </DatasetIdx16.DataIndex>
  </DATASECTION>
</TRANSFER>
"#;

/// Write `contents` to `path`, creating parent directories.
pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    ilicache_fs::write_bytes(path, contents)
        .unwrap_or_else(|err| panic!("failed to write {path}: {err}"));
}

/// Temporary workspace with a model repository, a topping repository, a
/// standalone model file and a cache directory.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let workspace = Self { _dir: dir, root };
        write_utf8(
            &workspace.model_repository().join("ilimodels.xml"),
            MODEL_INDEX.as_bytes(),
        );
        write_utf8(
            &workspace.model_repository().join("RoadsSimple.ili"),
            ROADS_MODEL.as_bytes(),
        );
        write_utf8(&workspace.standalone_model(), STANDALONE_MODEL.as_bytes());
        let toppings = workspace.topping_repository();
        write_utf8(&toppings.join("ilidata.xml"), DATA_INDEX.as_bytes());
        write_utf8(&toppings.join("metaconfig/kbs.ini"), b"[CONFIGURATION]\n");
        write_utf8(&toppings.join(TOPPING_PATH), b"<qgis/>\n");
        workspace
    }

    pub(super) fn model_repository(&self) -> Utf8PathBuf {
        self.root.join("models")
    }

    pub(super) fn topping_repository(&self) -> Utf8PathBuf {
        self.root.join("toppings")
    }

    pub(super) fn standalone_model(&self) -> Utf8PathBuf {
        self.root.join("loose/Standalone.ili")
    }

    pub(super) fn cache_dir(&self) -> Utf8PathBuf {
        self.root.join("cache")
    }
}
