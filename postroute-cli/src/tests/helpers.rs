//! Fixture files shared by the route command tests.

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Points dataset mirroring `postroute_core::test_support::sample_dataset`.
pub(super) const POINTS_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [23.5899, 46.7712]},
     "properties": {"postcode": "400001", "address": "Strada Memorandumului 28", "city": "Cluj-Napoca"}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [23.5921, 46.7695]},
     "properties": {"postcode": "400001", "address": "Piata Unirii 1", "city": "Cluj-Napoca"}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [23.6236, 46.7784]},
     "properties": {"postcode": "400002", "address": "Strada Traian Vuia 149", "city": "Cluj-Napoca"}},
    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [23.5546, 46.7538]},
     "properties": {"postcode": "400003", "address": "Strada Fabricii 1", "city": "Floresti"}}
  ]
}"#;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    postroute_fs::write_file(path, contents).expect("write fixture file");
}

/// Temporary workspace holding a points dataset.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        write_utf8(&root.join("points.geojson"), POINTS_GEOJSON.as_bytes());
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn points(&self) -> Utf8PathBuf {
        self.root.join("points.geojson")
    }
}
