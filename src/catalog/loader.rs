use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::types::CatalogEntry;

use super::{Catalog, CatalogError, Track, build_catalog};

/// Reads and merges catalog files, then builds the catalog.
///
/// Files are merged in the given order. A track id present in several files
/// takes the entry of the last one but keeps the position it was first seen
/// at.
pub async fn load_catalog(paths: &[PathBuf]) -> Result<Catalog, CatalogError> {
    let mut merged: Map<String, Value> = Map::new();

    for path in paths {
        let content = async_fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;

        for (id, value) in parse_entries(&content, path)? {
            merged.insert(id, value);
        }
    }

    catalog_from_entries(merged)
}

/// Builds a catalog from a single JSON document.
pub fn parse_catalog(json: &str) -> Result<Catalog, CatalogError> {
    let entries = parse_entries(json, Path::new("<inline>"))?;
    catalog_from_entries(entries)
}

fn parse_entries(json: &str, path: &Path) -> Result<Map<String, Value>, CatalogError> {
    serde_json::from_str(json).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn catalog_from_entries(entries: Map<String, Value>) -> Result<Catalog, CatalogError> {
    let mut tracks = Vec::with_capacity(entries.len());

    for (id, value) in entries {
        let entry: CatalogEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                return Err(CatalogError::MalformedCatalogEntry {
                    id,
                    reason: e.to_string(),
                });
            }
        };
        tracks.push(Track::from_entry(id, entry));
    }

    build_catalog(tracks)
}
