//! Route table: one static-serving prefix per distinct shared directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ApiError, StartupError};
use crate::hash::{route_hash, route_prefix, FOLDER_ROUTE_BASE};

/// One HTTP path prefix bound to exactly one directory for static serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub hash: String,
    pub route_prefix: String,
    pub directory: PathBuf,
}

/// The immutable set of route bindings, computed once at startup.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

/// One row of the `/share` page, regenerated on every request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShareItem {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Resolve a shared path to the directory that owns its route: the path
/// itself for directories, the parent for files.
fn owning_directory(path: &Path) -> Result<PathBuf, StartupError> {
    let meta = fs::symlink_metadata(path).map_err(|source| StartupError::PathNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    if meta.is_file() {
        Ok(path.parent().unwrap_or(Path::new("/")).to_path_buf())
    } else {
        Ok(path.to_path_buf())
    }
}

impl RouteTable {
    /// Stat every shared path and derive the distinct directory routes.
    ///
    /// Deduplication keeps first-seen order so route registration is
    /// deterministic. A missing path is fatal: the server must not start.
    pub fn build(paths: &[PathBuf]) -> Result<Self, StartupError> {
        let mut entries: Vec<RouteEntry> = Vec::new();
        for path in paths {
            let directory = owning_directory(path)?;
            if entries.iter().any(|entry| entry.directory == directory) {
                continue;
            }
            let hash = route_hash(&directory);
            entries.push(RouteEntry {
                route_prefix: format!("{FOLDER_ROUTE_BASE}/{hash}"),
                hash,
                directory,
            });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }
}

/// Build the `/share` listing. Stats every path freshly so the page
/// reflects the current filesystem state, not the one seen at startup.
pub fn build_listing(paths: &[PathBuf]) -> Result<Vec<ShareItem>, ApiError> {
    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        let meta = fs::symlink_metadata(path)?;
        let is_file = meta.is_file();

        let base_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let kind = if is_file {
            path.extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .unwrap_or_default()
        } else {
            "folder".to_string()
        };

        let prefix = if is_file {
            route_prefix(path.parent().unwrap_or(Path::new("/")))
        } else {
            route_prefix(path)
        };

        let (name, url) = if is_file {
            (base_name.clone(), format!("{prefix}/{base_name}"))
        } else {
            (format!("{base_name}/"), format!("{prefix}/"))
        };

        items.push(ShareItem { name, url, kind });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_dedups_file_and_parent() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "a").unwrap();

        // the file's parent and the directory itself are one route
        let table = RouteTable::build(&[file, dir.path().to_path_buf()]).unwrap();
        assert_eq!(table.entries().len(), 1);
        assert_eq!(table.entries()[0].directory, dir.path());
    }

    #[test]
    fn test_build_distinct_directories_distinct_hashes() {
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();

        let table =
            RouteTable::build(&[one.path().to_path_buf(), two.path().to_path_buf()]).unwrap();
        assert_eq!(table.entries().len(), 2);
        assert_ne!(table.entries()[0].hash, table.entries()[1].hash);
        // first-seen order is preserved
        assert_eq!(table.entries()[0].directory, one.path());
    }

    #[test]
    fn test_build_missing_path_is_fatal() {
        let result = RouteTable::build(&[PathBuf::from("/definitely/not/here")]);
        match result {
            Err(StartupError::PathNotFound { path, .. }) => {
                assert_eq!(path, PathBuf::from("/definitely/not/here"));
            }
            other => panic!("expected PathNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_listing_file_url_joins_parent_prefix() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.TXT");
        std::fs::write(&file, "hi").unwrap();

        let items = build_listing(&[file]).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "notes.TXT");
        assert_eq!(items[0].kind, "txt");
        assert_eq!(
            items[0].url,
            format!("{}/notes.TXT", route_prefix(dir.path()))
        );
    }

    #[test]
    fn test_listing_directory_url_has_empty_suffix() {
        let dir = TempDir::new().unwrap();

        let items = build_listing(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(items[0].kind, "folder");
        assert!(items[0].name.ends_with('/'));
        assert_eq!(items[0].url, format!("{}/", route_prefix(dir.path())));
    }

    #[test]
    fn test_listing_reflects_current_state() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("late.log");
        std::fs::write(&file, "x").unwrap();

        // deleting the file between requests surfaces as NotFound
        std::fs::remove_file(&file).unwrap();
        assert!(matches!(
            build_listing(&[file]),
            Err(ApiError::NotFound(_))
        ));
    }
}
