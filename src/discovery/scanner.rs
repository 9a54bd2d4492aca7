//! File system scanner for discovering source assets.
//!
//! Recursively walks the configured source directories and collects
//! every file whose extension is in the discovery set and whose name
//! follows the `<group>_<name>_0x<HEX>.<ext>` convention.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::asset::SourceAsset;
use crate::naming;

use super::manifest::Manifest;

/// Result of scanning the source directories.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Discovered convention-named asset files.
    pub sources: Vec<SourceAsset>,
    /// Candidate files whose names do not follow the convention.
    pub skipped: Vec<PathBuf>,
}

impl ScanResult {
    /// Create a new empty scan result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of discovered assets.
    pub fn total(&self) -> usize {
        self.sources.len()
    }

    /// Check if no assets were discovered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Asset counts per group, sorted by group name.
    pub fn group_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for source in &self.sources {
            *counts.entry(source.group.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Discovered assets belonging to one group.
    pub fn group_sources(&self, group: &str) -> Vec<&SourceAsset> {
        self.sources.iter().filter(|s| s.group == group).collect()
    }

    /// Merge another scan result into this one.
    pub fn merge(&mut self, other: ScanResult) {
        self.sources.extend(other.sources);
        self.skipped.extend(other.skipped);
    }

    /// Sort both lists by path for stable presentation.
    pub fn sort(&mut self) {
        self.sources.sort_by(|a, b| a.path.cmp(&b.path));
        self.skipped.sort();
    }
}

/// Scan a directory for convention-named asset files.
///
/// Files with an accepted extension that do not parse as
/// `<group>_<name>_0x<HEX>` are recorded as skipped rather than
/// discarded, so callers can report them.
pub fn scan_directory(root: &Path, manifest: &Manifest) -> ScanResult {
    let mut result = ScanResult::new();

    if !root.exists() {
        return result;
    }

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        // Skip directories
        if path.is_dir() {
            continue;
        }

        // Skip excluded paths
        if manifest.is_excluded(path) {
            continue;
        }

        if !has_accepted_extension(path, manifest) {
            continue;
        }

        match SourceAsset::from_path(path) {
            Some(source) => result.sources.push(source),
            None => result.skipped.push(path.to_path_buf()),
        }
    }

    result
}

/// Scan multiple source paths.
pub fn scan_sources(sources: &[String], base_path: &Path, manifest: &Manifest) -> ScanResult {
    let mut result = ScanResult::new();

    for source in sources {
        let source_path = if Path::new(source).is_absolute() {
            PathBuf::from(source)
        } else {
            base_path.join(source)
        };

        let scan = scan_directory(&source_path, manifest);
        result.merge(scan);
    }

    result.sort();
    result
}

fn has_accepted_extension(path: &Path, manifest: &Manifest) -> bool {
    let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let (_, ext) = naming::split_extension(filename);
    ext.is_some_and(|e| manifest.accepts_extension(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_scan_empty_directory() {
        let dir = tempdir().unwrap();
        let manifest = Manifest::default();

        let result = scan_directory(dir.path(), &manifest);

        assert!(result.is_empty());
        assert_eq!(result.total(), 0);
    }

    #[test]
    fn test_scan_with_assets() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("spellbook_fire_0x0001.png"), b"x").unwrap();
        fs::write(dir.path().join("spellbook_ice_0x0002.png"), b"x").unwrap();
        fs::write(dir.path().join("items_sword_0x08C0.bmp"), b"x").unwrap();
        fs::write(dir.path().join("readme.md"), "# Readme").unwrap();

        let manifest = Manifest::default();
        let result = scan_directory(dir.path(), &manifest);

        assert_eq!(result.total(), 3);
        assert!(result.skipped.is_empty());

        let counts = result.group_counts();
        assert_eq!(counts.get("spellbook"), Some(&2));
        assert_eq!(counts.get("items"), Some(&1));
    }

    #[test]
    fn test_scan_records_unparseable_names() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("spellbook_fire_0x0001.png"), b"x").unwrap();
        fs::write(dir.path().join("thumbnail.png"), b"x").unwrap();

        let manifest = Manifest::default();
        let result = scan_directory(dir.path(), &manifest);

        assert_eq!(result.total(), 1);
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].ends_with("thumbnail.png"));
    }

    #[test]
    fn test_scan_recursive() {
        let dir = tempdir().unwrap();

        fs::create_dir_all(dir.path().join("art/icons")).unwrap();
        fs::write(dir.path().join("art/icons/items_axe_0x0003.png"), b"x").unwrap();

        let manifest = Manifest::default();
        let result = scan_directory(dir.path(), &manifest);

        assert_eq!(result.total(), 1);
        assert_eq!(result.sources[0].group, "items");
    }

    #[test]
    fn test_scan_with_excludes() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("items_axe_0x0003.png"), b"x").unwrap();
        fs::write(dir.path().join("items_old_axe_0x0004.png"), b"x").unwrap();

        let manifest = Manifest {
            excludes: vec!["items_old*".to_string()],
            ..Default::default()
        };

        let result = scan_directory(dir.path(), &manifest);

        assert_eq!(result.total(), 1);
        assert_eq!(result.sources[0].canonical_name, "axe");
    }

    #[test]
    fn test_scan_extension_filter_ignores_case() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("items_axe_0x0003.PNG"), b"x").unwrap();
        fs::write(dir.path().join("items_bow_0x0004.txt"), b"x").unwrap();

        let manifest = Manifest::default();
        let result = scan_directory(dir.path(), &manifest);

        assert_eq!(result.total(), 1);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_scan_sources_sorts_by_path() {
        let dir = tempdir().unwrap();

        fs::write(dir.path().join("items_bow_0x0004.png"), b"x").unwrap();
        fs::write(dir.path().join("items_axe_0x0003.png"), b"x").unwrap();

        let manifest = Manifest::default();
        let result = scan_sources(&[".".to_string()], dir.path(), &manifest);

        assert_eq!(result.total(), 2);
        assert!(result.sources[0].path < result.sources[1].path);
    }

    #[test]
    fn test_scan_nonexistent_directory() {
        let manifest = Manifest::default();
        let result = scan_directory(Path::new("/nonexistent/path"), &manifest);

        assert!(result.is_empty());
    }

    #[test]
    fn test_scan_result_merge() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("items_axe_0x0003.png"), b"x").unwrap();

        let manifest = Manifest::default();
        let mut a = scan_directory(dir.path(), &manifest);
        let b = scan_directory(dir.path(), &manifest);

        a.merge(b);
        assert_eq!(a.total(), 2);
    }
}
