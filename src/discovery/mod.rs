//! Asset discovery and loading.
//!
//! This module handles finding convention-named source images in a
//! project directory, either by scanning the directory itself or by
//! following the source list in a `sheets.yaml` manifest, and decoding
//! them into a catalog.
//!
//! # Example
//!
//! ```ignore
//! use iconpress::discovery::discover;
//! use iconpress::validation::ValidationResult;
//!
//! let result = discover("./my-project")?;
//! println!("Found {} assets", result.scan.total());
//!
//! let mut warnings = ValidationResult::new();
//! let catalog = result.into_catalog(&mut warnings)?;
//! ```

mod loader;
mod manifest;
mod scanner;

use std::path::{Path, PathBuf};

use crate::asset::{IconCatalog, SourceAsset};
use crate::decode::DecoderStack;
use crate::error::Result;
use crate::validation::ValidationResult;

pub use loader::load_assets;
pub use manifest::{IndexPlan, Manifest, SheetPlan};
pub use scanner::{scan_directory, scan_sources, ScanResult};

/// The name of the manifest file.
pub const MANIFEST_FILENAME: &str = "sheets.yaml";

/// Result of discovering assets in a project.
#[derive(Debug)]
pub struct DiscoveryResult {
    /// The project root directory.
    pub root: PathBuf,

    /// The loaded manifest (may be default if no sheets.yaml found).
    pub manifest: Manifest,

    /// Whether a sheets.yaml manifest was found.
    pub has_manifest: bool,

    /// Scan results with discovered files.
    pub scan: ScanResult,
}

impl DiscoveryResult {
    /// Decode all discovered assets into a catalog.
    pub fn into_catalog(self, warnings: &mut ValidationResult) -> Result<IconCatalog> {
        self.into_catalog_with(&DecoderStack::standard(), warnings)
    }

    /// Decode all discovered assets with a custom decoder stack.
    pub fn into_catalog_with(
        self,
        decoders: &DecoderStack,
        warnings: &mut ValidationResult,
    ) -> Result<IconCatalog> {
        load_assets(&self.scan, decoders, warnings)
    }
}

/// Discover assets in a project directory.
///
/// Looks for a `sheets.yaml` manifest in the root directory. If found,
/// scans the manifest's source paths. Otherwise, scans the whole
/// directory for convention-named files.
pub fn discover(root: impl AsRef<Path>) -> Result<DiscoveryResult> {
    let root = root.as_ref().to_path_buf();

    // Look for manifest
    let manifest_path = root.join(MANIFEST_FILENAME);
    let (manifest, has_manifest) = if manifest_path.exists() {
        (Manifest::load(&manifest_path)?, true)
    } else {
        (Manifest::default(), false)
    };

    // Scan for assets
    let sources = manifest.effective_sources();
    let scan = scan_sources(&sources, &root, &manifest);

    Ok(DiscoveryResult {
        root,
        manifest,
        has_manifest,
        scan,
    })
}

/// Discover assets from specific paths (no manifest lookup).
///
/// Directories are scanned recursively; files are taken as-is when
/// their name follows the convention.
pub fn discover_paths(paths: &[PathBuf]) -> Result<DiscoveryResult> {
    let manifest = Manifest::default();
    let mut scan = ScanResult::new();

    for path in paths {
        if path.is_dir() {
            let dir_scan = scan_directory(path, &manifest);
            scan.merge(dir_scan);
        } else if path.is_file() {
            match SourceAsset::from_path(path) {
                Some(source) => scan.sources.push(source),
                None => scan.skipped.push(path.clone()),
            }
        }
    }
    scan.sort();

    let root = paths
        .first()
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(DiscoveryResult {
        root,
        manifest,
        has_manifest: false,
        scan,
    })
}
