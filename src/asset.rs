//! Asset model and the in-memory catalog built from a scan.
//!
//! A [`SourceAsset`] is a parsed-but-undecoded file reference; decoding
//! turns it into an [`Asset`] carrying an RGBA raster. Decoded assets are
//! collected into an [`IconCatalog`], grouped by their category prefix and
//! keyed by canonical name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::{PressError, Result};
use crate::naming;

/// A discovered source file whose name parses into the asset convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAsset {
    pub path: PathBuf,
    pub raw_filename: String,
    pub group: String,
    pub canonical_name: String,
    pub numeric_id: u32,
}

impl SourceAsset {
    /// Parse a path's filename into a source asset. Returns `None` when
    /// the filename does not follow the `<group>_<name>_0x<HEX>` form.
    pub fn from_path(path: &Path) -> Option<Self> {
        let raw_filename = path.file_name()?.to_str()?.to_string();
        let (stem, _) = naming::split_extension(&raw_filename);
        let parsed = naming::parse_stem(stem)?;
        Some(Self {
            group: parsed.group.to_string(),
            canonical_name: parsed.canonical.to_string(),
            numeric_id: parsed.id,
            path: path.to_path_buf(),
            raw_filename,
        })
    }

    /// Attach a decoded raster, producing a catalog-ready asset.
    pub fn with_raster(self, raster: RgbaImage) -> Asset {
        Asset {
            raw_filename: self.raw_filename,
            group: self.group,
            canonical_name: self.canonical_name,
            numeric_id: self.numeric_id,
            raster,
        }
    }
}

/// A decoded asset, immutable once constructed.
#[derive(Debug, Clone)]
pub struct Asset {
    pub raw_filename: String,
    pub group: String,
    pub canonical_name: String,
    pub numeric_id: u32,
    pub raster: RgbaImage,
}

impl Asset {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }
}

/// All decoded assets sharing one group prefix, keyed by canonical name.
#[derive(Debug, Clone, Default)]
pub struct GroupCatalog {
    assets: BTreeMap<String, Asset>,
}

impl GroupCatalog {
    pub fn get(&self, canonical_name: &str) -> Option<&Asset> {
        self.assets.get(canonical_name)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    /// Assets sorted by raw filename. Permutation-mode ordering indexes
    /// into this listing, so it must not depend on discovery order.
    pub fn sorted_by_filename(&self) -> Vec<&Asset> {
        let mut assets: Vec<&Asset> = self.assets.values().collect();
        assets.sort_by(|a, b| a.raw_filename.cmp(&b.raw_filename));
        assets
    }

    /// Assets sorted by numeric identifier, the default presentation order.
    pub fn sorted_by_id(&self) -> Vec<&Asset> {
        let mut assets: Vec<&Asset> = self.assets.values().collect();
        assets.sort_by_key(|a| a.numeric_id);
        assets
    }

    /// Smallest and largest identifier in the group.
    pub fn id_range(&self) -> Option<(u32, u32)> {
        let mut ids = self.assets.values().map(|a| a.numeric_id);
        let first = ids.next()?;
        let (mut lo, mut hi) = (first, first);
        for id in ids {
            lo = lo.min(id);
            hi = hi.max(id);
        }
        Some((lo, hi))
    }
}

/// Decoded assets for a whole scan, grouped by category prefix.
#[derive(Debug, Clone, Default)]
pub struct IconCatalog {
    groups: BTreeMap<String, GroupCatalog>,
}

impl IconCatalog {
    /// Build a catalog from decoded assets.
    ///
    /// Duplicate canonical names or duplicate numeric identifiers within
    /// a group are an authoring error. All conflicts are collected and
    /// reported together rather than letting scan order pick a winner.
    pub fn from_assets(assets: Vec<Asset>) -> Result<Self> {
        let mut groups: BTreeMap<String, GroupCatalog> = BTreeMap::new();
        let mut ids_seen: BTreeMap<(String, u32), String> = BTreeMap::new();
        let mut conflicts = Vec::new();

        for asset in assets {
            let id_key = (asset.group.clone(), asset.numeric_id);
            if let Some(existing) = ids_seen.get(&id_key) {
                conflicts.push(format!(
                    "duplicate id 0x{:04X} in group '{}' ({} and {})",
                    asset.numeric_id, asset.group, existing, asset.raw_filename
                ));
                continue;
            }
            let group = groups.entry(asset.group.clone()).or_default();
            if let Some(existing) = group.assets.get(&asset.canonical_name) {
                conflicts.push(format!(
                    "duplicate name '{}' in group '{}' ({} and {})",
                    asset.canonical_name, asset.group, existing.raw_filename, asset.raw_filename
                ));
                continue;
            }
            ids_seen.insert(id_key, asset.raw_filename.clone());
            group.assets.insert(asset.canonical_name.clone(), asset);
        }

        if !conflicts.is_empty() {
            return Err(PressError::Catalog {
                message: conflicts.join("; "),
                help: Some(
                    "rename the conflicting files so each name and id appears once per group"
                        .to_string(),
                ),
            });
        }
        Ok(Self { groups })
    }

    pub fn group(&self, name: &str) -> Option<&GroupCatalog> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&String, &GroupCatalog)> {
        self.groups.iter()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total asset count across all groups.
    pub fn asset_count(&self) -> usize {
        self.groups.values().map(GroupCatalog::len).sum()
    }
}
