//! Project manifest (sheets.yaml) parsing.
//!
//! The manifest defines project configuration: source paths to scan,
//! the output directory, decode extensions, intermediate cleanup
//! settings, and the list of sheet plans to compose.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compose::LayoutSpec;
use crate::convert::CompressSpec;
use crate::error::{PressError, Result};
use crate::order::OrderSpec;
use crate::workdir;

/// Project manifest loaded from sheets.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Source directories to scan for assets.
    /// Defaults to current directory if empty.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Output directory for composed sheets.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Filename extensions considered during discovery.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Patterns to exclude from discovery.
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Scale factor applied to final sheets.
    #[serde(default)]
    pub scale: Option<u32>,

    /// Seconds to wait before sweeping intermediates after a build.
    #[serde(default)]
    pub cleanup_grace_secs: u64,

    /// Leave intermediate canvases on disk after a build.
    #[serde(default)]
    pub keep_intermediates: bool,

    /// Filename patterns swept from the output directory after a build.
    #[serde(default = "default_cleanup_patterns")]
    pub cleanup_patterns: Vec<String>,

    /// External texture compression applied to final sheets.
    #[serde(default)]
    pub compress: Option<CompressSpec>,

    /// Sheets to compose.
    #[serde(default)]
    pub sheets: Vec<SheetPlan>,
}

/// One sheet's plan: which group it draws from, its grid geometry,
/// and how its slots are ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetPlan {
    /// Sheet name, used for output and intermediate filenames.
    pub name: String,

    /// Asset group to draw from. Defaults to the sheet name.
    #[serde(default)]
    pub group: Option<String>,

    /// Width of each grid cell in pixels.
    #[serde(default = "default_item_size")]
    pub item_width: u32,

    /// Height of each grid cell in pixels.
    #[serde(default = "default_item_size")]
    pub item_height: u32,

    /// Cells per row.
    #[serde(default = "default_columns")]
    pub columns: u32,

    /// Rows per row-group. When absent all rows form one group.
    #[serde(default)]
    pub rows: Option<u32>,

    /// Horizontal padding between cells.
    #[serde(default = "default_item_padding")]
    pub item_padding: u32,

    /// Vertical padding between rows.
    #[serde(default = "default_item_padding")]
    pub row_padding: u32,

    /// Horizontal padding between row-groups.
    #[serde(default = "default_group_padding")]
    pub group_padding: u32,

    /// Pad the resolved slot list with blanks up to this count.
    #[serde(default)]
    pub pad_to: Option<usize>,

    /// Present assets by canonical name, in this order.
    #[serde(default)]
    pub order: Option<Vec<String>>,

    /// Present assets by 1-based position in the filename-sorted listing.
    #[serde(default)]
    pub permutation: Option<Vec<usize>>,

    /// Index element composed beside the grid.
    #[serde(default)]
    pub index: Option<IndexPlan>,

    /// Output filename. Defaults to `<name>.png`.
    #[serde(default)]
    pub output: Option<String>,

    /// Also write a JSON slot map next to the sheet.
    #[serde(default)]
    pub slot_map: bool,
}

/// The index element of a sheet plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexPlan {
    /// Canonical name of the index asset within the group.
    pub name: String,

    /// Padding between the index element and the grid.
    #[serde(default = "default_item_padding")]
    pub padding: u32,
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

fn default_extensions() -> Vec<String> {
    ["png", "bmp", "tga", "psd"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_cleanup_patterns() -> Vec<String> {
    vec![format!("{}*.png", workdir::INTERMEDIATE_PREFIX)]
}

fn default_item_size() -> u32 {
    44
}

fn default_columns() -> u32 {
    8
}

fn default_item_padding() -> u32 {
    5
}

fn default_group_padding() -> u32 {
    10
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            sources: vec![],
            output: default_output(),
            extensions: default_extensions(),
            excludes: vec![],
            scale: None,
            cleanup_grace_secs: 0,
            keep_intermediates: false,
            cleanup_patterns: default_cleanup_patterns(),
            compress: None,
            sheets: vec![],
        }
    }
}

impl Manifest {
    /// Load manifest from a sheets.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PressError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse manifest from YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| PressError::Plan {
            message: format!("Invalid manifest: {}", e),
            help: Some("Check sheets.yaml syntax".to_string()),
        })
    }

    /// Check if a path should be excluded based on exclude patterns.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.excludes
            .iter()
            .any(|pattern| path_matches(&path_str, pattern))
    }

    /// Check if a filename extension is in the discovery set.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Get effective source paths, defaulting to current directory.
    pub fn effective_sources(&self) -> Vec<String> {
        if self.sources.is_empty() {
            vec![".".to_string()]
        } else {
            self.sources.clone()
        }
    }

    /// Get the effective scale factor.
    pub fn effective_scale(&self) -> u32 {
        self.scale.unwrap_or(1).max(1)
    }
}

/// Path-level glob matching for exclude patterns.
///
/// `**/dir/*` matches anything inside `dir` at any depth, `dir/*`
/// matches directory contents, a bare `*`-pattern matches against the
/// final path segment, and anything else matches a whole segment.
fn path_matches(path: &str, pattern: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix("**/") {
        if let Some(dir) = suffix.strip_suffix("/*") {
            return path.split('/').any(|seg| seg == dir) && !path.ends_with(dir);
        }
        return path
            .split('/')
            .any(|seg| workdir::matches_pattern(seg, suffix));
    }
    if let Some(dir) = pattern.strip_suffix("/*") {
        return path.starts_with(&format!("{}/", dir)) || path.contains(&format!("/{}/", dir));
    }
    if pattern.contains('*') {
        return path
            .rsplit('/')
            .next()
            .is_some_and(|name| workdir::matches_pattern(name, pattern));
    }
    path.split('/').any(|seg| seg == pattern)
}

impl SheetPlan {
    /// The asset group this sheet draws from.
    pub fn group_name(&self) -> &str {
        self.group.as_deref().unwrap_or(&self.name)
    }

    /// The plan's grid geometry as a layout value.
    pub fn layout(&self) -> LayoutSpec {
        LayoutSpec {
            columns: self.columns,
            rows: self.rows,
            item_width: self.item_width,
            item_height: self.item_height,
            item_padding: self.item_padding,
            row_padding: self.row_padding,
            group_padding: self.group_padding,
        }
    }

    /// The plan's presentation order.
    pub fn order_spec(&self) -> OrderSpec {
        if let Some(names) = &self.order {
            OrderSpec::Names(names.clone())
        } else if let Some(positions) = &self.permutation {
            OrderSpec::Permutation(positions.clone())
        } else {
            OrderSpec::ById
        }
    }

    /// The output filename for this sheet.
    pub fn output_filename(&self) -> String {
        self.output
            .clone()
            .unwrap_or_else(|| format!("{}.png", self.name))
    }
}

impl Default for SheetPlan {
    fn default() -> Self {
        Self {
            name: String::new(),
            group: None,
            item_width: default_item_size(),
            item_height: default_item_size(),
            columns: default_columns(),
            rows: None,
            item_padding: default_item_padding(),
            row_padding: default_item_padding(),
            group_padding: default_group_padding(),
            pad_to: None,
            order: None,
            permutation: None,
            index: None,
            output: None,
            slot_map: false,
        }
    }
}
