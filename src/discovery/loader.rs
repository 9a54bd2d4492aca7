//! Asset loader - decodes discovered files into a catalog.
//!
//! Takes scan results, runs every source through the decoder stack,
//! and groups the decoded assets.

use crate::asset::IconCatalog;
use crate::decode::DecoderStack;
use crate::error::Result;
use crate::validation::{Diagnostic, ValidationResult};

use super::scanner::ScanResult;

/// Decode every discovered asset and build the catalog.
///
/// A decode failure only costs that one asset: it becomes a warning
/// and the file is left out. Duplicate names or ids within a group
/// are fatal.
pub fn load_assets(
    scan: &ScanResult,
    decoders: &DecoderStack,
    warnings: &mut ValidationResult,
) -> Result<IconCatalog> {
    let mut assets = Vec::new();

    for source in &scan.sources {
        match decoders.decode(&source.path) {
            Ok(raster) => assets.push(source.clone().with_raster(raster)),
            Err(e) => warnings.push(
                Diagnostic::warning(
                    "iconpress::decode::failed",
                    format!("could not decode {}: {}", source.path.display(), e),
                )
                .with_help("the asset is left out of every sheet"),
            ),
        }
    }

    IconCatalog::from_assets(assets)
}
