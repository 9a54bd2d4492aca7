//! Presentation-order resolution.
//!
//! A sheet's visual order is configuration, not discovery order. The
//! resolver maps an authored order onto the catalog: curated name lists
//! tolerate misses (the slot is dropped with a warning), permutations
//! are strict because an index mismatch would mis-place every later
//! slot silently.

use crate::asset::{Asset, GroupCatalog};
use crate::error::{PressError, Result};
use crate::validation::{Diagnostic, ValidationResult};

/// How a sheet's slots are ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSpec {
    /// Curated sequence of canonical names.
    Names(Vec<String>),
    /// 1-based positions into the filename-sorted group listing.
    Permutation(Vec<usize>),
    /// Ascending numeric identifier, the default.
    ById,
}

/// Resolve a group's assets into slot order.
///
/// `pad_to` extends the tail with empty slots up to a fixed count so a
/// partially filled grid still renders at full size; it never truncates
/// resolved entries.
pub fn resolve<'a>(
    group: &'a GroupCatalog,
    spec: &OrderSpec,
    pad_to: Option<usize>,
    warnings: &mut ValidationResult,
) -> Result<Vec<Option<&'a Asset>>> {
    let mut slots: Vec<Option<&Asset>> = match spec {
        OrderSpec::Names(names) => {
            let mut slots = Vec::with_capacity(names.len());
            for name in names {
                match group.get(name) {
                    Some(asset) => slots.push(Some(asset)),
                    None => warnings.push(
                        Diagnostic::warning(
                            "iconpress::order::no-match",
                            format!("order entry '{name}' matches no discovered asset"),
                        )
                        .with_help("check the name against the group's canonical names"),
                    ),
                }
            }
            slots
        }
        OrderSpec::Permutation(positions) => {
            let listing = group.sorted_by_filename();
            let mut slots = Vec::with_capacity(positions.len());
            for &position in positions {
                if position == 0 || position > listing.len() {
                    return Err(PressError::Order {
                        message: format!(
                            "permutation position {position} is out of range for a listing of {}",
                            listing.len()
                        ),
                        help: Some(
                            "positions are 1-based indexes into the filename-sorted listing"
                                .to_string(),
                        ),
                    });
                }
                slots.push(Some(listing[position - 1]));
            }
            slots
        }
        OrderSpec::ById => group.sorted_by_id().into_iter().map(Some).collect(),
    };

    if let Some(total) = pad_to {
        while slots.len() < total {
            slots.push(None);
        }
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{IconCatalog, SourceAsset};
    use image::RgbaImage;
    use std::path::Path;

    fn catalog(filenames: &[&str]) -> IconCatalog {
        let assets = filenames
            .iter()
            .map(|name| {
                SourceAsset::from_path(Path::new(name))
                    .unwrap()
                    .with_raster(RgbaImage::new(1, 1))
            })
            .collect();
        IconCatalog::from_assets(assets).unwrap()
    }

    fn names(list: &[&str]) -> OrderSpec {
        OrderSpec::Names(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_names_mode_skips_misses_with_warnings() {
        let catalog = catalog(&[
            "spellbook_fire_0x0001.bmp",
            "spellbook_ice_0x0002.bmp",
            "spellbook_heal_0x0003.bmp",
            "spellbook_haste_0x0004.bmp",
            "spellbook_slow_0x0005.bmp",
            "spellbook_shield_0x0006.bmp",
            "spellbook_drain_0x0007.bmp",
        ]);
        let group = catalog.group("spellbook").unwrap();
        let order = names(&[
            "fire", "missing_a", "ice", "heal", "haste", "missing_b", "slow", "shield",
            "missing_c", "drain",
        ]);

        let mut warnings = ValidationResult::new();
        let slots = resolve(group, &order, None, &mut warnings).unwrap();

        assert_eq!(slots.len(), 7);
        assert!(slots.iter().all(Option::is_some));
        assert_eq!(warnings.warning_count(), 3);
        let resolved: Vec<&str> = slots
            .iter()
            .flatten()
            .map(|a| a.canonical_name.as_str())
            .collect();
        assert_eq!(
            resolved,
            ["fire", "ice", "heal", "haste", "slow", "shield", "drain"]
        );
    }

    #[test]
    fn test_names_mode_pads_to_fixed_count() {
        let catalog = catalog(&["spellbook_fire_0x0001.bmp"]);
        let group = catalog.group("spellbook").unwrap();

        let mut warnings = ValidationResult::new();
        let slots = resolve(group, &names(&["fire"]), Some(15), &mut warnings).unwrap();

        assert_eq!(slots.len(), 15);
        assert!(slots[0].is_some());
        assert!(slots[1..].iter().all(Option::is_none));
    }

    #[test]
    fn test_pad_to_never_truncates() {
        let catalog = catalog(&[
            "spellbook_fire_0x0001.bmp",
            "spellbook_ice_0x0002.bmp",
            "spellbook_heal_0x0003.bmp",
        ]);
        let group = catalog.group("spellbook").unwrap();

        let mut warnings = ValidationResult::new();
        let slots = resolve(
            group,
            &names(&["fire", "ice", "heal"]),
            Some(2),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn test_permutation_reindexes_sorted_listing() {
        let catalog = catalog(&[
            "items_sword_0x0001.bmp",
            "items_axe_0x0002.bmp",
            "items_bow_0x0003.bmp",
        ]);
        let group = catalog.group("items").unwrap();

        // Filename-sorted listing: axe, bow, sword.
        let mut warnings = ValidationResult::new();
        let slots = resolve(
            group,
            &OrderSpec::Permutation(vec![3, 1, 2]),
            None,
            &mut warnings,
        )
        .unwrap();

        let resolved: Vec<&str> = slots
            .iter()
            .flatten()
            .map(|a| a.canonical_name.as_str())
            .collect();
        assert_eq!(resolved, ["sword", "axe", "bow"]);
        assert!(warnings.is_ok());
    }

    #[test]
    fn test_permutation_out_of_range_is_fatal() {
        let catalog = catalog(&["items_sword_0x0001.bmp"]);
        let group = catalog.group("items").unwrap();

        let mut warnings = ValidationResult::new();
        let err = resolve(
            group,
            &OrderSpec::Permutation(vec![1, 2]),
            None,
            &mut warnings,
        )
        .unwrap_err();
        assert!(matches!(err, PressError::Order { .. }));
    }

    #[test]
    fn test_permutation_rejects_position_zero() {
        let catalog = catalog(&["items_sword_0x0001.bmp"]);
        let group = catalog.group("items").unwrap();

        let mut warnings = ValidationResult::new();
        assert!(resolve(
            group,
            &OrderSpec::Permutation(vec![0]),
            None,
            &mut warnings
        )
        .is_err());
    }

    #[test]
    fn test_default_order_is_ascending_id() {
        let catalog = catalog(&[
            "items_zeta_0x0001.bmp",
            "items_alpha_0x0003.bmp",
            "items_mid_0x0002.bmp",
        ]);
        let group = catalog.group("items").unwrap();

        let mut warnings = ValidationResult::new();
        let slots = resolve(group, &OrderSpec::ById, None, &mut warnings).unwrap();
        let ids: Vec<u32> = slots.iter().flatten().map(|a| a.numeric_id).collect();
        assert_eq!(ids, [1, 2, 3]);
    }
}
