//! Validation checks for sheet plans and scan results.
//!
//! Each check returns a `ValidationResult`; plan geometry problems and
//! unresolvable references are errors, while conditions the build can
//! recover from (an order entry with no match, a skipped file) are
//! warnings.

use std::collections::{HashMap, HashSet};

use crate::discovery::{Manifest, ScanResult, SheetPlan};
use crate::workdir;

use super::warning::{Diagnostic, ValidationResult};

/// Check plan geometry and plan-level consistency.
pub fn check_plans(manifest: &Manifest) -> ValidationResult {
    let mut result = ValidationResult::new();

    if manifest.sheets.is_empty() {
        result.push(
            Diagnostic::warning(
                "iconpress::validate::no-sheets",
                "No sheets configured in the manifest",
            )
            .with_help("Add a `sheets:` list to sheets.yaml"),
        );
    }

    let mut seen_names: HashSet<&str> = HashSet::new();
    for plan in &manifest.sheets {
        if plan.name.is_empty() {
            result.push(
                Diagnostic::error(
                    "iconpress::validate::unnamed-sheet",
                    "A sheet plan has no name",
                )
                .with_help("Every sheet needs a `name:` entry"),
            );
            continue;
        }
        if !seen_names.insert(&plan.name) {
            result.push(Diagnostic::error(
                "iconpress::validate::duplicate-sheet",
                format!("Sheet '{}' is defined more than once", plan.name),
            ));
        }

        if plan.columns == 0 {
            result.push(
                Diagnostic::error(
                    "iconpress::validate::zero-columns",
                    format!("Sheet '{}' has zero columns", plan.name),
                )
                .with_help("Set columns to at least 1"),
            );
        }
        if plan.rows == Some(0) {
            result.push(
                Diagnostic::error(
                    "iconpress::validate::zero-rows",
                    format!("Sheet '{}' has zero rows per row-group", plan.name),
                )
                .with_help("Set rows to at least 1, or omit it"),
            );
        }
        if plan.item_width == 0 || plan.item_height == 0 {
            result.push(
                Diagnostic::error(
                    "iconpress::validate::zero-item",
                    format!(
                        "Sheet '{}' has a zero-sized item ({}x{})",
                        plan.name, plan.item_width, plan.item_height
                    ),
                )
                .with_help("item_width and item_height must be at least 1"),
            );
        }

        if plan.order.is_some() && plan.permutation.is_some() {
            result.push(
                Diagnostic::error(
                    "iconpress::validate::order-conflict",
                    format!("Sheet '{}' sets both order and permutation", plan.name),
                )
                .with_help("Pick one: a name list, or 1-based positions"),
            );
        }

        for pattern in &manifest.cleanup_patterns {
            if workdir::matches_pattern(&plan.output_filename(), pattern) {
                result.push(
                    Diagnostic::error(
                        "iconpress::validate::output-matches-cleanup",
                        format!(
                            "Sheet '{}': output '{}' would be swept by cleanup pattern '{}'",
                            plan.name,
                            plan.output_filename(),
                            pattern
                        ),
                    )
                    .with_help("Rename the output or adjust cleanup_patterns"),
                );
            }
        }
    }

    result
}

/// Check that every plan's references resolve against the scan.
pub fn check_scan(manifest: &Manifest, scan: &ScanResult) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.merge(check_duplicate_ids(scan));

    for plan in &manifest.sheets {
        result.merge(check_plan_against_scan(plan, scan));
    }

    for path in &scan.skipped {
        result.push(
            Diagnostic::warning(
                "iconpress::validate::unconventional-name",
                format!(
                    "{} does not follow the <group>_<name>_0x<HEX> convention",
                    path.display()
                ),
            )
            .with_help("Rename it, or let `iconpress normalize` derive a hex id"),
        );
    }

    result
}

/// Check for ids or names claimed by more than one file in a group.
pub fn check_duplicate_ids(scan: &ScanResult) -> ValidationResult {
    let mut result = ValidationResult::new();

    let mut by_id: HashMap<(&str, u32), &str> = HashMap::new();
    let mut by_name: HashMap<(&str, &str), &str> = HashMap::new();

    for source in &scan.sources {
        let id_key = (source.group.as_str(), source.numeric_id);
        if let Some(first) = by_id.insert(id_key, &source.raw_filename) {
            result.push(
                Diagnostic::error(
                    "iconpress::validate::duplicate-id",
                    format!(
                        "Group '{}': id 0x{:04X} is claimed by both '{}' and '{}'",
                        source.group, source.numeric_id, first, source.raw_filename
                    ),
                )
                .with_help("Rename one of the files so each id appears once per group"),
            );
        }

        let name_key = (source.group.as_str(), source.canonical_name.as_str());
        if let Some(first) = by_name.insert(name_key, &source.raw_filename) {
            result.push(
                Diagnostic::error(
                    "iconpress::validate::duplicate-name",
                    format!(
                        "Group '{}': name '{}' is claimed by both '{}' and '{}'",
                        source.group, source.canonical_name, first, source.raw_filename
                    ),
                )
                .with_help("Rename one of the files so each name appears once per group"),
            );
        }
    }

    result
}

fn check_plan_against_scan(plan: &SheetPlan, scan: &ScanResult) -> ValidationResult {
    let mut result = ValidationResult::new();

    let group = plan.group_name();
    let members = scan.group_sources(group);
    if members.is_empty() {
        result.push(
            Diagnostic::error(
                "iconpress::validate::missing-group",
                format!("Sheet '{}': group '{}' has no discovered assets", plan.name, group),
            )
            .with_help("Check the group name against the scan, or the source paths"),
        );
        return result;
    }

    let names: HashSet<&str> = members.iter().map(|s| s.canonical_name.as_str()).collect();

    if let Some(order) = &plan.order {
        for entry in order {
            if !names.contains(entry.as_str()) {
                result.push(
                    Diagnostic::warning(
                        "iconpress::validate::order-miss",
                        format!(
                            "Sheet '{}': order entry '{}' matches no discovered asset",
                            plan.name, entry
                        ),
                    )
                    .with_help("The slot will be omitted; check the name against the group"),
                );
            }
        }
    }

    if let Some(positions) = &plan.permutation {
        for &position in positions {
            if position == 0 || position > members.len() {
                result.push(
                    Diagnostic::error(
                        "iconpress::validate::bad-position",
                        format!(
                            "Sheet '{}': permutation position {} is out of range for {} asset(s)",
                            plan.name,
                            position,
                            members.len()
                        ),
                    )
                    .with_help("Positions are 1-based indexes into the filename-sorted listing"),
                );
            }
        }
    }

    if let Some(index) = &plan.index {
        if !names.contains(index.name.as_str()) {
            result.push(
                Diagnostic::error(
                    "iconpress::validate::missing-index",
                    format!(
                        "Sheet '{}': index element '{}' is not in group '{}'",
                        plan.name, index.name, group
                    ),
                )
                .with_help("The index element must be a discovered asset of the group"),
            );
        }
    }

    result
}
