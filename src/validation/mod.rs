//! Validation for sheet projects.
//!
//! Runs a suite of checks against the manifest and the scan and
//! reports errors and warnings. Used by both `iconpress validate` and
//! the pre-flight step of `iconpress build`.

mod checks;
mod warning;

pub use checks::{check_duplicate_ids, check_plans, check_scan};
pub use warning::{Diagnostic, Severity, ValidationResult};

use crate::discovery::{Manifest, ScanResult};

/// Run all pre-build checks against the manifest and the scan.
pub fn validate_setup(manifest: &Manifest, scan: &ScanResult) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.merge(checks::check_plans(manifest));
    result.merge(checks::check_scan(manifest, scan));

    result
}

/// Print diagnostics to stderr.
pub fn print_diagnostics(result: &ValidationResult) {
    for d in result.iter() {
        let severity = match d.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        eprintln!("  {}[{}]: {}", severity, d.code, d.message);
        if let Some(help) = &d.help {
            eprintln!("    help: {}", help);
        }
    }

    let errors = result.error_count();
    let warnings = result.warning_count();

    if errors > 0 {
        eprintln!(
            "Validation failed: {} error(s), {} warning(s)",
            errors, warnings
        );
    } else if warnings > 0 {
        eprintln!("Validation passed ({} warning(s))", warnings);
    } else {
        eprintln!("Validation passed.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SourceAsset;
    use crate::discovery::SheetPlan;
    use std::path::Path;

    #[test]
    fn test_validate_default_manifest() {
        let result = validate_setup(&Manifest::default(), &ScanResult::new());
        // The empty sheet list warns but nothing errors.
        assert!(!result.has_errors());
        assert!(result.has_warnings());
    }

    #[test]
    fn test_validate_complete_setup() {
        let manifest = Manifest {
            sheets: vec![SheetPlan {
                name: "items".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut scan = ScanResult::new();
        scan.sources
            .push(SourceAsset::from_path(Path::new("items_axe_0x0003.png")).unwrap());

        let result = validate_setup(&manifest, &scan);
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_catches_missing_group() {
        let manifest = Manifest {
            sheets: vec![SheetPlan {
                name: "spellbook".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let result = validate_setup(&manifest, &ScanResult::new());
        assert!(result.has_errors());
    }
}
