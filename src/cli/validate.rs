//! Validate command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::discovery::discover;
use crate::error::{PressError, Result};
use crate::output::{display_path, plural, Printer};
use crate::validation::{print_diagnostics, validate_setup};

/// Check the manifest and scan without composing
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

pub fn run(args: ValidateArgs, printer: &Printer) -> Result<()> {
    let discovery = discover(&args.path)?;
    if !discovery.has_manifest {
        return Err(PressError::Plan {
            message: format!("no sheets.yaml found in {}", display_path(&args.path)),
            help: Some("Run `iconpress init` to generate one".to_string()),
        });
    }

    printer.status("Validating", &display_path(&args.path));
    let result = validate_setup(&discovery.manifest, &discovery.scan);
    print_diagnostics(&result);

    if result.has_errors() {
        return Err(PressError::Validation {
            message: plural(result.error_count(), "error", "errors"),
            help: Some("Fix the errors above and run again".to_string()),
        });
    }

    printer.success(
        "Validated",
        &format!(
            "{} across {}",
            plural(discovery.scan.total(), "asset", "assets"),
            plural(discovery.manifest.sheets.len(), "sheet plan", "sheet plans"),
        ),
    );
    Ok(())
}
