//! Init command implementation.
//!
//! Generates a `sheets.yaml` manifest from discovered assets, with one
//! sheet plan per asset group.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::discovery::{discover, MANIFEST_FILENAME};
use crate::error::{PressError, Result};
use crate::output::{display_path, plural, Printer};

/// Initialize a project (generates sheets.yaml)
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to scan (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing sheets.yaml
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let manifest_path = args.path.join(MANIFEST_FILENAME);

    // Check for existing manifest
    if manifest_path.exists() && !args.force {
        return Err(PressError::Plan {
            message: format!("{} already exists", MANIFEST_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    // Discover assets (no manifest yet, so convention scanning)
    printer.status("Scanning", &display_path(&args.path));
    let discovery = discover(&args.path)?;
    let scan = &discovery.scan;

    // Collect unique parent directories (relative to project root)
    let mut source_dirs = BTreeSet::new();
    for source in &scan.sources {
        if let Some(parent) = source.path.parent() {
            let relative = parent
                .strip_prefix(&discovery.root)
                .unwrap_or(parent);

            let dir_str = if relative == std::path::Path::new("") {
                ".".to_string()
            } else {
                format!("{}/", relative.display())
            };
            source_dirs.insert(dir_str);
        }
    }

    // Build YAML manually for clean formatting
    let mut yaml = String::new();

    // Sources
    if source_dirs.is_empty() || (source_dirs.len() == 1 && source_dirs.contains(".")) {
        // Default: scan current directory, no need to list sources
    } else {
        yaml.push_str("sources:\n");
        for dir in &source_dirs {
            yaml.push_str(&format!("  - \"{}\"\n", dir));
        }
    }

    // Output
    yaml.push_str("output: dist\n");

    // One sheet plan per discovered group
    let groups = scan.group_counts();
    if !groups.is_empty() {
        yaml.push_str("sheets:\n");
        for group in groups.keys() {
            yaml.push_str(&format!("  - name: {}\n", group));
        }
    }

    // Write manifest
    fs::write(&manifest_path, &yaml).map_err(|e| PressError::Io {
        path: manifest_path.clone(),
        message: format!("Failed to write manifest: {}", e),
    })?;

    if !source_dirs.is_empty() {
        let dirs: Vec<&str> = source_dirs.iter().map(|s| s.as_str()).collect();
        printer.info("Discovered", &dirs.join(", "));
    }

    printer.success(
        "Created",
        &format!(
            "{} ({} in {})",
            MANIFEST_FILENAME,
            plural(scan.sources.len(), "asset", "assets"),
            plural(groups.len(), "group", "groups"),
        ),
    );

    Ok(())
}
