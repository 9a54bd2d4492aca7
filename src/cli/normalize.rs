//! Normalize command implementation.
//!
//! Reports the rename each discovered file needs to carry a canonical
//! `0x`-prefixed, 4-digit uppercase identifier, and applies the
//! renames with `--apply`. An `--shift` offset is added to each
//! identifier after normalization.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::discovery::discover_paths;
use crate::error::{PressError, Result};
use crate::naming;
use crate::output::{display_path, plural, Printer};

/// Rename files to the canonical naming convention
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Files or directories to scan (default: current directory)
    pub files: Vec<PathBuf>,

    /// Apply the renames instead of printing them
    #[arg(long)]
    pub apply: bool,

    /// Add this offset to each identifier (decimal or 0x-prefixed)
    #[arg(long, allow_hyphen_values = true, value_parser = parse_shift)]
    pub shift: Option<i64>,
}

pub fn run(args: NormalizeArgs, printer: &Printer) -> Result<()> {
    let paths = if args.files.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.files.clone()
    };
    let discovery = discover_paths(&paths)?;

    // Both parseable assets and skipped candidates are fair game: the
    // skipped ones are exactly what normalization exists for.
    let mut candidates: Vec<PathBuf> = discovery.scan.sources.iter().map(|s| s.path.clone()).collect();
    candidates.extend(discovery.scan.skipped.iter().cloned());
    candidates.sort();

    let mut renames: Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut unchanged = 0usize;
    for path in &candidates {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match target_name(filename, args.shift)? {
            Some(target) => {
                let to = path.with_file_name(&target);
                printer.info(
                    "Rename",
                    &format!("{} {} {}", filename, printer.dim("->"), target),
                );
                renames.push((path.clone(), to));
            }
            None => unchanged += 1,
        }
    }

    if renames.is_empty() {
        printer.success(
            "Checked",
            &format!("{}, all canonical", plural(unchanged, "file", "files")),
        );
        return Ok(());
    }

    if !args.apply {
        printer.success(
            "Planned",
            &format!(
                "{} (run with --apply to rename)",
                plural(renames.len(), "rename", "renames")
            ),
        );
        return Ok(());
    }

    check_collisions(&renames)?;
    for (from, to) in &renames {
        fs::rename(from, to).map_err(|e| PressError::Io {
            path: from.clone(),
            message: format!("Failed to rename: {}", e),
        })?;
    }

    printer.success("Renamed", &plural(renames.len(), "file", "files"));
    Ok(())
}

/// The canonical name `filename` should carry, or `None` when it is
/// already canonical (or carries no identifier at all).
fn target_name(filename: &str, shift: Option<i64>) -> Result<Option<String>> {
    let normalized = naming::normalize(filename);
    let current = normalized
        .clone()
        .unwrap_or_else(|| filename.to_string());

    let shifted = match shift {
        Some(delta) if delta != 0 => naming::shift_filename(&current, delta)?,
        _ => None,
    };

    Ok(shifted.or(normalized).filter(|t| t != filename))
}

fn check_collisions(renames: &[(PathBuf, PathBuf)]) -> Result<()> {
    let origins: HashSet<&Path> = renames.iter().map(|(from, _)| from.as_path()).collect();
    let mut targets: HashSet<&Path> = HashSet::new();

    for (_, to) in renames {
        if !targets.insert(to.as_path()) {
            return Err(PressError::Naming {
                message: format!("two files would both become {}", display_path(to)),
                help: Some("Rename one of them by hand first".to_string()),
            });
        }
        // A target that exists and is not itself being renamed away
        // would be clobbered.
        if to.exists() && !origins.contains(to.as_path()) {
            return Err(PressError::Naming {
                message: format!("refusing to overwrite {}", display_path(to)),
                help: Some("Move the existing file out of the way first".to_string()),
            });
        }
    }

    Ok(())
}

fn parse_shift(s: &str) -> std::result::Result<i64, String> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let value = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else {
        rest.parse::<i64>()
    }
    .map_err(|_| format!("invalid offset '{}'", s))?;

    Ok(if negative { -value } else { value })
}
