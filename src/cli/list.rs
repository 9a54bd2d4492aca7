//! List command implementation.
//!
//! Discovers assets and prints an inventory per group.

use std::path::PathBuf;

use clap::Args;

use crate::discovery::{discover, discover_paths, ScanResult};
use crate::error::Result;
use crate::output::{display_path, plural, Printer};

/// List discovered assets per group
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Files or directories to scan (default: current directory)
    pub files: Vec<PathBuf>,

    /// Show every asset, not just group summaries
    #[arg(long)]
    pub assets: bool,
}

pub fn run(args: ListArgs, printer: &Printer) -> Result<()> {
    let discovery = if args.files.is_empty() {
        discover(".")?
    } else {
        discover_paths(&args.files)?
    };

    print_inventory(&discovery.scan, args.assets, printer);

    Ok(())
}

fn print_inventory(scan: &ScanResult, assets: bool, printer: &Printer) {
    if scan.is_empty() && scan.skipped.is_empty() {
        printer.info("Found", "no assets");
        return;
    }

    for (group, count) in scan.group_counts() {
        let mut members = scan.group_sources(group);
        members.sort_by_key(|s| s.numeric_id);

        let summary = match (members.first(), members.last()) {
            (Some(first), Some(last)) => format!(
                "{}, ids 0x{:04X}{}0x{:04X}",
                plural(count, "asset", "assets"),
                first.numeric_id,
                printer.dim(".."),
                last.numeric_id
            ),
            _ => plural(count, "asset", "assets"),
        };
        printer.info(group, &summary);

        if assets {
            for member in members {
                printer.status(
                    "",
                    &format!(
                        "0x{:04X} {} {}",
                        member.numeric_id,
                        member.canonical_name,
                        printer.dim(&format!("({})", member.raw_filename))
                    ),
                );
            }
        }
    }

    for path in &scan.skipped {
        printer.warning("Skipped", &display_path(path));
    }
    if !scan.skipped.is_empty() {
        printer.warning(
            "Naming",
            &format!(
                "{} without the {} convention",
                plural(scan.skipped.len(), "file", "files"),
                printer.cyan("<group>_<name>_0x<HEX>")
            ),
        );
    }
}
