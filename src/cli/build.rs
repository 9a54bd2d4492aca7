//! Build command implementation.
//!
//! Runs the whole pipeline: discover, decode, resolve each plan's
//! order, compose, write the final sheets, and clean up intermediates.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::asset::{Asset, IconCatalog};
use crate::compose::{compose_sheet, write_png, write_slot_map, IndexSlot};
use crate::convert;
use crate::discovery::{discover, Manifest, SheetPlan, MANIFEST_FILENAME};
use crate::error::{PressError, Result};
use crate::order;
use crate::output::{display_path, plural, Printer};
use crate::validation::{print_diagnostics, validate_setup, ValidationResult};
use crate::workdir::{self, IntermediateGuard};

/// Compose sheets from discovered assets
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Project directory containing sheets.yaml
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output directory (overrides the manifest)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Scale factor for final sheets (overrides the manifest)
    #[arg(long)]
    pub scale: Option<u32>,

    /// Keep intermediate canvases on disk
    #[arg(long)]
    pub keep_intermediates: bool,

    /// Skip the external compression step
    #[arg(long)]
    pub no_compress: bool,
}

pub fn run(args: BuildArgs, printer: &Printer) -> Result<()> {
    let discovery = discover(&args.path)?;
    if !discovery.has_manifest {
        return Err(PressError::Plan {
            message: format!(
                "no {} found in {}",
                MANIFEST_FILENAME,
                display_path(&args.path)
            ),
            help: Some("Run `iconpress init` to generate one".to_string()),
        });
    }

    printer.status(
        "Scanning",
        &format!(
            "{} ({})",
            display_path(&args.path),
            plural(discovery.scan.total(), "asset", "assets")
        ),
    );

    // Pre-flight checks. Errors abort before anything is decoded.
    let setup = validate_setup(&discovery.manifest, &discovery.scan);
    if setup.has_errors() {
        print_diagnostics(&setup);
        return Err(PressError::Validation {
            message: format!("{} error(s) in project setup", setup.error_count()),
            help: Some("Run `iconpress validate` for details".to_string()),
        });
    }
    for d in setup.iter() {
        printer.warning("Warning", &d.message);
    }

    let manifest = discovery.manifest.clone();
    let output_dir = args.output.clone().unwrap_or_else(|| manifest.output.clone());

    let mut decode_warnings = ValidationResult::new();
    let catalog = discovery.into_catalog(&mut decode_warnings)?;
    for d in decode_warnings.iter() {
        printer.warning("Skipping", &d.message);
    }

    if !output_dir.exists() {
        fs::create_dir_all(&output_dir).map_err(|e| PressError::Io {
            path: output_dir.clone(),
            message: format!("Failed to create output directory: {}", e),
        })?;
    }

    let scale = args.scale.unwrap_or_else(|| manifest.effective_scale()).max(1);
    let keep = args.keep_intermediates || manifest.keep_intermediates;
    let grace = Duration::from_secs(manifest.cleanup_grace_secs);

    // One guard covers the whole run: every intermediate of every sheet
    // is registered here and swept once all sheets are saved. An error
    // on any sheet drops the guard and sweeps immediately.
    let mut guard = IntermediateGuard::new(&output_dir, grace);
    if keep {
        guard.disarm();
    }

    let mut written: Vec<PathBuf> = Vec::new();
    for plan in &manifest.sheets {
        written.extend(build_sheet(
            plan,
            &catalog,
            &output_dir,
            scale,
            &mut guard,
            printer,
        )?);
    }
    guard.finish(printer);

    // Sweep strays from earlier interrupted runs. Skipped when keeping
    // intermediates, since this run's files match the same patterns.
    if !keep {
        let removed =
            workdir::sweep_stale(&output_dir, &manifest.cleanup_patterns, &written, printer);
        if removed > 0 {
            printer.status(
                "Cleaned",
                &plural(removed, "stale intermediate", "stale intermediates"),
            );
        }
    }

    if let Some(compress) = &manifest.compress {
        if args.no_compress {
            printer.info("Skipping", &format!("{} compression", compress.format));
        } else {
            compress_sheets(&manifest, compress, &output_dir, printer)?;
        }
    }

    printer.success(
        "Finished",
        &format!(
            "{} to {}",
            plural(manifest.sheets.len(), "sheet", "sheets"),
            display_path(&output_dir)
        ),
    );

    Ok(())
}

/// Compose one plan and write its outputs. Returns the written paths.
fn build_sheet(
    plan: &SheetPlan,
    catalog: &IconCatalog,
    output_dir: &std::path::Path,
    scale: u32,
    guard: &mut IntermediateGuard,
    printer: &Printer,
) -> Result<Vec<PathBuf>> {
    printer.status("Composing", &plan.name);

    let group = catalog.group(plan.group_name()).ok_or_else(|| PressError::Compose {
        message: format!(
            "sheet '{}': group '{}' has no decoded assets",
            plan.name,
            plan.group_name()
        ),
        help: Some("check the group name against the scan".to_string()),
    })?;

    let mut order_warnings = ValidationResult::new();
    let slots = order::resolve(group, &plan.order_spec(), plan.pad_to, &mut order_warnings)?;
    for d in order_warnings.iter() {
        printer.warning("Omitting", &d.message);
    }

    // An asset larger than its cell would bleed into neighbours; leave
    // the slot blank instead.
    let layout = plan.layout();
    let slots: Vec<Option<&Asset>> = slots
        .into_iter()
        .map(|slot| match slot {
            Some(a) if a.width() > layout.item_width || a.height() > layout.item_height => {
                printer.warning(
                    "Oversize",
                    &format!(
                        "{} is {}x{}, larger than the {}x{} cell",
                        a.raw_filename,
                        a.width(),
                        a.height(),
                        layout.item_width,
                        layout.item_height
                    ),
                );
                None
            }
            other => other,
        })
        .collect();

    let index = match &plan.index {
        Some(ix) => {
            let asset = group.get(&ix.name).ok_or_else(|| PressError::Compose {
                message: format!(
                    "sheet '{}': index element '{}' not found in group '{}'",
                    plan.name,
                    ix.name,
                    plan.group_name()
                ),
                help: Some("the index element must be a discovered asset of the group".to_string()),
            })?;
            Some(IndexSlot {
                asset,
                padding: ix.padding,
            })
        }
        None => None,
    };

    let mut compose_warnings = ValidationResult::new();
    let sheet = compose_sheet(&plan.name, &slots, &layout, index, guard, &mut compose_warnings)?;
    for d in compose_warnings.iter() {
        printer.warning("Compose", &d.message);
    }

    let final_path = output_dir.join(plan.output_filename());
    write_png(&sheet.image, &final_path, scale)?;
    printer.status(
        "Composed",
        &format!(
            "{} ({})",
            display_path(&final_path),
            plural(sheet.slots.len(), "slot", "slots")
        ),
    );

    let mut written = vec![final_path.clone()];
    if plan.slot_map {
        let map_path = final_path.with_extension("json");
        write_slot_map(&sheet, &plan.output_filename(), &map_path)?;
        written.push(map_path);
    }

    Ok(written)
}

fn compress_sheets(
    manifest: &Manifest,
    compress: &convert::CompressSpec,
    output_dir: &std::path::Path,
    printer: &Printer,
) -> Result<()> {
    if !convert::is_tool_on_path(&compress.tool) {
        return Err(PressError::Convert {
            message: format!("converter '{}' not found", compress.tool),
            help: Some(format!("is '{}' installed and on PATH?", compress.tool)),
        });
    }

    // Converted textures land in a subdirectory so the PNG sheets stay
    // untouched next to their slot maps.
    let compress_dir = output_dir.join("compressed");
    for plan in &manifest.sheets {
        let sheet_path = output_dir.join(plan.output_filename());
        let converted = convert::convert_file(&sheet_path, compress, &compress_dir)?;
        printer.status("Compressed", &display_path(&converted));
    }

    Ok(())
}
