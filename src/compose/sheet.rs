//! Hierarchical sheet compositor.
//!
//! Turns an ordered slot list into one flattened sheet: items stack
//! into rows, rows into row-groups, row-groups into the sheet, each
//! level through the same axis-stack primitive with its own padding.
//! An optional index element (a distinctly sized cover image) is
//! composed beside the grid, both vertically centred. Row and
//! row-group canvases are written as inspectable intermediates through
//! the caller's [`IntermediateGuard`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use image::RgbaImage;
use serde::Serialize;

use crate::asset::Asset;
use crate::error::{PressError, Result};
use crate::validation::{Diagnostic, ValidationResult};
use crate::workdir::IntermediateGuard;

use super::layout::{self, Axis, LayoutSpec};
use super::png;

/// The index element for a sheet: one asset composed beside the grid
/// with its own padding.
pub struct IndexSlot<'a> {
    pub asset: &'a Asset,
    pub padding: u32,
}

/// Placement of one asset within the final sheet raster.
#[derive(Debug, Clone)]
pub struct SlotRecord {
    pub name: String,
    pub id: u32,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// A fully composed sheet with its slot placements.
#[derive(Debug)]
pub struct ComposedSheet {
    pub image: RgbaImage,
    pub slots: Vec<SlotRecord>,
}

/// Compose ordered slots into a single sheet raster.
///
/// Empty slots stay transparent without shifting later slots; a slot
/// list that resolves nothing is an error. The slot list is never
/// truncated: slots beyond `columns * rows` spill into further
/// row-groups.
pub fn compose_sheet(
    name: &str,
    slots: &[Option<&Asset>],
    layout: &LayoutSpec,
    index: Option<IndexSlot<'_>>,
    intermediates: &mut IntermediateGuard,
    warnings: &mut ValidationResult,
) -> Result<ComposedSheet> {
    if layout.columns == 0 {
        return Err(PressError::Compose {
            message: format!("sheet '{}' has zero columns", name),
            help: Some("set columns to at least 1".to_string()),
        });
    }
    if slots.iter().all(Option::is_none) {
        return Err(PressError::Compose {
            message: format!("sheet '{}' resolved no assets", name),
            help: Some("check the group name and order entries against the scan".to_string()),
        });
    }

    let columns = layout.columns as usize;
    let row_width = layout.row_width();

    // Row stage: fixed-width rows, short tail rows padded with blanks.
    let mut twigs = Vec::new();
    for (i, row) in slots.chunks(columns).enumerate() {
        let mut cells: Vec<Option<&RgbaImage>> =
            row.iter().map(|slot| slot.map(|a| &a.raster)).collect();
        cells.resize(columns, None);
        let twig = layout::stack(
            &cells,
            layout.item_width,
            layout.item_height,
            Axis::Horizontal,
            layout.item_padding,
        );
        write_intermediate(&twig, intermediates, "twig", name, i, warnings);
        twigs.push(twig);
    }

    // Row-group stage.
    let branch_rows = match layout.rows {
        Some(rows) => rows.max(1) as usize,
        None => twigs.len(),
    };
    let mut branches = Vec::new();
    for (i, chunk) in twigs.chunks(branch_rows).enumerate() {
        let cells: Vec<Option<&RgbaImage>> = chunk.iter().map(Some).collect();
        let branch = layout::stack(
            &cells,
            row_width,
            layout.item_height,
            Axis::Vertical,
            layout.row_padding,
        );
        write_intermediate(&branch, intermediates, "branch", name, i, warnings);
        branches.push(branch);
    }

    // Sheet stage: tile row-groups horizontally.
    let branch_height = layout::span(branch_rows as u32, layout.item_height, layout.row_padding);
    let grid = if branches.len() == 1 {
        branches.swap_remove(0)
    } else {
        let cells: Vec<Option<&RgbaImage>> = branches.iter().map(Some).collect();
        layout::stack(
            &cells,
            row_width,
            branch_height,
            Axis::Horizontal,
            layout.group_padding,
        )
    };

    // Optional index element beside the grid, both vertically centred.
    let (image, grid_x0, grid_y0, index_record) = match index {
        Some(ix) => {
            let tree = layout::pair_horizontal(&ix.asset.raster, &grid, ix.padding);
            let grid_y0 = layout::centered_offset(tree.height(), grid.height());
            let record = SlotRecord {
                name: ix.asset.canonical_name.clone(),
                id: ix.asset.numeric_id,
                x: 0,
                y: layout::centered_offset(tree.height(), ix.asset.height()),
                w: ix.asset.width(),
                h: ix.asset.height(),
            };
            (tree, ix.asset.width() + ix.padding, grid_y0, Some(record))
        }
        None => (grid, 0, 0, None),
    };

    let mut records = Vec::new();
    records.extend(index_record);
    for (i, slot) in slots.iter().enumerate() {
        let Some(asset) = slot else { continue };
        let row = i / columns;
        let col = (i % columns) as u32;
        let (branch, row_in_branch) = match layout.rows {
            Some(rows) => {
                let rows = rows.max(1) as usize;
                ((row / rows) as u32, (row % rows) as u32)
            }
            None => (0, row as u32),
        };
        records.push(SlotRecord {
            name: asset.canonical_name.clone(),
            id: asset.numeric_id,
            x: grid_x0
                + branch * (row_width + layout.group_padding)
                + col * (layout.item_width + layout.item_padding),
            y: grid_y0 + row_in_branch * (layout.item_height + layout.row_padding),
            w: layout.item_width,
            h: layout.item_height,
        });
    }

    Ok(ComposedSheet {
        image,
        slots: records,
    })
}

fn write_intermediate(
    canvas: &RgbaImage,
    intermediates: &mut IntermediateGuard,
    level: &str,
    sheet: &str,
    index: usize,
    warnings: &mut ValidationResult,
) {
    let path = intermediates.stage_path(level, &format!("{}_{:02}", sheet, index));
    if let Err(err) = png::write_png(canvas, &path, 1) {
        warnings.push(Diagnostic::warning(
            "iconpress::compose::intermediate",
            format!("could not write {}: {}", path.display(), err),
        ));
    }
}

/// Write a sheet's slot placements as JSON next to the image output.
pub fn write_slot_map(sheet: &ComposedSheet, image_name: &str, path: &Path) -> Result<()> {
    let output = SlotMapJson::from_sheet(sheet, image_name);
    let json = serde_json::to_string_pretty(&output).map_err(|e| PressError::Compose {
        message: format!("failed to serialize slot map: {}", e),
        help: None,
    })?;
    fs::write(path, json).map_err(|e| PressError::Io {
        path: path.to_path_buf(),
        message: format!("failed to write slot map: {}", e),
    })?;
    Ok(())
}

// --- Slot map JSON serialization types ---

#[derive(Serialize)]
struct SlotMapJson {
    sheet: SheetJson,
    slots: BTreeMap<String, SlotJson>,
}

#[derive(Serialize)]
struct SheetJson {
    image: String,
    w: u32,
    h: u32,
}

#[derive(Serialize)]
struct SlotJson {
    id: String,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

impl SlotMapJson {
    fn from_sheet(sheet: &ComposedSheet, image_name: &str) -> Self {
        let mut slots = BTreeMap::new();
        for slot in &sheet.slots {
            slots.insert(
                slot.name.clone(),
                SlotJson {
                    id: format!("0x{:04X}", slot.id),
                    x: slot.x,
                    y: slot.y,
                    w: slot.w,
                    h: slot.h,
                },
            );
        }
        SlotMapJson {
            sheet: SheetJson {
                image: image_name.to_string(),
                w: sheet.image.width(),
                h: sheet.image.height(),
            },
            slots,
        }
    }
}
