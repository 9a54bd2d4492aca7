//! Sheet composition.
//!
//! Layout arithmetic and axis stacking live in [`layout`], PNG
//! encoding in [`png`], and the full row/row-group/sheet pipeline in
//! [`sheet`].

mod layout;
mod png;
mod sheet;

pub use layout::{pair_horizontal, span, stack, Axis, LayoutSpec};
pub use png::{scale_rgba, write_png};
pub use sheet::{compose_sheet, write_slot_map, ComposedSheet, IndexSlot, SlotRecord};
