//! iconpress - Icon sheet compositor
//!
//! A library for discovering icon assets named by convention, composing
//! them into padded sheet images, and writing slot maps describing where
//! each icon landed.

pub mod asset;
pub mod cli;
pub mod compose;
pub mod convert;
pub mod decode;
pub mod discovery;
pub mod error;
pub mod naming;
pub mod order;
pub mod output;
pub mod validation;
pub mod workdir;

pub use asset::{Asset, GroupCatalog, IconCatalog, SourceAsset};
pub use compose::{compose_sheet, ComposedSheet, LayoutSpec, SlotRecord};
pub use discovery::{discover, discover_paths, DiscoveryResult, Manifest, ScanResult, SheetPlan};
pub use error::{PressError, Result};
pub use order::OrderSpec;
pub use validation::{validate_setup, Diagnostic, Severity, ValidationResult};
