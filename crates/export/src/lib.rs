//! Plan export assembly.
//!
//! Turns an [`ExportData`] snapshot into the deliverables handed to a
//! business owner: a deterministic zip archive (`plan.md`, one file per
//! asset, `summary.txt`) or a flat tasks CSV. Everything here is pure and
//! synchronous; fetching the data and uploading the result belong to the
//! worker.

mod archive;
mod csv;
mod data;
mod error;
mod markdown;
mod summary;

pub use archive::{
    ASSETS_DIR, PLAN_FILE, SUMMARY_FILE, asset_extension, asset_paths, asset_safe_name,
    build_archive,
};
pub use csv::render_tasks_csv;
pub use data::{ExportAsset, ExportData, ExportTask, Phase};
pub use error::ExportError;
pub use markdown::render_plan_markdown;
pub use summary::render_summary;
