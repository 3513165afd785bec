//! `summary.txt` rendering.
//!
//! Deliberately free of timestamps so archives stay reproducible; the export
//! record in the database carries the generation time.

use std::fmt::Write as _;

use crate::archive::PLAN_FILE;
use crate::data::{ExportData, Phase};

/// Render the archive summary. `asset_paths` must be parallel to `data.assets`.
pub fn render_summary(data: &ExportData, asset_paths: &[String]) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Tasknator plan export");
    let _ = writeln!(out, "=====================");
    out.push('\n');
    let _ = writeln!(out, "Plan: {}", data.plan_title);
    let _ = writeln!(out, "Business: {}", data.business_name);
    let _ = writeln!(out, "Industry: {}", data.industry);
    out.push('\n');

    let rendered = data.tasks.len() - data.unphased_task_count();
    let _ = writeln!(out, "Tasks: {rendered}");
    for phase in Phase::ORDERED {
        let _ = writeln!(out, "  {}: {}", phase.label(), data.tasks_in(phase).count());
    }
    if data.unphased_task_count() > 0 {
        let _ = writeln!(
            out,
            "  Skipped (unknown phase): {}",
            data.unphased_task_count()
        );
    }
    out.push('\n');

    let _ = writeln!(out, "Assets: {}", data.assets.len());
    for (asset, path) in data.assets.iter().zip(asset_paths) {
        let _ = writeln!(out, "  {path}: {} ({})", asset.title, asset.asset_type);
    }
    out.push('\n');

    let _ = writeln!(out, "Files:");
    let _ = writeln!(out, "  {PLAN_FILE}");
    for path in asset_paths {
        let _ = writeln!(out, "  {path}");
    }

    out
}
