//! Zip archive assembly.
//!
//! Layout:
//! - `plan.md`
//! - `assets/<safe_type>.<md|csv>`, one per asset, in input order
//! - `summary.txt`
//!
//! Entries use deflate at maximum level and a fixed timestamp, so identical
//! input always yields byte-identical archives.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::data::{ExportAsset, ExportData};
use crate::error::ExportError;
use crate::markdown::render_plan_markdown;
use crate::summary::render_summary;

pub const PLAN_FILE: &str = "plan.md";
pub const SUMMARY_FILE: &str = "summary.txt";
pub const ASSETS_DIR: &str = "assets";

/// Lower-cased type tag with everything outside `[a-z0-9]` replaced by `_`.
pub fn asset_safe_name(asset_type: &str) -> String {
    asset_type
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Ad copy ships as CSV; every other asset type is markdown.
pub fn asset_extension(asset_type: &str) -> &'static str {
    if asset_type == "AD_COPY" { "csv" } else { "md" }
}

/// Archive paths for the given assets, in input order.
///
/// Assets sharing a type would map to the same path; later ones get a
/// numeric suffix (`social_post_2.md`) so no content is dropped.
pub fn asset_paths(assets: &[ExportAsset]) -> Vec<String> {
    let mut used = HashSet::new();

    assets
        .iter()
        .map(|asset| {
            let stem = asset_safe_name(&asset.asset_type);
            let ext = asset_extension(&asset.asset_type);

            let mut path = format!("{ASSETS_DIR}/{stem}.{ext}");
            let mut n = 2;
            while used.contains(&path) {
                path = format!("{ASSETS_DIR}/{stem}_{n}.{ext}");
                n += 1;
            }
            used.insert(path.clone());
            path
        })
        .collect()
}

/// Assemble the export archive in memory.
///
/// The buffer is returned only after the archive has been finalized; any
/// error aborts the whole export.
pub fn build_archive(data: &ExportData) -> Result<Vec<u8>, ExportError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9))
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file(PLAN_FILE, options)?;
    zip.write_all(render_plan_markdown(data).as_bytes())?;

    let paths = asset_paths(&data.assets);
    for (asset, path) in data.assets.iter().zip(&paths) {
        zip.start_file(path.as_str(), options)?;
        zip.write_all(asset.content.as_bytes())?;
    }

    zip.start_file(SUMMARY_FILE, options)?;
    zip.write_all(render_summary(data, &paths).as_bytes())?;

    let bytes = zip.finish()?.into_inner();
    debug!(
        tasks = data.tasks.len(),
        assets = data.assets.len(),
        bytes = bytes.len(),
        "export archive assembled"
    );
    Ok(bytes)
}
