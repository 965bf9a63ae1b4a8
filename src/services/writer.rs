// src/services/writer.rs
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ChartError, Result};
use crate::services::chart::render_png;
use crate::services::layout::ChartLayout;

/// The bitmap encoder picks the format from the extension, so only `.png`
/// (or no extension, which gets `.png`) is accepted.
pub fn resolve_output_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(ChartError::Config("output path is empty".into()));
    }
    match path.extension().and_then(|e| e.to_str()) {
        None => Ok(path.with_extension("png")),
        Some(ext) if ext.eq_ignore_ascii_case("png") => Ok(path.to_path_buf()),
        Some(ext) => Err(ChartError::Config(format!(
            "unsupported image format '.{}' for {}, expected .png",
            ext,
            path.display()
        ))),
    }
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("Creating output directory {}", dir.display());
            fs::create_dir_all(dir)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

pub fn write_chart(layout: &ChartLayout, path: &Path) -> Result<PathBuf> {
    let path = resolve_output_path(path)?;
    ensure_parent_dir(&path)?;
    render_png(layout, &path)?;
    Ok(path)
}
