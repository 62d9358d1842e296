//! STEP file resolution for downloads.

use std::path::{Path, PathBuf};

use crate::config::DownloadConfig;
use crate::error::{Result, ShopfloorError};
use crate::requests::validate_file_path;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A STEP file that exists and can be served.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFile {
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: String,
}

/// Resolves a requested path to an existing regular file.
///
/// Paths containing `..` are rejected before the filesystem is touched.
/// When `downloads.step_root` is set, relative paths are taken from it and
/// absolute paths must lie under it.
pub fn resolve_step_file(config: &DownloadConfig, requested: Option<&str>) -> Result<StepFile> {
    let requested = validate_file_path(requested)?;
    let raw = Path::new(requested.trim());

    let path = match &config.step_root {
        Some(root) if raw.is_relative() => root.join(raw),
        Some(root) if !raw.starts_with(root) => {
            return Err(ShopfloorError::validation(
                "Absolute file_path is outside the STEP root",
            ));
        }
        _ => raw.to_path_buf(),
    };

    if !path.is_file() {
        log::debug!("STEP file not found: {}", path.display());
        return Err(ShopfloorError::not_found(
            "STEP file not found or not a regular file",
        ));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download.step".to_string());
    let content_type = mime_guess::from_path(&path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

    Ok(StepFile {
        path,
        file_name,
        content_type,
    })
}
