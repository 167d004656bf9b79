//! Copy a source CSV into the staged location.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EtlError, Result};

/// Copy `src` to `dest` byte for byte, creating parent directories.
pub fn copy_to_dest(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<PathBuf> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if !src.is_file() {
        return Err(EtlError::input(src, "source not found"));
    }

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| EtlError::io(parent, e))?;
    }

    let bytes = fs::copy(src, dest).map_err(|e| EtlError::io(dest, e))?;
    tracing::info!(
        src = %src.display(),
        dest = %dest.display(),
        bytes,
        "staged source file"
    );

    Ok(dest.to_path_buf())
}
