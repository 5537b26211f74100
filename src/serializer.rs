//! Rendering of build results to JSON or YAML text and to files.

use crate::error::Result;
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Pretty-printed JSON of any build result (example value, rows, form entries)
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    debug!("Serializing output to JSON");
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    debug!("Serializing output to YAML");
    Ok(serde_yaml::to_string(value)?)
}

/// Write `content` to `path`, creating parent directories as needed
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
