//! Boundary adapters: turn TOML / JSON text or files into a [`Properties`].
//!
//! Parsing is delegated to `toml` and `serde_json`; the parsed tree is then
//! flattened into canonical keys by [`Properties::merge`]. Each source is
//! recorded under its origin name so [`Properties::file_of`] can report where
//! a value came from.

use std::path::Path;

use tracing::debug;

use crate::error::ConfError;
use crate::store::Properties;

/// Parse TOML text into a fresh store.
pub fn from_toml_str(content: &str, origin: &str) -> Result<Properties, ConfError> {
    let mut props = Properties::new();
    merge_toml_str(&mut props, content, origin)?;
    Ok(props)
}

/// Parse TOML text and layer it on top of `props`.
pub fn merge_toml_str(
    props: &mut Properties,
    content: &str,
    origin: &str,
) -> Result<(), ConfError> {
    let table: toml::Table = toml::from_str(content).map_err(|e| ConfError::ParseError {
        origin: origin.to_string(),
        message: e.to_string(),
    })?;
    props.merge(&table, origin)?;
    debug!(origin, keys = props.len(), "merged toml source");
    Ok(())
}

/// Parse JSON text into a fresh store.
pub fn from_json_str(content: &str, origin: &str) -> Result<Properties, ConfError> {
    let mut props = Properties::new();
    merge_json_str(&mut props, content, origin)?;
    Ok(props)
}

/// Parse JSON text and layer it on top of `props`.
pub fn merge_json_str(
    props: &mut Properties,
    content: &str,
    origin: &str,
) -> Result<(), ConfError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ConfError::ParseError {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
    props.merge(&value, origin)?;
    debug!(origin, keys = props.len(), "merged json source");
    Ok(())
}

/// Read a `.toml` or `.json` file into a fresh store.
pub fn from_file(path: &Path) -> Result<Properties, ConfError> {
    let mut props = Properties::new();
    merge_file(&mut props, path)?;
    Ok(props)
}

/// Read a `.toml` or `.json` file and layer it on top of `props`.
/// The file's display path becomes the origin name.
pub fn merge_file(props: &mut Properties, path: &Path) -> Result<(), ConfError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let origin = path.display().to_string();
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => merge_toml_str(props, &content, &origin),
        Some("json") => merge_json_str(props, &content, &origin),
        other => Err(ConfError::ParseError {
            origin,
            message: format!("unsupported file extension {other:?}"),
        }),
    }
}
