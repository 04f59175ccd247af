//! # Settings Loader
//!
//! Loads the note layout (marker strings, column labels, scaling) used by the
//! settlement note parser. Layouts are stored as JSON; any field left out of
//! the file keeps its built-in default, so a settings file usually only
//! overrides a marker or two when a brokerage renames a heading.
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! // Load a layout from a specific path
//! let layout = settings_loader::load_settings("config/inter.json")?;
//!
//! // Explicit path, else ./settings.json, else built-in defaults
//! let path = Some(PathBuf::from("settings.json"));
//! let layout = settings_loader::load_settings_with_fallback(path.as_ref())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use models::NoteLayout;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Loads a layout from a JSON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<NoteLayout> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading settings file: {}", path.display()))?;
    let layout: NoteLayout = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing settings JSON in {}", path.display()))?;
    Ok(layout)
}

/// Loads settings from the default location (settings.json in the current directory)
pub fn load_default_settings() -> Result<NoteLayout> {
    load_settings(DEFAULT_SETTINGS_FILE)
}

/// Loads settings from an optional path, returning None if no path is provided
pub fn load_optional_settings(path: Option<&PathBuf>) -> Result<Option<NoteLayout>> {
    match path {
        Some(settings_path) => Ok(Some(load_settings(settings_path)?)),
        None => Ok(None),
    }
}

/// Resolves the layout to use for a run.
///
/// An explicitly provided path must load; a broken file there is an error.
/// Without a path, `settings.json` in the working directory is used when it
/// exists, otherwise the built-in layout.
pub fn load_settings_with_fallback(path: Option<&PathBuf>) -> Result<NoteLayout> {
    if let Some(layout) = load_optional_settings(path)? {
        return Ok(layout);
    }

    if default_settings_exist() {
        tracing::debug!("using {}", DEFAULT_SETTINGS_FILE);
        return load_default_settings();
    }

    Ok(NoteLayout::default())
}

/// Checks if a settings file exists at the given path
pub fn settings_file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists() && path.as_ref().is_file()
}

/// Checks if the default settings file (settings.json) exists
pub fn default_settings_exist() -> bool {
    settings_file_exists(DEFAULT_SETTINGS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_settings_overrides_markers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inter.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"net_total_marker": "LÍQUIDO PARA", "net_total_scale": 1.0}}"#
        )
        .unwrap();

        let layout = load_settings(&path).unwrap();

        assert_eq!(layout.net_total_marker, "LÍQUIDO PARA");
        assert_eq!(layout.net_total_scale, 1.0);
        assert_eq!(layout.header_marker, NoteLayout::default().header_marker);
    }

    #[test]
    fn test_load_settings_rejects_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("Parsing settings JSON"));
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");

        assert!(load_settings_with_fallback(Some(&missing)).is_err());
    }

    #[test]
    fn test_optional_settings_without_path() {
        assert!(load_optional_settings(None).unwrap().is_none());
    }

    #[test]
    fn test_settings_file_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert!(!settings_file_exists(&path));
        fs::write(&path, "{}").unwrap();
        assert!(settings_file_exists(&path));
        assert!(!settings_file_exists(dir.path()));
    }
}
