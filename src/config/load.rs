use super::IndexerSpec;
use crate::error::{IndexerError, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name offered when an updated configuration has nowhere to go yet
pub const DEFAULT_CONFIG_NAME: &str = "indexer.config.json";

const PACKAGE_JSON: &str = "package.json";
const PACKAGE_KEY: &str = "indexer";

/// Searched in every directory, first hit wins
const CANDIDATES: &[&str] = &[PACKAGE_JSON, ".indexerrc", ".indexerrc.json", DEFAULT_CONFIG_NAME];

/// A configuration together with where it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub spec: IndexerSpec,
    /// The configuration lives under the `indexer` key of a package manifest
    pub in_package_json: bool,
}

fn is_package_json(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == PACKAGE_JSON)
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        IndexerError::config(format!("Failed to parse {}: {}", path.display(), e))
    })
}

fn package_has_config(path: &Path) -> bool {
    read_json(path)
        .ok()
        .is_some_and(|value| value.get(PACKAGE_KEY).is_some())
}

/// Walk up from `start` looking for a configuration file.
///
/// The walk stops after the home directory, or at the file-system root when
/// `start` is outside of it.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let home = dirs::home_dir();

    for dir in start.ancestors() {
        for name in CANDIDATES {
            let candidate = dir.join(name);
            if !candidate.is_file() {
                continue;
            }
            if is_package_json(&candidate) && !package_has_config(&candidate) {
                continue;
            }
            debug!(path = %candidate.display(), "found configuration");
            return Some(candidate);
        }

        if home.as_deref() == Some(dir) {
            break;
        }
    }

    None
}

/// Load the configuration at `explicit`, or search upwards from `start`.
///
/// An explicit path that does not exist falls back to the search.
pub fn load_config(explicit: Option<&Path>, start: &Path) -> Result<Option<LoadedConfig>> {
    let path = match explicit.filter(|p| p.is_file()) {
        Some(path) => path.to_path_buf(),
        None => match find_config(start) {
            Some(path) => path,
            None => return Ok(None),
        },
    };

    let mut value = read_json(&path)?;
    let in_package_json = is_package_json(&path);
    if in_package_json {
        value = match value.get_mut(PACKAGE_KEY) {
            Some(inner) => inner.take(),
            None => {
                return Err(IndexerError::config(format!(
                    "{} has no \"{}\" key",
                    path.display(),
                    PACKAGE_KEY
                )));
            }
        };
    }

    let spec = IndexerSpec::from_value(value)?;
    Ok(Some(LoadedConfig {
        path,
        spec,
        in_package_json,
    }))
}

/// Write `spec` to `path` as pretty JSON.
///
/// A `package.json` keeps every other key; only `indexer` is replaced.
pub fn save_config(path: &Path, spec: &IndexerSpec) -> Result<()> {
    let spec_value = serde_json::to_value(spec)?;

    let document = if is_package_json(path) && path.is_file() {
        let mut manifest = read_json(path)?;
        match manifest.as_object_mut() {
            Some(object) => {
                object.insert(PACKAGE_KEY.to_string(), spec_value);
            }
            None => {
                return Err(IndexerError::config(format!(
                    "{} is not a JSON object",
                    path.display()
                )));
            }
        }
        manifest
    } else {
        spec_value
    };

    let mut content = serde_json::to_string_pretty(&document)?;
    content.push('\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    debug!(path = %path.display(), "configuration saved");
    Ok(())
}
