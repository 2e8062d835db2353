use crate::engine::resolve::normalize_path;
use crate::error::{IndexerError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Destination for generated index files
pub trait IndexSink {
    /// Replace the whole content of `path`, creating parent directories
    fn write(&self, path: &str, content: &str) -> Result<()>;
}

/// [`IndexSink`] writing below a root directory.
///
/// Content goes to a temporary file in the target directory which is then
/// renamed over the target, so readers never observe a partial index.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl IndexSink for FsSink {
    fn write(&self, path: &str, content: &str) -> Result<()> {
        let target = self.root.join(normalize_path(path));
        let write_error = |source: std::io::Error| IndexerError::Write {
            path: path.to_string(),
            source,
        };

        let parent = target.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).map_err(write_error)?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(write_error)?;
        tmp.write_all(content.as_bytes()).map_err(write_error)?;
        tmp.flush().map_err(write_error)?;
        tmp.persist(&target).map_err(|e| write_error(e.error))?;

        debug!(path, bytes = content.len(), "index written");
        Ok(())
    }
}
