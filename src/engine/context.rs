//! State shared by every configuration within a single generation run.

use crate::config::{AppConfig, IndexerSpec};
use crate::engine::matcher::compile_glob;
use crate::engine::resolve::normalize_path;
use globset::GlobMatcher;
use tracing::debug;

/// Outputs known to the current run.
///
/// Built once at the start of [`Driver::run`](crate::engine::Driver::run) and
/// dropped when it returns, so a later run always sees fresh outputs.
#[derive(Debug, Default)]
pub struct RunContext {
    outputs: Vec<String>,
    patterns: Vec<GlobMatcher>,
}

impl RunContext {
    pub fn new(outputs: Vec<String>) -> Self {
        let mut outputs: Vec<String> = outputs.iter().map(|o| normalize_path(o)).collect();
        outputs.sort();
        outputs.dedup();

        // outputs double as globs, so `src/*/index.ts` covers every package
        let patterns = outputs
            .iter()
            .filter_map(|o| match compile_glob(o) {
                Ok(glob) => Some(glob),
                Err(err) => {
                    debug!(
                        output = %o,
                        error = %err,
                        "output is not a valid glob, matching literally"
                    );
                    None
                }
            })
            .collect();

        Self { outputs, patterns }
    }

    /// Context for everything an app config will generate
    pub fn for_app(app: &AppConfig) -> Self {
        let outputs = match &app.indexer {
            Some(IndexerSpec::Auto(config)) => config.declared_outputs(),
            Some(IndexerSpec::Manual(defs)) => defs.iter().map(|d| d.index.clone()).collect(),
            Some(IndexerSpec::ManualNamed(map)) => map
                .iter()
                .flat_map(|(_, defs)| defs.iter().map(|d| d.index.clone()))
                .collect(),
            None => Vec::new(),
        };
        Self::new(outputs)
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn is_known_output(&self, path: &str) -> bool {
        self.outputs.iter().any(|o| o == path) || self.patterns.iter().any(|g| g.is_match(path))
    }
}
