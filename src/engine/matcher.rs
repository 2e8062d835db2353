//! Ignore rules and export-kind overrides.

use crate::config::{ExportKind, ResolvedConfig};
use crate::engine::context::RunContext;
use crate::engine::synth::BANNER;
use crate::error::{IndexerError, Result};
use crate::io::Discovery;
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

/// Generic index file names (`index.ts`, `src/index.js`, ...)
static INDEX_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|/)index\.[a-z]+$").expect("valid index name pattern"));

/// Whether the path names a generic `index.<ext>` file
pub fn is_index_name(path: &str) -> bool {
    INDEX_NAME.is_match(path)
}

fn build_glob(pattern: &str) -> Result<globset::Glob> {
    let normalized = pattern.trim_start_matches("./");
    GlobBuilder::new(normalized)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map_err(|source| IndexerError::Glob {
            pattern: pattern.to_string(),
            source,
        })
}

/// Compile a single glob where `*` stays within one path segment
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    Ok(build_glob(pattern)?.compile_matcher())
}

/// Compile a list of globs into one set
pub fn compile_set<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        if pattern.trim().is_empty() {
            continue;
        }
        builder.add(build_glob(pattern)?);
    }
    builder.build().map_err(|source| IndexerError::Glob {
        pattern: patterns
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(", "),
        source,
    })
}

/// Ordered glob → value rules; the first declared match wins
#[derive(Debug, Clone)]
pub struct Overrides<K> {
    rules: Vec<(GlobMatcher, K)>,
}

impl<K: Copy> Overrides<K> {
    pub fn compile(entries: &[(String, K)]) -> Result<Self> {
        let rules = entries
            .iter()
            .map(|(pattern, kind)| Ok((compile_glob(pattern)?, *kind)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn first_match(&self, path: &str) -> Option<K> {
        self.rules
            .iter()
            .find(|(glob, _)| glob.is_match(path))
            .map(|(_, kind)| *kind)
    }
}

/// Decides which discovered paths are excluded and how the rest are exported
pub struct Matcher<'a> {
    output: &'a str,
    ignore: GlobSet,
    overrides: Overrides<ExportKind>,
    default_kind: ExportKind,
    ctx: &'a RunContext,
    discovery: &'a dyn Discovery,
}

impl<'a> Matcher<'a> {
    pub fn new(
        config: &'a ResolvedConfig,
        ctx: &'a RunContext,
        discovery: &'a dyn Discovery,
    ) -> Result<Self> {
        Ok(Self {
            output: &config.output,
            ignore: compile_set(&config.ignore)?,
            overrides: Overrides::compile(&config.overrides)?,
            default_kind: config.kind,
            ctx,
            discovery,
        })
    }

    /// Whether `path` must not contribute to any index
    pub fn is_ignored(&self, path: &str) -> Result<bool> {
        if path == self.output {
            return Ok(true);
        }
        if !self.discovery.exists(path) {
            trace!(path, "ignored: missing");
            return Ok(true);
        }
        if self.ignore.is_match(path) {
            trace!(path, "ignored: pattern");
            return Ok(true);
        }
        if self.ctx.is_known_output(path) || is_index_name(path) {
            return is_generated(self.discovery, path);
        }
        Ok(false)
    }

    /// Export kind for `path`: first matching override, else the configured type
    pub fn resolve_kind(&self, path: &str) -> ExportKind {
        self.overrides.first_match(path).unwrap_or(self.default_kind)
    }
}

/// Whether the file at `path` starts with the generated-file banner
pub fn is_generated(discovery: &dyn Discovery, path: &str) -> Result<bool> {
    if discovery.is_dir(path) {
        return Ok(false);
    }
    let generated = discovery.first_line(path)?.as_deref() == Some(BANNER);
    if generated {
        trace!(path, "ignored: generated index");
    }
    Ok(generated)
}
