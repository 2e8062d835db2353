//! Turns one resolved configuration into planned index files.
//!
//! Flat mode produces a single index at the configured output. Recursive mode
//! produces one index per directory that holds matched files; the output's own
//! directory additionally re-exports those immediate subdirectories that will
//! hold an index after the pass. Nested files never reach a parent's index
//! directly.

use crate::config::{DefaultKind, ExportKind, ResolvedConfig, ResolvedDefault, Sources};
use crate::engine::context::RunContext;
use crate::engine::matcher::{is_generated, Matcher, Overrides};
use crate::engine::naming::{base_name, derive_name, derive_slug, unique_binding};
use crate::engine::resolve::{dirname, extension, join, normalize_path, resolve_specifier};
use crate::engine::synth::{
    default_statement, export_lines, import_line, render_index, DefaultBlock, PendingExport,
};
use crate::error::Result;
use crate::io::{Discovery, GlobQuery};
use globset::escape;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// A fully rendered index file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexWrite {
    pub path: String,
    pub content: String,
    /// Number of export statements
    pub count: usize,
}

/// What should happen to one index path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedIndex {
    Write(IndexWrite),
    /// Nothing to export; the file is left as it is
    Empty { path: String },
    /// A hand-written index occupies the path and is left alone
    Preserved { path: String },
}

/// Result of aggregating one configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub indexes: Vec<PlannedIndex>,
    /// Set when discovery matched nothing at all
    pub no_matches: Option<Vec<String>>,
}

/// Export lines collected for one index
#[derive(Debug, Default)]
struct IndexLines {
    exports: Vec<PendingExport>,
    skipped: Vec<String>,
}

impl IndexLines {
    fn has_specifier(&self, specifier: &str) -> bool {
        self.exports.iter().any(|e| e.specifier == specifier)
            || self.skipped.iter().any(|s| s == specifier)
    }
}

pub struct Aggregator<'a> {
    discovery: &'a dyn Discovery,
    ctx: &'a RunContext,
}

impl<'a> Aggregator<'a> {
    pub fn new(discovery: &'a dyn Discovery, ctx: &'a RunContext) -> Self {
        Self { discovery, ctx }
    }

    pub fn aggregate(&self, config: &ResolvedConfig) -> Result<Plan> {
        let matcher = Matcher::new(config, self.ctx, self.discovery)?;

        let mut exclude = vec![escape(&config.output)];
        exclude.extend(config.ignore.iter().cloned());
        let files = self
            .discovery
            .glob(&GlobQuery::files(&config.sources, &exclude))?;
        debug!(output = %config.output, candidates = files.len(), "discovered sources");

        let mut plan = Plan::default();
        if files.is_empty() {
            plan.no_matches = Some(config.sources.clone());
        }

        if config.recursive {
            self.aggregate_recursive(config, &matcher, &files, &mut plan)?;
        } else {
            let index_dir = dirname(&config.output);
            let mut lines = IndexLines::default();
            for file in &files {
                if matcher.is_ignored(file)? {
                    continue;
                }
                self.push_export(config, &matcher, &index_dir, file, &mut lines);
            }
            if !(lines.exports.is_empty() && files.is_empty()) {
                let planned = self.finish(config, &config.output, lines)?;
                plan.indexes.push(planned);
            }
        }

        Ok(plan)
    }

    fn aggregate_recursive(
        &self,
        config: &ResolvedConfig,
        matcher: &Matcher<'_>,
        files: &[String],
        plan: &mut Plan,
    ) -> Result<()> {
        let root_dir = dirname(&config.output);
        let ext = extension(&config.output);
        let index_file = |dir: &str| -> String {
            if dir == root_dir {
                config.output.clone()
            } else {
                join(dir, &format!("index{}", ext))
            }
        };

        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        groups.insert(root_dir.clone(), Vec::new());

        for file in files {
            if matcher.is_ignored(file)? {
                continue;
            }
            let dir = dirname(file);
            if *file == index_file(&dir) {
                // a directory's own index never re-exports itself
                continue;
            }
            groups.entry(dir).or_default().push(file.clone());
        }

        let mut rendered: BTreeMap<String, IndexLines> = BTreeMap::new();
        for (dir, members) in &groups {
            if *dir == root_dir {
                continue;
            }
            let mut lines = IndexLines::default();
            for file in members {
                self.push_export(config, matcher, dir, file, &mut lines);
            }
            rendered.insert(dir.clone(), lines);
        }

        let mut root_lines = IndexLines::default();
        for file in &groups[&root_dir] {
            self.push_export(config, matcher, &root_dir, file, &mut root_lines);
        }

        let subdir_pattern = vec![join(&escape(&root_dir), "*")];
        let subdirs = self
            .discovery
            .glob(&GlobQuery::dirs(&subdir_pattern, &config.ignore))?;
        for sub in subdirs {
            let specifier = resolve_specifier(&root_dir, &sub);
            if root_lines.has_specifier(&specifier) {
                // a sibling file already answers to the same specifier
                debug!(dir = %sub, specifier = %specifier, "subdirectory shadowed by file");
                continue;
            }
            let will_have_index = rendered
                .get(&sub)
                .is_some_and(|lines| !lines.exports.is_empty());
            if will_have_index || self.discovery.exists(&index_file(&sub)) {
                self.push_export(config, matcher, &root_dir, &sub, &mut root_lines);
            } else {
                trace!(dir = %sub, "subdirectory has no index, not re-exported");
            }
        }
        rendered.insert(root_dir.clone(), root_lines);

        for (dir, lines) in rendered {
            let path = index_file(&dir);
            if dir != root_dir
                && self.discovery.exists(&path)
                && !is_generated(self.discovery, &path)?
            {
                debug!(path = %path, "hand-written index left untouched");
                plan.indexes.push(PlannedIndex::Preserved { path });
                continue;
            }
            if dir == root_dir && lines.exports.is_empty() && files.is_empty() {
                continue;
            }
            plan.indexes.push(self.finish(config, &path, lines)?);
        }
        Ok(())
    }

    fn push_export(
        &self,
        config: &ResolvedConfig,
        matcher: &Matcher<'_>,
        index_dir: &str,
        path: &str,
        lines: &mut IndexLines,
    ) {
        let kind = matcher.resolve_kind(path);
        let specifier = resolve_specifier(index_dir, path);

        if kind == ExportKind::Skip {
            trace!(path, "skipped");
            lines.skipped.push(specifier);
            return;
        }
        trace!(path, %kind, "export");
        lines.exports.push(PendingExport {
            kind,
            specifier,
            name: derive_name(path, config.casing),
            slug: derive_slug(&dirname(path), path),
        });
    }

    fn finish(
        &self,
        config: &ResolvedConfig,
        path: &str,
        lines: IndexLines,
    ) -> Result<PlannedIndex> {
        if !lines.skipped.is_empty() {
            debug!(index = %path, skipped = ?lines.skipped, "paths skipped");
        }
        if lines.exports.is_empty() {
            return Ok(PlannedIndex::Empty {
                path: path.to_string(),
            });
        }

        let block = match &config.default_export {
            Some(default) if path == config.output => Some(self.default_block(config, default)?),
            _ => None,
        };

        let exports = export_lines(lines.exports);
        Ok(PlannedIndex::Write(IndexWrite {
            path: path.to_string(),
            content: render_index(&exports, block.as_ref()),
            count: exports.len(),
        }))
    }

    /// Imports and `export default` statement for the configured output
    pub fn default_block(
        &self,
        config: &ResolvedConfig,
        default: &ResolvedDefault,
    ) -> Result<DefaultBlock> {
        let (files, single) = match &default.source {
            Sources::One(path) => (vec![normalize_path(path)], true),
            Sources::Many(patterns) => {
                let patterns: Vec<String> = patterns.iter().map(|p| normalize_path(p)).collect();
                let mut exclude = vec![escape(&config.output)];
                exclude.extend(default.ignore.iter().cloned());
                let files = self.discovery.glob(&GlobQuery::files(&patterns, &exclude))?;
                (files, false)
            }
        };
        debug!(sources = files.len(), "building default export");

        let overrides = Overrides::compile(&default.overrides)?;
        let index_dir = dirname(&config.output);
        let mut imports = Vec::with_capacity(files.len());
        let mut bindings = Vec::with_capacity(files.len());
        let mut used = BTreeSet::new();

        for file in &files {
            let kind = overrides.first_match(file).unwrap_or(default.kind);
            let specifier = resolve_specifier(&index_dir, file);
            let derived = match kind {
                DefaultKind::Slug => derive_slug(&dirname(file), &base_name(file)),
                _ => derive_name(file, default.casing),
            };
            let binding = unique_binding(&derived, &mut used);
            imports.push(import_line(kind, &specifier, &binding));
            bindings.push(binding);
        }

        Ok(DefaultBlock {
            imports,
            statement: default_statement(&bindings, single),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Casing, DefaultExportConfig, ExportKind, IndexerConfig};
    use crate::engine::synth::BANNER;
    use crate::io::FsDiscovery;
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for path in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, "export default {}\n").unwrap();
        }
        dir
    }

    fn plan_for(dir: &TempDir, config: IndexerConfig) -> Plan {
        let discovery = FsDiscovery::new(dir.path());
        let resolved = config.resolve().unwrap();
        let ctx = RunContext::new(vec![resolved.output.clone()]);
        Aggregator::new(&discovery, &ctx).aggregate(&resolved).unwrap()
    }

    fn written(plan: &Plan, path: &str) -> String {
        plan.indexes
            .iter()
            .find_map(|p| match p {
                PlannedIndex::Write(w) if w.path == path => Some(w.content.clone()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no write planned for {}", path))
    }

    #[test]
    fn test_flat_wildcard() {
        let dir = tree(&["src/b.ts", "src/a.ts"]);
        let plan = plan_for(&dir, IndexerConfig::new("src/*.ts", "src/index.ts"));

        assert_eq!(plan.indexes.len(), 1);
        assert_eq!(
            written(&plan, "src/index.ts"),
            format!("{}\n\nexport * from './a'\nexport * from './b'\n", BANNER)
        );
    }

    #[test]
    fn test_flat_default_pascal() {
        let dir = tree(&["src/a.ts", "src/b.ts"]);
        let config = IndexerConfig::new("src/*.ts", "src/index.ts")
            .with_kind(ExportKind::Default)
            .with_casing(Casing::Pascal);
        let content = written(&plan_for(&dir, config), "src/index.ts");

        assert!(content.contains("export {default as A} from './a'\n"));
        assert!(content.contains("export {default as B} from './b'\n"));
    }

    #[test]
    fn test_overrides_and_skip() {
        let dir = tree(&["src/a.ts", "src/b.ts", "src/c.ts"]);
        let config = IndexerConfig::new("src/*.ts", "src/index.ts")
            .with_override("src/a.ts", ExportKind::Group)
            .with_override("src/*.ts", ExportKind::Default)
            .with_override("src/c.ts", ExportKind::Skip);
        let content = written(&plan_for(&dir, config), "src/index.ts");

        assert!(content.contains("export * as a from './a'"));
        assert!(content.contains("export {default as b} from './b'"));
        // c matched the earlier `src/*.ts` rule first
        assert!(content.contains("export {default as c} from './c'"));
    }

    #[test]
    fn test_all_skipped_is_empty() {
        let dir = tree(&["src/a.ts"]);
        let config = IndexerConfig::new("src/*.ts", "src/index.ts").with_kind(ExportKind::Skip);
        let plan = plan_for(&dir, config);

        assert_eq!(
            plan.indexes,
            vec![PlannedIndex::Empty {
                path: "src/index.ts".to_string()
            }]
        );
        assert!(plan.no_matches.is_none());
    }

    #[test]
    fn test_no_matches() {
        let dir = tree(&["lib/a.ts"]);
        let plan = plan_for(&dir, IndexerConfig::new("src/*.ts", "src/index.ts"));

        assert!(plan.indexes.is_empty());
        assert_eq!(plan.no_matches, Some(vec!["src/*.ts".to_string()]));
    }

    #[test]
    fn test_generated_output_not_reingested() {
        let dir = tree(&["src/a.ts"]);
        fs::write(
            dir.path().join("src/index.ts"),
            format!("{}\n\nexport * from './a'\n", BANNER),
        )
        .unwrap();
        let plan = plan_for(&dir, IndexerConfig::new("src/**/*.ts", "src/index.ts"));

        let content = written(&plan, "src/index.ts");
        assert!(!content.contains("'./index'"));
    }

    #[test]
    fn test_recursive_groups_per_directory() {
        let dir = tree(&["src/a.ts", "src/sub/c.ts", "src/sub/d.ts", "src/other/readme.md"]);
        let config = IndexerConfig::new("src/**/*.ts", "src/index.ts").with_recursive(true);
        let plan = plan_for(&dir, config);

        let root = written(&plan, "src/index.ts");
        let sub = written(&plan, "src/sub/index.ts");

        assert_eq!(
            sub,
            format!("{}\n\nexport * from './c'\nexport * from './d'\n", BANNER)
        );
        assert!(root.contains("export * from './a'\n"));
        assert!(root.contains("export * from './sub'\n"));
        assert!(!root.contains("./sub/c"));
        // `other` has no index, so it is not re-exported
        assert!(!root.contains("./other"));
    }

    #[test]
    fn test_recursive_preserves_hand_written_index() {
        let dir = tree(&["src/a.ts", "src/sub/c.ts"]);
        fs::write(dir.path().join("src/sub/index.ts"), "export * from './c'\n").unwrap();
        let config = IndexerConfig::new("src/**/*.ts", "src/index.ts").with_recursive(true);
        let plan = plan_for(&dir, config);

        assert!(plan.indexes.contains(&PlannedIndex::Preserved {
            path: "src/sub/index.ts".to_string()
        }));
        let root = written(&plan, "src/index.ts");
        assert!(root.contains("export * from './sub'\n"));
    }

    #[test]
    fn test_slug_disambiguates_same_names() {
        let dir = tree(&["src/a/util.ts", "src/b/util.ts"]);
        let config = IndexerConfig::new("src/**/*.ts", "src/index.ts").with_kind(ExportKind::Slug);
        let content = written(&plan_for(&dir, config), "src/index.ts");

        assert!(content.contains("export * as src_a_util from './a/util'"));
        assert!(content.contains("export * as src_b_util from './b/util'"));
    }

    #[test]
    fn test_recursive_file_shadows_subdirectory() {
        let dir = tree(&["src/sub.ts", "src/sub/c.ts"]);
        let config = IndexerConfig::new("src/**/*.ts", "src/index.ts")
            .with_kind(ExportKind::Group)
            .with_recursive(true);
        let plan = plan_for(&dir, config);

        let root = written(&plan, "src/index.ts");
        assert_eq!(root, format!("{}\n\nexport * as sub from './sub'\n", BANNER));
        assert!(written(&plan, "src/sub/index.ts").contains("export * as c from './c'"));
    }

    #[test]
    fn test_colliding_slugs_get_suffixes() {
        let dir = tree(&["a/x-y/x.ts", "a/x_y/x.ts", "a/b-c/x.ts", "a/b/c/x.ts"]);
        let config = IndexerConfig::new("a/**/*.ts", "a/index.ts").with_kind(ExportKind::Slug);
        let content = written(&plan_for(&dir, config), "a/index.ts");

        let expected = [
            BANNER,
            "",
            "export * as a_b_c_x from './b-c/x'",
            "export * as a_b_c_x_2 from './b/c/x'",
            "export * as a_x_y_x from './x-y/x'",
            "export * as a_x_y_x_2 from './x_y/x'",
        ]
        .join("\n")
            + "\n";
        assert_eq!(content, expected);
    }

    #[test]
    fn test_recursive_bracketed_directory() {
        let dir = tree(&["src/pages/[id]/view.ts", "src/pages/home.ts"]);
        let config =
            IndexerConfig::new("src/pages/**/*.ts", "src/pages/index.ts").with_recursive(true);
        let plan = plan_for(&dir, config);

        let root = written(&plan, "src/pages/index.ts");
        assert!(root.contains("export * from './[id]'\n"));
        assert!(root.contains("export * from './home'\n"));
        assert!(written(&plan, "src/pages/[id]/index.ts").contains("export * from './view'"));
    }

    #[test]
    fn test_default_block_unique_bindings() {
        let dir = tree(&["src/a.ts", "src/plugins/my-util.ts", "src/plugins/my_util.ts"]);
        let mut config = IndexerConfig::new("src/*.ts", "src/index.ts");
        config.default_export = Some(DefaultExportConfig {
            source: Some(Sources::Many(vec!["src/plugins/*.ts".to_string()])),
            kind: Some(DefaultKind::Default),
            ..DefaultExportConfig::default()
        });
        let content = written(&plan_for(&dir, config), "src/index.ts");

        assert!(content.contains("import {default as myutil} from './plugins/my-util'\n"));
        assert!(content.contains("import {default as myutil_2} from './plugins/my_util'\n"));
        assert!(content.ends_with("export default { myutil, myutil_2 }\n"));
    }

    #[test]
    fn test_default_block_object() {
        let dir = tree(&["src/a.ts", "src/b.ts", "src/plugins/zed.ts", "src/plugins/alpha.ts"]);
        let mut config = IndexerConfig::new("src/*.ts", "src/index.ts");
        config.default_export = Some(DefaultExportConfig {
            source: Some(Sources::Many(vec!["src/plugins/*.ts".to_string()])),
            kind: Some(DefaultKind::Default),
            ..DefaultExportConfig::default()
        });
        let content = written(&plan_for(&dir, config), "src/index.ts");

        let expected = [
            BANNER,
            "",
            "import {default as alpha} from './plugins/alpha'",
            "import {default as zed} from './plugins/zed'",
            "",
            "export * from './a'",
            "export * from './b'",
            "",
            "export default { alpha, zed }",
        ]
        .join("\n")
            + "\n";
        assert_eq!(content, expected);
    }

    #[test]
    fn test_default_block_single_path() {
        let dir = tree(&["src/a.ts", "src/app.ts"]);
        let mut config = IndexerConfig::new("src/a.ts", "src/index.ts");
        config.default_export = Some(DefaultExportConfig {
            source: Some(Sources::One("src/app.ts".to_string())),
            kind: Some(DefaultKind::Slug),
            ..DefaultExportConfig::default()
        });
        let content = written(&plan_for(&dir, config), "src/index.ts");

        assert!(content.contains("import * as src_app from './app'\n"));
        assert!(content.ends_with("\nexport default src_app\n"));
    }
}
