//! Explicit index mappings (`[{index, files[]}]`) and the scan that builds them.
//!
//! A [`ManualScan`] walks a source directory and asks a [`DecisionProvider`]
//! about every path no index has an opinion on yet. The resulting mapping is
//! planned through the same export synthesis as the automatic mode.

use crate::config::{Casing, ExportKind, FilesDefinition, IndexDefinition, IndexerConfig};
use crate::engine::aggregate::{IndexWrite, PlannedIndex};
use crate::engine::matcher::{is_generated, is_index_name};
use crate::engine::naming::{derive_name, derive_slug};
use crate::engine::resolve::{
    dirname, extension, is_source_file, join, normalize_path, relative_path, resolve_specifier,
};
use crate::engine::synth::{export_lines, render_index, PendingExport};
use crate::error::Result;
use crate::io::{Discovery, GlobQuery};
use globset::escape;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Answer to "what should index X export from path Y"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualChoice {
    Export(ExportKind),
    /// Stop offering this index for the rest of the scan
    SkipIndex,
}

/// Everything a provider needs to describe one export decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportQuestion<'a> {
    pub path: &'a str,
    pub index: &'a str,
    pub name: String,
    pub slug: String,
    /// The index is not in the mapping yet and may be declined entirely
    pub allow_skip_index: bool,
}

/// Source of the choices a person would otherwise make at a prompt
pub trait DecisionProvider {
    /// Build a configuration when none was supplied
    fn complete_config(&mut self) -> Result<Option<IndexerConfig>>;

    /// Which of `options` should include `path`
    fn select_indexes(&mut self, path: &str, options: &[String]) -> Result<Vec<String>>;

    fn choose_export(&mut self, question: &ExportQuestion<'_>) -> Result<ManualChoice>;

    /// Whether the last decision covers every file in `dir`
    fn apply_to_directory(&mut self, dir: &str) -> Result<bool>;
}

/// Fixed answers for non-interactive runs
#[derive(Debug, Clone)]
pub struct HeadlessDecisions {
    pub export: ExportKind,
    pub apply_to_directory: bool,
}

impl Default for HeadlessDecisions {
    fn default() -> Self {
        Self {
            export: ExportKind::Wildcard,
            apply_to_directory: true,
        }
    }
}

impl DecisionProvider for HeadlessDecisions {
    fn complete_config(&mut self) -> Result<Option<IndexerConfig>> {
        Ok(None)
    }

    fn select_indexes(&mut self, _path: &str, options: &[String]) -> Result<Vec<String>> {
        Ok(options.to_vec())
    }

    fn choose_export(&mut self, _question: &ExportQuestion<'_>) -> Result<ManualChoice> {
        Ok(ManualChoice::Export(self.export))
    }

    fn apply_to_directory(&mut self, _dir: &str) -> Result<bool> {
        Ok(self.apply_to_directory)
    }
}

/// Explicit mapping rooted at one source directory
pub struct ManualScan<'a> {
    discovery: &'a dyn Discovery,
    source: String,
    map: Vec<IndexDefinition>,
}

impl<'a> ManualScan<'a> {
    pub fn new(discovery: &'a dyn Discovery, source: &str, map: Vec<IndexDefinition>) -> Self {
        Self {
            discovery,
            source: normalize_path(source),
            map,
        }
    }

    pub fn map(&self) -> &[IndexDefinition] {
        &self.map
    }

    pub fn into_map(self) -> Vec<IndexDefinition> {
        self.map
    }

    fn under_source(&self, path: &str) -> bool {
        self.source == "." || path == self.source || path.starts_with(&format!("{}/", self.source))
    }

    /// Name relative to the source root, used for derived identifiers
    fn without_source(&self, path: &str) -> String {
        if self.source == "." {
            path.to_string()
        } else {
            relative_path(&self.source, path)
        }
    }

    /// Directories and script files, never an index
    fn is_candidate(&self, path: &str) -> bool {
        !is_index_name(path)
            && self.discovery.exists(path)
            && (is_source_file(path) || self.discovery.is_dir(path))
    }

    /// Complete the mapping for every unconfigured path. Returns whether it changed.
    pub fn scan(&mut self, decisions: &mut dyn DecisionProvider) -> Result<bool> {
        let before = self.map.clone();

        let pattern = vec![join(&escape(&self.source), "**/*")];
        let mut paths = Vec::new();
        for path in self.discovery.glob(&GlobQuery::any(&pattern, &[]))? {
            if !self.is_candidate(&path) || is_generated(self.discovery, &path)? {
                continue;
            }
            paths.push(path);
        }
        info!(source = %self.source, paths = paths.len(), "scanning");

        let typescript = paths.iter().any(|p| p.ends_with(".ts"));
        let mut skipped_indexes: BTreeSet<String> = BTreeSet::new();
        let mut last_dir: Option<String> = None;
        let mut apply_to_dir: Option<bool> = None;

        for path in &paths {
            let dir = dirname(path);
            if last_dir.as_deref() != Some(dir.as_str()) {
                apply_to_dir = None;
                last_dir = Some(dir.clone());
            }
            if apply_to_dir == Some(true) {
                debug!(path = %path, "using inherited directory mapping");
                continue;
            }

            let configured: BTreeSet<String> = self
                .map
                .iter()
                .filter(|def| def.files.iter().any(|f| f.covers(path)))
                .map(|def| def.index.clone())
                .collect();

            let index_ext = if !typescript || extension(path) == ".js" { "js" } else { "ts" };
            let options: Vec<String> = self
                .candidate_dirs(&dir)
                .into_iter()
                .map(|d| join(&d, &format!("index.{}", index_ext)))
                .filter(|index| !configured.contains(index) && !skipped_indexes.contains(index))
                .collect();

            if options.is_empty() {
                continue;
            }

            let selected = if options.len() == 1 {
                options.clone()
            } else {
                decisions.select_indexes(path, &options)?
            };

            let mut ordered: Vec<String> = selected.clone();
            ordered.extend(options.iter().filter(|o| !selected.contains(o)).cloned());

            for index in ordered {
                let mut export = ExportKind::Skip;
                if selected.contains(&index) {
                    let relative = self.without_source(path);
                    let question = ExportQuestion {
                        path,
                        index: &index,
                        name: derive_name(&relative, Casing::Keep),
                        slug: derive_slug(&dirname(&relative), &relative),
                        allow_skip_index: !self.map.iter().any(|d| d.index == index),
                    };
                    match decisions.choose_export(&question)? {
                        ManualChoice::SkipIndex => {
                            skipped_indexes.insert(index);
                            continue;
                        }
                        ManualChoice::Export(kind) => export = kind,
                    }
                }

                let whole_dir = match apply_to_dir {
                    Some(value) => value,
                    None => {
                        let value = decisions.apply_to_directory(&dir)?;
                        apply_to_dir = Some(value);
                        value
                    }
                };

                let definition = if whole_dir {
                    FilesDefinition::dir(dir.clone(), export)
                } else {
                    FilesDefinition::file(path.clone(), export)
                };
                self.definition_mut(&index).files.push(definition);
            }
        }

        Ok(self.map != before)
    }

    /// Directories from the source root down to `dir`, inclusive
    fn candidate_dirs(&self, dir: &str) -> Vec<String> {
        let mut dirs = vec![self.source.clone()];
        if dir == self.source {
            return dirs;
        }
        let rest = self.without_source(dir);
        let mut current = self.source.clone();
        for segment in rest.split('/').filter(|s| !s.is_empty() && *s != "..") {
            current = join(&current, segment);
            dirs.push(current.clone());
        }
        dirs
    }

    fn definition_mut(&mut self, index: &str) -> &mut IndexDefinition {
        let position = match self.map.iter().position(|d| d.index == index) {
            Some(position) => position,
            None => {
                self.map.push(IndexDefinition::new(index));
                self.map.len() - 1
            }
        };
        &mut self.map[position]
    }

    /// Render every index of the mapping that lives under the source root
    pub fn plan(&self) -> Result<Vec<PlannedIndex>> {
        let mut planned = Vec::new();

        for definition in self.map.iter().filter(|d| self.under_source(&normalize_path(&d.index))) {
            let index_path = normalize_path(&definition.index);
            let index_dir = dirname(&index_path);
            let skips: Vec<&FilesDefinition> = definition
                .files
                .iter()
                .filter(|f| f.export == ExportKind::Skip)
                .collect();
            let excluded = |p: &str| is_index_name(p) || skips.iter().any(|s| s.covers(p));

            let mut exports: Vec<PendingExport> = Vec::new();
            let mut skipped: BTreeSet<String> = BTreeSet::new();

            for entry in &definition.files {
                let paths = match (&entry.dir, &entry.file) {
                    (Some(dir), _) => {
                        let pattern = vec![join(&escape(dir), "*")];
                        let others: Vec<String> = definition
                            .files
                            .iter()
                            .filter(|f| f.file != entry.file)
                            .filter_map(|f| f.file.as_deref())
                            .map(|file| escape(&normalize_path(file)))
                            .collect();
                        self.discovery
                            .glob(&GlobQuery::any(&pattern, &others))?
                            .into_iter()
                            .filter(|p| self.is_candidate(p) && !excluded(p))
                            .collect::<Vec<_>>()
                    }
                    (None, Some(file)) => vec![normalize_path(file)],
                    (None, None) => {
                        warn!(index = %definition.index, "mapping entry has neither file nor dir");
                        continue;
                    }
                };

                for path in paths {
                    if is_index_name(&path) || is_generated_path(self.discovery, &path)? {
                        continue;
                    }
                    let specifier = resolve_specifier(&index_dir, &path);
                    if entry.export == ExportKind::Skip {
                        skipped.insert(specifier);
                        continue;
                    }
                    let relative = self.without_source(&path);
                    exports.push(PendingExport {
                        kind: entry.export,
                        specifier,
                        name: derive_name(&relative, Casing::Keep),
                        slug: derive_slug(&dirname(&relative), &relative),
                    });
                }
            }

            if !skipped.is_empty() {
                debug!(index = %index_path, skipped = ?skipped, "paths skipped");
            }

            let exports = export_lines(exports);
            if exports.is_empty() {
                planned.push(PlannedIndex::Empty { path: index_path });
            } else {
                planned.push(PlannedIndex::Write(IndexWrite {
                    count: exports.len(),
                    content: render_index(&exports, None),
                    path: index_path,
                }));
            }
        }

        Ok(planned)
    }
}

fn is_generated_path(discovery: &dyn Discovery, path: &str) -> Result<bool> {
    if !discovery.exists(path) {
        return Ok(false);
    }
    is_generated(discovery, path)
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn content_of(planned: &[PlannedIndex], path: &str) -> String {
        planned
            .iter()
            .find_map(|p| match p {
                PlannedIndex::Write(w) if w.path == path => Some(w.content.clone()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no write planned for {}", path))
    }

    /// Records every question and answers from a script
    struct Scripted {
        exports: Vec<ManualChoice>,
        whole_dir: bool,
        asked: Vec<String>,
    }

    impl DecisionProvider for Scripted {
        fn complete_config(&mut self) -> Result<Option<IndexerConfig>> {
            Ok(None)
        }

        fn select_indexes(&mut self, _path: &str, options: &[String]) -> Result<Vec<String>> {
            Ok(options[..1].to_vec())
        }

        fn choose_export(&mut self, question: &ExportQuestion<'_>) -> Result<ManualChoice> {
            self.asked.push(format!("{} -> {}", question.path, question.index));
            Ok(if self.exports.is_empty() {
                ManualChoice::Export(ExportKind::Wildcard)
            } else {
                self.exports.remove(0)
            })
        }

        fn apply_to_directory(&mut self, _dir: &str) -> Result<bool> {
            Ok(self.whole_dir)
        }
    }

    #[test]
    fn test_plan_from_explicit_mapping() {
        let dir = tree(&["src/a.ts", "src/b.ts", "src/legacy.ts", "src/utils/format.ts"]);
        let discovery = FsDiscovery::new(dir.path());
        let mut index = IndexDefinition::new("src/index.ts");
        index.files = vec![
            FilesDefinition::dir("src", ExportKind::Wildcard),
            FilesDefinition::file("src/a.ts", ExportKind::Default),
            FilesDefinition::file("src/legacy.ts", ExportKind::Skip),
            FilesDefinition::file("src/utils/format.ts", ExportKind::Slug),
        ];
        let scan = ManualScan::new(&discovery, "src", vec![index]);

        let planned = scan.plan().unwrap();
        let content = content_of(&planned, "src/index.ts");

        assert!(content.starts_with(BANNER));
        assert!(content.contains("export {default as a} from './a'\n"));
        assert!(content.contains("export * from './b'\n"));
        assert!(content.contains("export * from './utils'\n"));
        assert!(content.contains("export * as utils_format from './utils/format'\n"));
        assert!(!content.contains("legacy"));
        assert!(!content.contains("export * from './a'"));
    }

    #[test]
    fn test_plan_bracketed_directory() {
        let dir = tree(&["src/pages/[id]/view.ts", "src/pages/[id]/edit.ts"]);
        let discovery = FsDiscovery::new(dir.path());
        let mut index = IndexDefinition::new("src/pages/[id]/index.ts");
        index.files = vec![
            FilesDefinition::dir("src/pages/[id]", ExportKind::Wildcard),
            FilesDefinition::file("src/pages/[id]/edit.ts", ExportKind::Group),
        ];
        let scan = ManualScan::new(&discovery, "src", vec![index]);

        let planned = scan.plan().unwrap();
        let content = content_of(&planned, "src/pages/[id]/index.ts");

        assert!(content.contains("export * from './view'\n"));
        assert!(content.contains("export * as edit from './edit'\n"));
        assert!(!content.contains("export * from './edit'"));
    }

    #[test]
    fn test_scan_bracketed_source() {
        let dir = tree(&["app/[slug]/page.ts"]);
        let discovery = FsDiscovery::new(dir.path());
        let mut scan = ManualScan::new(&discovery, "app/[slug]", Vec::new());

        assert!(scan.scan(&mut HeadlessDecisions::default()).unwrap());
        let planned = scan.plan().unwrap();
        assert!(content_of(&planned, "app/[slug]/index.ts").contains("export * from './page'\n"));
    }

    #[test]
    fn test_plan_only_under_source() {
        let dir = tree(&["src/a.ts", "lib/b.ts"]);
        let discovery = FsDiscovery::new(dir.path());
        let mut outside = IndexDefinition::new("lib/index.ts");
        outside.files = vec![FilesDefinition::file("lib/b.ts", ExportKind::Wildcard)];
        let scan = ManualScan::new(&discovery, "src", vec![outside]);

        assert!(scan.plan().unwrap().is_empty());
    }

    #[test]
    fn test_headless_scan_builds_directory_mapping() {
        let dir = tree(&["src/a.ts", "src/b.ts", "src/notes.md", "src/sub/c.ts"]);
        let discovery = FsDiscovery::new(dir.path());
        let mut scan = ManualScan::new(&discovery, "src", Vec::new());

        let changed = scan.scan(&mut HeadlessDecisions::default()).unwrap();
        assert!(changed);

        let root = scan.map().iter().find(|d| d.index == "src/index.ts").unwrap();
        assert!(root.files.contains(&FilesDefinition::dir("src", ExportKind::Wildcard)));
        let sub = scan.map().iter().find(|d| d.index == "src/sub/index.ts").unwrap();
        assert!(sub.files.contains(&FilesDefinition::dir("src/sub", ExportKind::Wildcard)));

        let planned = scan.plan().unwrap();
        let root_content = content_of(&planned, "src/index.ts");
        assert!(root_content.contains("export * from './a'\n"));
        assert!(root_content.contains("export * from './sub'\n"));
        assert!(!root_content.contains("notes"));
        let sub_content = content_of(&planned, "src/sub/index.ts");
        assert!(sub_content.contains("export * from './c'\n"));

        // nothing left to ask on a second pass
        assert!(!scan.scan(&mut HeadlessDecisions::default()).unwrap());
    }

    #[test]
    fn test_scan_records_unselected_as_skip() {
        let dir = tree(&["src/sub/c.ts"]);
        let discovery = FsDiscovery::new(dir.path());
        let mut scan = ManualScan::new(&discovery, "src", Vec::new());
        let mut decisions = Scripted {
            exports: vec![ManualChoice::Export(ExportKind::Default)],
            whole_dir: false,
            asked: Vec::new(),
        };

        scan.scan(&mut decisions).unwrap();

        // `src/sub` itself is offered to src/index.ts, then c.ts gets asked
        assert_eq!(decisions.asked[0], "src/sub -> src/index.ts");
        let root = scan.map().iter().find(|d| d.index == "src/index.ts").unwrap();
        assert!(root.files.contains(&FilesDefinition::file("src/sub", ExportKind::Default)));
        assert!(root.files.contains(&FilesDefinition::file("src/sub/c.ts", ExportKind::Wildcard)));
        let sub = scan.map().iter().find(|d| d.index == "src/sub/index.ts").unwrap();
        assert!(sub.files.contains(&FilesDefinition::file("src/sub/c.ts", ExportKind::Skip)));
    }

    #[test]
    fn test_scan_skip_index_not_offered_again() {
        let dir = tree(&["src/a.ts", "src/b.ts"]);
        let discovery = FsDiscovery::new(dir.path());
        let mut scan = ManualScan::new(&discovery, "src", Vec::new());
        let mut decisions = Scripted {
            exports: vec![ManualChoice::SkipIndex],
            whole_dir: false,
            asked: Vec::new(),
        };

        assert!(!scan.scan(&mut decisions).unwrap());
        assert_eq!(decisions.asked, vec!["src/a.ts -> src/index.ts"]);
        assert!(scan.map().is_empty());
    }

    #[test]
    fn test_generated_files_not_scanned() {
        let dir = tree(&["src/a.ts"]);
        fs::write(
            dir.path().join("src/barrel.ts"),
            format!("{}\n\nexport * from './a'\n", BANNER),
        )
        .unwrap();
        let discovery = FsDiscovery::new(dir.path());
        let mut scan = ManualScan::new(&discovery, "src", Vec::new());
        let mut decisions = Scripted {
            exports: Vec::new(),
            whole_dir: false,
            asked: Vec::new(),
        };

        scan.scan(&mut decisions).unwrap();
        assert_eq!(decisions.asked, vec!["src/a.ts -> src/index.ts"]);
    }
}
