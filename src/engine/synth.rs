//! Export / import statement rendering and index file assembly.

use crate::config::{DefaultKind, ExportKind};
use crate::engine::naming::unique_binding;
use std::collections::BTreeSet;
use tracing::debug;

/// First line of every generated index; also how earlier output is recognised
pub const BANNER: &str = "// This file was generated by indexgen. Changes will be overwritten.";

/// Re-export statement for one path, or `None` for [`ExportKind::Skip`]
pub fn export_line(kind: ExportKind, specifier: &str, name: &str, slug: &str) -> Option<String> {
    match kind {
        ExportKind::Default => Some(format!("export {{default as {}}} from '{}'", name, specifier)),
        ExportKind::Group => Some(format!("export * as {} from '{}'", name, specifier)),
        ExportKind::Slug => Some(format!("export * as {} from '{}'", slug, specifier)),
        ExportKind::Wildcard | ExportKind::Individual => {
            Some(format!("export * from '{}'", specifier))
        }
        ExportKind::Skip => None,
    }
}

/// One path waiting to become an export line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExport {
    pub kind: ExportKind,
    pub specifier: String,
    pub name: String,
    pub slug: String,
}

impl PendingExport {
    fn line(&self) -> Option<String> {
        export_line(self.kind, &self.specifier, &self.name, &self.slug)
    }

    /// Name the export introduces into the index, if any
    fn binding(&self) -> Option<&str> {
        match self.kind {
            ExportKind::Default | ExportKind::Group => Some(&self.name),
            ExportKind::Slug => Some(&self.slug),
            ExportKind::Wildcard | ExportKind::Individual | ExportKind::Skip => None,
        }
    }

    fn rename(&mut self, binding: String) {
        match self.kind {
            ExportKind::Slug => self.slug = binding,
            _ => self.name = binding,
        }
    }
}

/// Export lines for one index.
///
/// Entries are taken in specifier order. A line identical to an earlier one is
/// dropped, and a binding already used in the index gets a numeric suffix.
pub fn export_lines(mut pending: Vec<PendingExport>) -> Vec<String> {
    pending.sort_by(|a, b| a.specifier.cmp(&b.specifier));

    let mut lines: Vec<String> = Vec::with_capacity(pending.len());
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut bindings: BTreeSet<String> = BTreeSet::new();

    for mut export in pending {
        let Some(line) = export.line() else {
            continue;
        };
        if !seen.insert(line) {
            debug!(specifier = %export.specifier, "duplicate export dropped");
            continue;
        }
        if let Some(binding) = export.binding().map(str::to_string) {
            let unique = unique_binding(&binding, &mut bindings);
            if unique != binding {
                debug!(
                    specifier = %export.specifier,
                    from = %binding,
                    to = %unique,
                    "binding renamed"
                );
                export.rename(unique);
            }
        }
        if let Some(line) = export.line() {
            lines.push(line);
        }
    }
    lines
}

/// Import statement feeding the aggregated default export
pub fn import_line(kind: DefaultKind, specifier: &str, binding: &str) -> String {
    match kind {
        DefaultKind::Default => format!("import {{default as {}}} from '{}'", binding, specifier),
        DefaultKind::Group | DefaultKind::Slug => {
            format!("import * as {} from '{}'", binding, specifier)
        }
    }
}

/// Trailing `export default` statement.
///
/// A single-path source exports its binding directly; a list source exports an
/// object of every binding, keys sorted.
pub fn default_statement(bindings: &[String], single: bool) -> String {
    if single {
        if let Some(first) = bindings.first() {
            return format!("export default {}", first);
        }
    }
    let mut keys = bindings.to_vec();
    keys.sort();
    keys.dedup();
    if keys.is_empty() {
        "export default {}".to_string()
    } else {
        format!("export default {{ {} }}", keys.join(", "))
    }
}

/// Imports and closing statement of an aggregated default export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultBlock {
    pub imports: Vec<String>,
    pub statement: String,
}

/// Full content of an index file
pub fn render_index(exports: &[String], default_block: Option<&DefaultBlock>) -> String {
    let mut exports = exports.to_vec();
    exports.sort();

    let mut lines: Vec<String> = vec![BANNER.to_string(), String::new()];
    match default_block {
        Some(block) => {
            let mut imports = block.imports.clone();
            imports.sort();
            lines.extend(imports);
            lines.push(String::new());
            lines.extend(exports);
            lines.push(String::new());
            lines.push(block.statement.clone());
        }
        None => lines.extend(exports),
    }

    let mut content = lines.join("\n");
    content.push('\n');
    content
}
