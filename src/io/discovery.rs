use crate::engine::matcher::compile_set;
use crate::engine::resolve::{join, normalize_path};
use crate::error::{IndexerError, Result};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which entries a glob query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Files,
    Dirs,
    Any,
}

/// Inclusion / exclusion globs, relative to the discovery root
#[derive(Debug, Clone)]
pub struct GlobQuery<'a> {
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub kind: EntryKind,
}

impl<'a> GlobQuery<'a> {
    pub fn files(include: &'a [String], exclude: &'a [String]) -> Self {
        Self {
            include,
            exclude,
            kind: EntryKind::Files,
        }
    }

    pub fn dirs(include: &'a [String], exclude: &'a [String]) -> Self {
        Self {
            include,
            exclude,
            kind: EntryKind::Dirs,
        }
    }

    pub fn any(include: &'a [String], exclude: &'a [String]) -> Self {
        Self {
            include,
            exclude,
            kind: EntryKind::Any,
        }
    }
}

/// File-system queries the engine depends on.
///
/// Paths going in and coming out are '/'-separated and relative to one root.
pub trait Discovery {
    /// Sorted, de-duplicated paths matching the query
    fn glob(&self, query: &GlobQuery<'_>) -> Result<Vec<String>>;

    fn exists(&self, path: &str) -> bool;

    fn is_dir(&self, path: &str) -> bool;

    /// First line of a file without its terminator, `None` when empty
    fn first_line(&self, path: &str) -> Result<Option<String>>;
}

/// [`Discovery`] over a directory on disk
#[derive(Debug, Clone)]
pub struct FsDiscovery {
    root: PathBuf,
}

impl FsDiscovery {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> PathBuf {
        let normalized = normalize_path(path);
        if normalized == "." {
            self.root.clone()
        } else {
            self.root.join(normalized)
        }
    }

    fn discovery_error(&self, message: impl Into<String>) -> IndexerError {
        IndexerError::Discovery {
            root: self.root.clone(),
            message: message.into(),
        }
    }
}

/// Directory prefix of a pattern before its first glob segment
fn literal_base(pattern: &str) -> String {
    let pattern = normalize_path(pattern);
    let mut base: Vec<String> = Vec::new();
    for segment in pattern.split('/') {
        match literal_segment(segment) {
            Some(literal) => base.push(literal),
            None if base.is_empty() => return ".".to_string(),
            None => return base.join("/"),
        }
    }
    // no glob characters: the pattern names one entry
    base.join("/")
}

/// `segment` with single-character classes (`[[]`, `[*]`) unwrapped, or
/// `None` when it holds a real wildcard
fn literal_segment(segment: &str) -> Option<String> {
    let chars: Vec<char> = segment.chars().collect();
    let mut literal = String::with_capacity(segment.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '[' if chars.get(i + 2) == Some(&']') && chars.get(i + 1) != Some(&'!') => {
                literal.push(chars[i + 1]);
                i += 3;
            }
            '*' | '?' | '[' | '{' => return None,
            ch => {
                literal.push(ch);
                i += 1;
            }
        }
    }
    Some(literal)
}

impl Discovery for FsDiscovery {
    fn glob(&self, query: &GlobQuery<'_>) -> Result<Vec<String>> {
        let include = compile_set(query.include)?;
        let exclude = compile_set(query.exclude)?;

        let mut bases: Vec<String> = query.include.iter().map(|p| literal_base(p)).collect();
        bases.sort();
        bases.dedup();

        let mut found = BTreeSet::new();

        for base in bases {
            let start = self.full_path(&base);
            if !start.exists() {
                debug!(base = %base, "glob base does not exist");
                continue;
            }

            let walker = WalkBuilder::new(&start)
                .standard_filters(false)
                .hidden(true)
                .follow_links(false)
                .build();

            for entry in walker {
                let entry = entry.map_err(|e| self.discovery_error(e.to_string()))?;
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                let wanted = match query.kind {
                    EntryKind::Files => !is_dir,
                    EntryKind::Dirs => is_dir,
                    EntryKind::Any => true,
                };
                if !wanted {
                    continue;
                }

                let Ok(under_base) = entry.path().strip_prefix(&start) else {
                    continue;
                };
                let under_base = under_base.to_string_lossy().replace('\\', "/");
                let rel = if under_base.is_empty() {
                    normalize_path(&base)
                } else {
                    join(&base, &under_base)
                };

                if include.is_match(&rel) && !exclude.is_match(&rel) {
                    found.insert(rel);
                }
            }
        }

        debug!(
            patterns = ?query.include,
            kind = ?query.kind,
            count = found.len(),
            "glob complete"
        );
        Ok(found.into_iter().collect())
    }

    fn exists(&self, path: &str) -> bool {
        self.full_path(path).exists()
    }

    fn is_dir(&self, path: &str) -> bool {
        self.full_path(path).is_dir()
    }

    fn first_line(&self, path: &str) -> Result<Option<String>> {
        let file = File::open(self.full_path(path))
            .map_err(|e| self.discovery_error(format!("cannot open {}: {}", path, e)))?;
        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        reader
            .read_until(b'\n', &mut line)
            .map_err(|e| self.discovery_error(format!("cannot read {}: {}", path, e)))?;

        if line.is_empty() {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&line);
        Ok(Some(text.trim_end_matches(['\n', '\r']).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        for path in [
            "src/a.ts",
            "src/b.js",
            "src/sub/c.ts",
            "src/sub/deep/d.ts",
            "src/.hidden/e.ts",
            "lib/x.ts",
        ] {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, "export {}\n").unwrap();
        }
        fs::create_dir_all(dir.path().join("src/empty")).unwrap();
        dir
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_literal_base() {
        assert_eq!(literal_base("src/**/*.ts"), "src");
        assert_eq!(literal_base("./src/sub/*.ts"), "src/sub");
        assert_eq!(literal_base("*.ts"), ".");
        assert_eq!(literal_base("src/a.ts"), "src/a.ts");
        assert_eq!(literal_base("src/{a,b}/x.ts"), "src");
        assert_eq!(literal_base("src/pages/[[]id[]]/*"), "src/pages/[id]");
        assert_eq!(literal_base("src/[ab]/*.ts"), "src");
    }

    #[test]
    fn test_glob_escaped_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pages/[id]")).unwrap();
        fs::write(dir.path().join("pages/[id]/view.ts"), "export {}\n").unwrap();
        let discovery = FsDiscovery::new(dir.path());

        let include = vec![format!("{}/*", globset::escape("pages/[id]"))];
        let found = discovery.glob(&GlobQuery::files(&include, &[])).unwrap();
        assert_eq!(found, vec!["pages/[id]/view.ts"]);
    }

    #[test]
    fn test_glob_files_sorted() {
        let dir = fixture();
        let discovery = FsDiscovery::new(dir.path());

        let include = strings(&["src/**/*.ts"]);
        let found = discovery.glob(&GlobQuery::files(&include, &[])).unwrap();
        assert_eq!(found, vec!["src/a.ts", "src/sub/c.ts", "src/sub/deep/d.ts"]);

        let include = strings(&["src/*.ts", "src/*.js"]);
        let found = discovery.glob(&GlobQuery::files(&include, &[])).unwrap();
        assert_eq!(found, vec!["src/a.ts", "src/b.js"]);
    }

    #[test]
    fn test_glob_exclude_and_dirs() {
        let dir = fixture();
        let discovery = FsDiscovery::new(dir.path());

        let include = strings(&["src/**/*.ts"]);
        let exclude = strings(&["src/sub/**"]);
        let found = discovery.glob(&GlobQuery::files(&include, &exclude)).unwrap();
        assert_eq!(found, vec!["src/a.ts"]);

        let include = strings(&["src/*"]);
        let found = discovery.glob(&GlobQuery::dirs(&include, &[])).unwrap();
        assert_eq!(found, vec!["src/empty", "src/sub"]);
    }

    #[test]
    fn test_glob_literal_and_missing() {
        let dir = fixture();
        let discovery = FsDiscovery::new(dir.path());

        let include = strings(&["lib/x.ts"]);
        assert_eq!(
            discovery.glob(&GlobQuery::files(&include, &[])).unwrap(),
            vec!["lib/x.ts"]
        );

        let include = strings(&["nowhere/**/*.ts"]);
        assert!(discovery.glob(&GlobQuery::any(&include, &[])).unwrap().is_empty());
    }

    #[test]
    fn test_first_line() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("crlf.ts"), "// banner\r\nexport {}\r\n").unwrap();
        fs::write(dir.path().join("empty.ts"), "").unwrap();
        let discovery = FsDiscovery::new(dir.path());

        assert_eq!(discovery.first_line("crlf.ts").unwrap().as_deref(), Some("// banner"));
        assert_eq!(discovery.first_line("empty.ts").unwrap(), None);
        assert!(discovery.first_line("missing.ts").is_err());
        assert!(discovery.exists("crlf.ts"));
        assert!(!discovery.is_dir("crlf.ts"));
    }
}
