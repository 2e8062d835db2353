//! Relative import specifiers between an index file and the files it re-exports.
//!
//! All paths handled here are '/'-separated and relative to the same root (the
//! directory discovery runs in). They are compared lexically after
//! normalization, so no file-system access is needed.

use regex::Regex;
use std::sync::LazyLock;

/// Source extensions dropped from import specifiers
static SOURCE_EXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[jt]sx?$").expect("valid source extension pattern"));

/// Whether the path carries a JavaScript or TypeScript extension
pub fn is_source_file(path: &str) -> bool {
    SOURCE_EXT.is_match(path)
}

/// Normalize a path lexically: unify separators, drop `.` segments and fold `..`
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Parent directory of a normalized path (`.` for top-level entries)
pub fn dirname(path: &str) -> String {
    let path = normalize_path(path);
    match path.rsplit_once('/') {
        Some(("", _)) => "/".to_string(),
        Some((parent, _)) => parent.to_string(),
        None if path == "." => "..".to_string(),
        None => ".".to_string(),
    }
}

/// Last path segment
pub fn basename(path: &str) -> String {
    let path = normalize_path(path);
    match path.rsplit_once('/') {
        Some((_, name)) => name.to_string(),
        None => path,
    }
}

/// Join a directory and a child name, treating `.` as the root
pub fn join(dir: &str, name: &str) -> String {
    let dir = normalize_path(dir);
    if dir == "." {
        normalize_path(name)
    } else {
        normalize_path(&format!("{}/{}", dir, name))
    }
}

/// Extension of the last segment including the dot, or an empty string
pub fn extension(path: &str) -> String {
    let name = basename(path);
    match name.rfind('.') {
        Some(0) | None => String::new(),
        Some(i) => name[i..].to_string(),
    }
}

fn segments(path: &str) -> Vec<String> {
    let path = normalize_path(path);
    if path == "." {
        Vec::new()
    } else {
        path.split('/').map(str::to_string).collect()
    }
}

/// Relative path from `from_dir` to `to`, empty when they coincide
pub fn relative_path(from_dir: &str, to: &str) -> String {
    let from = segments(from_dir);
    let to = segments(to);

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::with_capacity(from.len() - common + to.len() - common);
    for _ in common..from.len() {
        parts.push("..");
    }
    for segment in &to[common..] {
        parts.push(segment);
    }
    parts.join("/")
}

/// Import specifier that reaches `target` from an index living in `index_dir`.
///
/// The result always starts with `.`: `./name`, `../name`, or `./index` when
/// the target resolves to the index directory itself.
pub fn resolve_specifier(index_dir: &str, target: &str) -> String {
    let mut spec = relative_path(index_dir, target);

    if spec.is_empty() {
        spec = ".".to_string();
    } else if !is_explicitly_relative(&spec) {
        spec = format!("./{}", spec);
    }

    let mut spec = SOURCE_EXT.replace(&spec, "").into_owned();

    if let Some(stripped) = spec.strip_suffix("/index") {
        spec = stripped.to_string();
    }

    if spec.is_empty() || spec == "." {
        return "./index".to_string();
    }
    spec
}

fn is_explicitly_relative(spec: &str) -> bool {
    spec == "." || spec == ".." || spec.starts_with("./") || spec.starts_with("../")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file("src/a.ts"));
        assert!(is_source_file("src/view.jsx"));
        assert!(!is_source_file("src/readme.md"));
        assert!(!is_source_file("src/types.d"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./src/a.ts"), "src/a.ts");
        assert_eq!(normalize_path("src//lib/./a.ts"), "src/lib/a.ts");
        assert_eq!(normalize_path("src/lib/../a.ts"), "src/a.ts");
        assert_eq!(normalize_path("../shared/a.ts"), "../shared/a.ts");
        assert_eq!(normalize_path("src\\win\\a.ts"), "src/win/a.ts");
        assert_eq!(normalize_path("./"), ".");
        assert_eq!(normalize_path(""), ".");
        assert_eq!(normalize_path("/abs/../x"), "/x");
    }

    #[test]
    fn test_dirname_and_basename() {
        assert_eq!(dirname("src/index.ts"), "src");
        assert_eq!(dirname("src/a/b.ts"), "src/a");
        assert_eq!(dirname("index.ts"), ".");
        assert_eq!(basename("src/a/b.ts"), "b.ts");
        assert_eq!(basename("b.ts"), "b.ts");
    }

    #[test]
    fn test_join_and_extension() {
        assert_eq!(join(".", "index.ts"), "index.ts");
        assert_eq!(join("src/sub", "index.ts"), "src/sub/index.ts");
        assert_eq!(extension("src/index.ts"), ".ts");
        assert_eq!(extension("src/.eslintrc"), "");
        assert_eq!(extension("src/Makefile"), "");
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path("src", "src/a.ts"), "a.ts");
        assert_eq!(relative_path("src", "src/sub/c.ts"), "sub/c.ts");
        assert_eq!(relative_path("src/sub", "src/a.ts"), "../a.ts");
        assert_eq!(relative_path("src/a/b", "lib/x.ts"), "../../../lib/x.ts");
        assert_eq!(relative_path("src", "src"), "");
        assert_eq!(relative_path(".", "a.ts"), "a.ts");
    }

    #[test]
    fn test_specifier_sibling_files() {
        assert_eq!(resolve_specifier("src", "src/a.ts"), "./a");
        assert_eq!(resolve_specifier("src", "src/b.js"), "./b");
        assert_eq!(resolve_specifier("src", "src/Button.tsx"), "./Button");
        assert_eq!(resolve_specifier("src", "src/style.css"), "./style.css");
    }

    #[test]
    fn test_specifier_nested_and_upward() {
        assert_eq!(resolve_specifier("src", "src/sub/c.ts"), "./sub/c");
        assert_eq!(resolve_specifier("src/sub", "src/a.ts"), "../a");
        assert_eq!(resolve_specifier("src/a/b", "src/x.ts"), "../../x");
        assert_eq!(resolve_specifier("src", "lib/x.ts"), "../lib/x");
    }

    #[test]
    fn test_specifier_index_collapse() {
        // a directory's own index is referenced by the directory alone
        assert_eq!(resolve_specifier("src", "src/sub/index.ts"), "./sub");
        assert_eq!(resolve_specifier("src", "src/sub"), "./sub");
        assert_eq!(resolve_specifier("src/sub", "src/index.ts"), "..");
        // target is the index directory itself
        assert_eq!(resolve_specifier("src", "src/index.ts"), "./index");
        assert_eq!(resolve_specifier("src", "src"), "./index");
        assert_eq!(resolve_specifier(".", "."), "./index");
    }

    #[test]
    fn test_specifier_index_like_names_survive() {
        assert_eq!(resolve_specifier("src", "src/reindex.ts"), "./reindex");
        assert_eq!(resolve_specifier("src", "src/index.test.ts"), "./index.test");
        assert_eq!(resolve_specifier("src", "src/indexes/a.ts"), "./indexes/a");
    }

    #[test]
    fn test_specifier_dotfiles_read_as_relative() {
        assert_eq!(resolve_specifier("src", "src/.config.ts"), "./.config");
        assert_eq!(resolve_specifier("src", "src/..weird.ts"), "./..weird");
    }

    #[test]
    fn test_specifier_root_level() {
        assert_eq!(resolve_specifier(".", "a.ts"), "./a");
        assert_eq!(resolve_specifier(".", "./lib/b.ts"), "./lib/b");
        assert_eq!(resolve_specifier("./src/", "src/a.ts"), "./a");
    }

    #[test]
    fn test_specifier_always_relative_and_never_output() {
        let output = "src/index.ts";
        let index_dir = dirname(output);
        let paths = [
            "src/a.ts",
            "src/sub/b.ts",
            "src/sub/index.ts",
            "src/.hidden.ts",
            "src/index.ts",
            "lib/c.js",
            "src/deep/er/d.tsx",
        ];
        for path in paths {
            let spec = resolve_specifier(&index_dir, path);
            assert!(spec.starts_with('.'), "{} -> {}", path, spec);
            assert_ne!(spec, output);
            assert_ne!(spec, ".");
        }
    }
}
