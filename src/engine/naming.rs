//! Export identifiers derived from file names.
//!
//! Word splitting follows the usual identifier conventions: separators,
//! lower→upper transitions (`getUser`), acronym ends (`XMLHttp`) and
//! letter/digit transitions (`v2api`) all start a new word.

use crate::config::Casing;
use crate::engine::resolve::{basename, join, normalize_path};
use std::collections::BTreeSet;

/// Words that cannot be used as a binding name
const RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// File name without its last extension (`a.spec.ts` → `a.spec`)
pub fn base_name(path: &str) -> String {
    let name = basename(path);
    match name.rfind('.') {
        Some(i) if i > 0 && name[i + 1..].chars().all(|c| c.is_ascii_alphanumeric()) => {
            name[..i].to_string()
        }
        _ => name,
    }
}

/// Identifier for `filename` under the given casing policy
pub fn derive_name(filename: &str, casing: Casing) -> String {
    let name = base_name(filename);

    let raw = match casing {
        Casing::Camel => camel_case(&name),
        Casing::Pascal => upper_first(&camel_case(&name)),
        Casing::Snake => split_words(&name)
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("_"),
        Casing::Upper => safe_identifier(&name.to_uppercase()),
        Casing::Lower => safe_identifier(&name.to_lowercase()),
        Casing::Keep => safe_identifier(&name).replace('_', ""),
    };

    finalize_identifier(raw)
}

/// Directory-qualified identifier, unique per directory for the same base name
pub fn derive_slug(dirname: &str, filename: &str) -> String {
    let qualified = join(&normalize_path(dirname), &base_name(filename));
    finalize_identifier(safe_identifier(&slugify(&qualified)))
}

/// `binding`, or the first free `binding_N` (N from 2) when it is already taken.
///
/// The returned name is recorded in `used`.
pub fn unique_binding(binding: &str, used: &mut BTreeSet<String>) -> String {
    let mut candidate = binding.to_string();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{}_{}", binding, n);
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Lower-case, with every run of non-alphanumeric characters collapsed to `-`
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Replace every character that cannot appear in an identifier with `_`
pub fn safe_identifier(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn finalize_identifier(mut ident: String) -> String {
    if ident.is_empty() {
        return "_".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) || RESERVED.contains(&ident.as_str()) {
        ident.insert(0, '_');
    }
    ident
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Lower,
    Upper,
    Digit,
    Other,
}

fn classify(ch: char) -> CharClass {
    if ch.is_lowercase() {
        CharClass::Lower
    } else if ch.is_uppercase() {
        CharClass::Upper
    } else if ch.is_numeric() {
        CharClass::Digit
    } else if ch.is_alphanumeric() {
        CharClass::Lower
    } else {
        CharClass::Other
    }
}

/// Split a name into words
pub fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        let class = classify(ch);
        if class == CharClass::Other {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(prev) = current.chars().last().map(classify) {
            let next = chars.get(i + 1).copied().map(classify);
            let boundary = match (prev, class) {
                (CharClass::Lower, CharClass::Upper) => true,
                // "XMLHttp": the last capital starts the next word
                (CharClass::Upper, CharClass::Upper) => next == Some(CharClass::Lower),
                (CharClass::Digit, CharClass::Lower | CharClass::Upper) => true,
                (CharClass::Lower | CharClass::Upper, CharClass::Digit) => true,
                _ => false,
            };
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn camel_case(name: &str) -> String {
    split_words(name)
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i == 0 { lower } else { upper_first(&lower) }
        })
        .collect()
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
