//! Configuration model for index generation.
//!
//! An [`AppConfig`] carries run-wide switches plus an [`IndexerSpec`], which is
//! either an automatic glob-driven [`IndexerConfig`] or a legacy explicit
//! mapping of index files to [`FilesDefinition`]s.
//!
//! Configurations deserialize from the same JSON shape the config files use:
//!
//! ```json
//! {
//!   "source": ["src/**/*.ts"],
//!   "output": "src/index.ts",
//!   "type": "group",
//!   "casing": "pascal",
//!   "overrides": { "src/legacy/**": "skip", "src/**/*.vue": "default" }
//! }
//! ```

pub mod load;

use crate::engine::resolve::normalize_path;
use crate::error::{IndexerError, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

pub use load::{find_config, load_config, save_config, LoadedConfig, DEFAULT_CONFIG_NAME};

/// Re-export statement shape chosen for one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// `export {default as NAME} from '...'`
    Default,
    /// `export * as NAME from '...'`
    Group,
    /// `export * as SLUG from '...'`
    Slug,
    /// `export * from '...'`
    #[default]
    Wildcard,
    /// Same output as [`ExportKind::Wildcard`]
    Individual,
    /// Excluded from the index
    Skip,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Default => "default",
            ExportKind::Group => "group",
            ExportKind::Slug => "slug",
            ExportKind::Wildcard => "wildcard",
            ExportKind::Individual => "individual",
            ExportKind::Skip => "skip",
        }
    }
}

impl FromStr for ExportKind {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(ExportKind::Default),
            "group" => Ok(ExportKind::Group),
            "slug" => Ok(ExportKind::Slug),
            "wildcard" => Ok(ExportKind::Wildcard),
            "individual" => Ok(ExportKind::Individual),
            "skip" => Ok(ExportKind::Skip),
            other => Err(IndexerError::config(format!("Unknown export type '{}'", other))),
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Import shape used by the aggregated default export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DefaultKind {
    Default,
    #[default]
    Group,
    Slug,
}

impl FromStr for DefaultKind {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(DefaultKind::Default),
            "group" => Ok(DefaultKind::Group),
            "slug" => Ok(DefaultKind::Slug),
            other => Err(IndexerError::config(format!(
                "Unknown default export type '{}' (expected default, group or slug)",
                other
            ))),
        }
    }
}

/// Identifier casing applied to derived export names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Casing {
    Camel,
    Pascal,
    Snake,
    Upper,
    Lower,
    #[default]
    Keep,
}

impl FromStr for Casing {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "camel" => Ok(Casing::Camel),
            "pascal" => Ok(Casing::Pascal),
            "snake" => Ok(Casing::Snake),
            "upper" => Ok(Casing::Upper),
            "lower" => Ok(Casing::Lower),
            "keep" => Ok(Casing::Keep),
            _ => Err(IndexerError::config(format!("Unknown casing '{}'", s))),
        }
    }
}

/// One glob pattern or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sources {
    One(String),
    Many(Vec<String>),
}

impl Sources {
    pub fn patterns(&self) -> Vec<String> {
        match self {
            Sources::One(p) => vec![p.clone()],
            Sources::Many(ps) => ps.clone(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Sources::One(p) => p.trim().is_empty(),
            Sources::Many(ps) => ps.iter().all(|p| p.trim().is_empty()),
        }
    }
}

impl From<&str> for Sources {
    fn from(pattern: &str) -> Self {
        Sources::One(pattern.to_string())
    }
}

/// A JSON object whose key order is significant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        OrderedMap(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace, keeping the original position of an existing key
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, K: Into<String>> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        OrderedMap(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// Aggregated default export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DefaultExportConfig {
    /// A single literal path, or a list of globs
    pub source: Option<Sources>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DefaultKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub casing: Option<Casing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<OrderedMap<DefaultKind>>,
}

/// Sibling configurations sharing the root fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexEntries {
    List(Vec<IndexerConfig>),
    Named(OrderedMap<IndexerConfig>),
}

impl IndexEntries {
    /// Entries paired with a display label
    pub fn entries(&self) -> Vec<(String, &IndexerConfig)> {
        match self {
            IndexEntries::List(list) => list
                .iter()
                .enumerate()
                .map(|(i, c)| (i.to_string(), c))
                .collect(),
            IndexEntries::Named(map) => map.iter().map(|(k, c)| (k.to_string(), c)).collect(),
        }
    }
}

/// One automatic generation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IndexerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Sources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ExportKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub casing: Option<Casing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<OrderedMap<ExportKind>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    #[serde(rename = "default", default, skip_serializing_if = "Option::is_none")]
    pub default_export: Option<DefaultExportConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexes: Option<IndexEntries>,
}

impl IndexerConfig {
    pub fn new(source: impl Into<Sources>, output: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            output: Some(output.into()),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: ExportKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_casing(mut self, casing: Casing) -> Self {
        self.casing = Some(casing);
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = Some(recursive);
        self
    }

    pub fn with_ignore(mut self, patterns: &[&str]) -> Self {
        self.ignore = Some(patterns.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn with_override(mut self, pattern: &str, kind: ExportKind) -> Self {
        self.overrides
            .get_or_insert_with(OrderedMap::new)
            .insert(pattern, kind);
        self
    }

    /// Layer `self` over `root`; fields set on `self` win
    pub fn merged_over(&self, root: &IndexerConfig) -> IndexerConfig {
        IndexerConfig {
            source: self.source.clone().or_else(|| root.source.clone()),
            output: self.output.clone().or_else(|| root.output.clone()),
            kind: self.kind.or(root.kind),
            casing: self.casing.or(root.casing),
            ignore: self.ignore.clone().or_else(|| root.ignore.clone()),
            overrides: self.overrides.clone().or_else(|| root.overrides.clone()),
            recursive: self.recursive.or(root.recursive),
            default_export: self
                .default_export
                .clone()
                .or_else(|| root.default_export.clone()),
            indexes: None,
        }
    }

    /// Validate and fill defaults
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let sources = match &self.source {
            Some(s) if !s.is_empty() => s.patterns(),
            _ => return Err(IndexerError::config("Source glob pattern is required")),
        };
        let output = match self.output.as_deref().map(str::trim) {
            Some(o) if !o.is_empty() => normalize_path(o),
            _ => return Err(IndexerError::config("Output file is required")),
        };

        let default_export = match &self.default_export {
            Some(d) => match &d.source {
                Some(source) if !source.is_empty() => Some(ResolvedDefault {
                    source: source.clone(),
                    kind: d.kind.unwrap_or_default(),
                    casing: d.casing.or(self.casing).unwrap_or_default(),
                    ignore: d.ignore.clone().unwrap_or_default(),
                    overrides: d.overrides.clone().unwrap_or_default().0,
                }),
                _ => None,
            },
            None => None,
        };

        Ok(ResolvedConfig {
            sources: sources.iter().map(|p| normalize_path(p)).collect(),
            output,
            kind: self.kind.unwrap_or_default(),
            casing: self.casing.unwrap_or_default(),
            ignore: self.ignore.clone().unwrap_or_default(),
            overrides: self.overrides.clone().unwrap_or_default().0,
            recursive: self.recursive.unwrap_or(false),
            default_export,
        })
    }

    /// Every output declared by this config or its sibling entries
    pub fn declared_outputs(&self) -> Vec<String> {
        let mut outputs: Vec<String> = self.output.iter().map(|o| normalize_path(o)).collect();
        if let Some(indexes) = &self.indexes {
            for (_, entry) in indexes.entries() {
                if let Some(o) = &entry.output {
                    outputs.push(normalize_path(o));
                }
            }
        }
        outputs.sort();
        outputs.dedup();
        outputs
    }
}

/// Validated configuration for one aggregation pass
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub sources: Vec<String>,
    pub output: String,
    pub kind: ExportKind,
    pub casing: Casing,
    pub ignore: Vec<String>,
    pub overrides: Vec<(String, ExportKind)>,
    pub recursive: bool,
    pub default_export: Option<ResolvedDefault>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDefault {
    pub source: Sources,
    pub kind: DefaultKind,
    pub casing: Casing,
    pub ignore: Vec<String>,
    pub overrides: Vec<(String, DefaultKind)>,
}

/// Legacy explicit mapping: one index file and what it includes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub index: String,
    #[serde(default)]
    pub files: Vec<FilesDefinition>,
}

impl IndexDefinition {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            files: Vec::new(),
        }
    }
}

/// A single file or a whole directory paired with one export decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesDefinition {
    pub export: ExportKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl FilesDefinition {
    pub fn file(path: impl Into<String>, export: ExportKind) -> Self {
        Self {
            export,
            file: Some(path.into()),
            dir: None,
        }
    }

    pub fn dir(path: impl Into<String>, export: ExportKind) -> Self {
        Self {
            export,
            file: None,
            dir: Some(path.into()),
        }
    }

    /// Whether this definition covers `path`
    pub fn covers(&self, path: &str) -> bool {
        if self.file.as_deref() == Some(path) {
            return true;
        }
        match self.dir.as_deref() {
            Some(dir) => dir == "." || path == dir || path.starts_with(&format!("{}/", dir)),
            None => false,
        }
    }
}

/// What the engine should generate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IndexerSpec {
    Auto(IndexerConfig),
    Manual(Vec<IndexDefinition>),
    /// Source directory mapped to its index definitions
    ManualNamed(OrderedMap<Vec<IndexDefinition>>),
}

impl IndexerSpec {
    /// Classify a JSON value as one of the accepted shapes
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        use serde_json::Value;

        match value {
            Value::Array(_) => Ok(IndexerSpec::Manual(serde_json::from_value(value)?)),
            Value::Object(ref map) if !map.is_empty() && map.values().all(is_definition_list) => {
                Ok(IndexerSpec::ManualNamed(serde_json::from_value(value)?))
            }
            Value::Object(_) => Ok(IndexerSpec::Auto(serde_json::from_value(value)?)),
            other => Err(IndexerError::config(format!(
                "Invalid indexer configuration: expected an object or array, got {}",
                other
            ))),
        }
    }
}

fn is_definition_list(value: &serde_json::Value) -> bool {
    value.as_array().is_some_and(|items| {
        items
            .iter()
            .all(|item| item.as_object().is_some_and(|o| o.contains_key("index")))
    })
}

impl<'de> Deserialize<'de> for IndexerSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        IndexerSpec::from_value(value).map_err(de::Error::custom)
    }
}

/// Run-wide settings handed to the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Source directory for a manual scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    /// Never generate nested indexes
    #[serde(default)]
    pub root_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer: Option<IndexerSpec>,
}

impl AppConfig {
    pub fn auto(config: IndexerConfig) -> Self {
        Self {
            indexer: Some(IndexerSpec::Auto(config)),
            ..Self::default()
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
