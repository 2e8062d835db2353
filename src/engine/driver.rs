//! Runs every configuration of an [`AppConfig`] and collects what happened.

use crate::config::{AppConfig, IndexDefinition, IndexerConfig, IndexerSpec, OrderedMap};
use crate::engine::aggregate::{Aggregator, IndexWrite, Plan, PlannedIndex};
use crate::engine::context::RunContext;
use crate::engine::manual::{DecisionProvider, ManualScan};
use crate::engine::resolve::{dirname, normalize_path};
use crate::error::{IndexerError, Result};
use crate::io::{Discovery, IndexSink};
use std::fmt;
use tracing::{debug, info, warn};

/// Severity of an [`Outcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Success,
    Warn,
    Error,
}

/// What happened to one index, or to one configuration as a whole
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Written { path: String, count: usize },
    /// Nothing to export; the file was not touched
    Empty { path: String },
    NoMatches { patterns: Vec<String> },
    /// A hand-written index sits where a nested index would go
    Preserved { path: String },
    Failed { scope: String, message: String },
}

impl Outcome {
    pub fn level(&self) -> Level {
        match self {
            Outcome::Written { .. } => Level::Success,
            Outcome::Empty { .. } | Outcome::NoMatches { .. } | Outcome::Preserved { .. } => {
                Level::Warn
            }
            Outcome::Failed { .. } => Level::Error,
        }
    }

    fn failed(scope: impl Into<String>, err: &IndexerError) -> Self {
        Outcome::Failed {
            scope: scope.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Written { path, count } => write!(f, "{} exports written to {}", count, path),
            Outcome::Empty { path } => write!(f, "No exports to write for index: {}", path),
            Outcome::NoMatches { patterns } => {
                write!(f, "No files found matching source: {}", patterns.join(", "))
            }
            Outcome::Preserved { path } => write!(f, "Left hand-written index untouched: {}", path),
            Outcome::Failed { scope, message } => write!(f, "{}: {}", scope, message),
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<Outcome>,
    /// Rendered indexes in the order they were produced, also when dry-running
    pub writes: Vec<IndexWrite>,
    /// Configuration worth persisting, when the run changed or completed it
    pub result: Option<IndexerSpec>,
    pub dry_run: bool,
}

impl RunReport {
    pub fn has_errors(&self) -> bool {
        self.outcomes.iter().any(|o| o.level() == Level::Error)
    }

    pub fn count(&self, level: Level) -> usize {
        self.outcomes.iter().filter(|o| o.level() == level).count()
    }
}

/// Drives generation over injected discovery, sink and decision provider
pub struct Driver<'a> {
    discovery: &'a dyn Discovery,
    sink: &'a dyn IndexSink,
    decisions: &'a mut dyn DecisionProvider,
}

impl<'a> Driver<'a> {
    pub fn new(
        discovery: &'a dyn Discovery,
        sink: &'a dyn IndexSink,
        decisions: &'a mut dyn DecisionProvider,
    ) -> Self {
        Self {
            discovery,
            sink,
            decisions,
        }
    }

    /// Generate every index `app` describes.
    ///
    /// Failures scoped to one configuration or one index become
    /// [`Outcome::Failed`] entries and the rest of the run continues. An error
    /// is returned only when there is nothing to run at all or the decision
    /// provider gives up.
    pub fn run(&mut self, app: &AppConfig) -> Result<RunReport> {
        let mut report = RunReport {
            dry_run: app.dry_run,
            ..RunReport::default()
        };

        match (&app.indexer, &app.source) {
            (Some(IndexerSpec::Auto(config)), _) => {
                let ctx = RunContext::for_app(app);
                self.run_auto(app, config, &ctx, &mut report);
            }
            (Some(IndexerSpec::Manual(map)), source) => {
                let source = source.as_deref().unwrap_or(".");
                if let Some(updated) = self.run_manual(app, source, map.clone(), &mut report)? {
                    report.result = Some(IndexerSpec::Manual(updated));
                }
            }
            (Some(IndexerSpec::ManualNamed(named)), _) => {
                let mut updated: OrderedMap<Vec<IndexDefinition>> = OrderedMap::new();
                let mut changed = false;
                for (source, map) in named.iter() {
                    match self.run_manual(app, source, map.clone(), &mut report)? {
                        Some(new_map) => {
                            changed = true;
                            updated.insert(source, new_map);
                        }
                        None => updated.insert(source, map.clone()),
                    }
                }
                if changed {
                    report.result = Some(IndexerSpec::ManualNamed(updated));
                }
            }
            (None, Some(source)) => {
                if let Some(map) = self.run_manual(app, source, Vec::new(), &mut report)? {
                    report.result = Some(IndexerSpec::Manual(map));
                }
            }
            (None, None) => {
                let Some(config) = self.decisions.complete_config()? else {
                    return Err(IndexerError::config("No configuration found"));
                };
                info!("using completed configuration");
                let completed = AppConfig {
                    indexer: Some(IndexerSpec::Auto(config.clone())),
                    ..app.clone()
                };
                let ctx = RunContext::for_app(&completed);
                self.run_auto(&completed, &config, &ctx, &mut report);
                report.result = Some(IndexerSpec::Auto(config));
            }
        }

        info!(
            written = report.count(Level::Success),
            warnings = report.count(Level::Warn),
            errors = report.count(Level::Error),
            dry_run = report.dry_run,
            "run complete"
        );
        Ok(report)
    }

    fn run_auto(
        &mut self,
        app: &AppConfig,
        config: &IndexerConfig,
        ctx: &RunContext,
        report: &mut RunReport,
    ) {
        match &config.indexes {
            Some(indexes) => {
                let root = IndexerConfig {
                    indexes: None,
                    ..config.clone()
                };
                for (name, entry) in indexes.entries() {
                    let merged = entry.merged_over(&root);
                    let scope = merged
                        .output
                        .clone()
                        .unwrap_or_else(|| format!("indexes.{}", name));
                    self.run_config(app, &scope, &merged, ctx, report);
                }
            }
            None => {
                let scope = config.output.clone().unwrap_or_else(|| "indexer".to_string());
                self.run_config(app, &scope, config, ctx, report);
            }
        }
    }

    fn run_config(
        &mut self,
        app: &AppConfig,
        scope: &str,
        config: &IndexerConfig,
        ctx: &RunContext,
        report: &mut RunReport,
    ) {
        let plan = config.resolve().and_then(|mut resolved| {
            if app.root_only {
                resolved.recursive = false;
            }
            debug!(output = %resolved.output, recursive = resolved.recursive, "aggregating");
            Aggregator::new(self.discovery, ctx).aggregate(&resolved)
        });

        match plan {
            Ok(Plan { indexes, no_matches }) => {
                if let Some(patterns) = no_matches {
                    warn!(patterns = ?patterns, "no files matched");
                    report.outcomes.push(Outcome::NoMatches { patterns });
                }
                for planned in indexes {
                    self.apply(app, planned, report);
                }
            }
            Err(err) => {
                warn!(scope, error = %err, "configuration failed");
                report.outcomes.push(Outcome::failed(scope, &err));
            }
        }
    }

    /// Scan and build one manual mapping; returns the mapping when it changed
    fn run_manual(
        &mut self,
        app: &AppConfig,
        source: &str,
        map: Vec<IndexDefinition>,
        report: &mut RunReport,
    ) -> Result<Option<Vec<IndexDefinition>>> {
        let mut scan = ManualScan::new(self.discovery, source, map);
        let changed = match scan.scan(&mut *self.decisions) {
            Ok(changed) => changed,
            Err(err @ IndexerError::Prompt(_)) => return Err(err),
            Err(err) => {
                warn!(source, error = %err, "manual scan failed");
                report.outcomes.push(Outcome::failed(source, &err));
                return Ok(None);
            }
        };

        match scan.plan() {
            Ok(planned) => {
                let source_dir = normalize_path(source);
                for index in planned {
                    if app.root_only && dirname(planned_path(&index)) != source_dir {
                        continue;
                    }
                    self.apply(app, index, report);
                }
            }
            Err(err) => {
                warn!(source, error = %err, "manual mapping failed");
                report.outcomes.push(Outcome::failed(source, &err));
            }
        }

        Ok(changed.then(|| scan.into_map()))
    }

    fn apply(&mut self, app: &AppConfig, planned: PlannedIndex, report: &mut RunReport) {
        match planned {
            PlannedIndex::Write(write) => {
                if !app.dry_run {
                    if let Err(err) = self.sink.write(&write.path, &write.content) {
                        warn!(path = %write.path, error = %err, "write failed");
                        report.outcomes.push(Outcome::failed(write.path.as_str(), &err));
                        return;
                    }
                }
                info!(path = %write.path, exports = write.count, "index generated");
                report.outcomes.push(Outcome::Written {
                    path: write.path.clone(),
                    count: write.count,
                });
                report.writes.push(write);
            }
            PlannedIndex::Empty { path } => report.outcomes.push(Outcome::Empty { path }),
            PlannedIndex::Preserved { path } => report.outcomes.push(Outcome::Preserved { path }),
        }
    }
}

fn planned_path(planned: &PlannedIndex) -> &str {
    match planned {
        PlannedIndex::Write(write) => &write.path,
        PlannedIndex::Empty { path } | PlannedIndex::Preserved { path } => path,
    }
}
