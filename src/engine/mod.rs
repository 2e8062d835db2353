//! The index-generation engine.
//!
//! Leaves first:
//!
//! - [`resolve`] - relative import specifiers between an index and its files
//! - [`naming`] - identifiers and slugs derived from file names
//! - [`matcher`] - ignore rules, generated-file detection and overrides
//! - [`synth`] - export statements and whole index bodies
//! - [`aggregate`] - one configuration turned into planned index files
//! - [`manual`] - explicit `{index, files}` mappings and the scan that builds them
//! - [`driver`] - runs an [`AppConfig`](crate::config::AppConfig) and reports outcomes
//!
//! The engine never touches the terminal. File access goes through the
//! [`Discovery`](crate::io::Discovery) and [`IndexSink`](crate::io::IndexSink)
//! traits and interactive choices through [`DecisionProvider`].

pub mod aggregate;
pub mod context;
pub mod driver;
pub mod manual;
pub mod matcher;
pub mod naming;
pub mod resolve;
pub mod synth;

pub use aggregate::{Aggregator, IndexWrite, Plan, PlannedIndex};
pub use context::RunContext;
pub use driver::{Driver, Level, Outcome, RunReport};
pub use manual::{DecisionProvider, ExportQuestion, HeadlessDecisions, ManualChoice, ManualScan};
pub use synth::BANNER;
