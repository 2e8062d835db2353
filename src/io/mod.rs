//! File-system collaborators of the engine.
//!
//! - [`discovery`] - globbing, existence checks and first-line reads
//! - [`sink`] - atomic replacement of generated index files
//!
//! The engine only sees the [`Discovery`] and [`IndexSink`] traits, so tests
//! and embedders can substitute their own implementations.

pub mod discovery;
pub mod sink;

pub use discovery::{Discovery, EntryKind, FsDiscovery, GlobQuery};
pub use sink::{FsSink, IndexSink};
