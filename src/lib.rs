//! # indexgen - barrel index generator
//!
//! indexgen scans a JavaScript/TypeScript source tree and writes "barrel"
//! index files that re-export the modules underneath them, so consumers can
//! import a directory's public surface from one place.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`config`] - Configuration model and config-file discovery
//! - [`engine`] - Path resolution, naming, matching, synthesis and the driver
//! - [`io`] - File-system discovery and atomic index writes
//! - [`output`] - Coloured outcome reporting
//! - [`prompt`] - Terminal answers for interactive decisions
//! - [`progress`] - Optional spinner
//!
//! ## Quick Start
//!
//! ```ignore
//! use indexgen::config::{AppConfig, ExportKind, IndexerConfig};
//! use indexgen::engine::{Driver, HeadlessDecisions};
//! use indexgen::io::{FsDiscovery, FsSink};
//! use std::path::Path;
//!
//! let root = Path::new("/path/to/package");
//! let app = AppConfig::auto(
//!     IndexerConfig::new("src/**/*.ts", "src/index.ts").with_kind(ExportKind::Group),
//! );
//!
//! let discovery = FsDiscovery::new(root);
//! let sink = FsSink::new(root);
//! let mut decisions = HeadlessDecisions::default();
//! let report = Driver::new(&discovery, &sink, &mut decisions).run(&app).unwrap();
//!
//! for outcome in &report.outcomes {
//!     println!("{}", outcome);
//! }
//! ```
//!
//! ## Idempotence
//!
//! Every generated file starts with [`engine::BANNER`]. Files whose first line
//! is the banner are never re-exported, so running twice yields identical
//! output.

pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod output;
pub mod progress;
pub mod prompt;

pub use error::{IndexerError, Result};
