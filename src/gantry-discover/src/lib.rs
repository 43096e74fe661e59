#![allow(clippy::missing_errors_doc, clippy::uninlined_format_args)]
//! Gantry Discover - command model compiler for Go build-tool packages.
//!
//! Finds Go files that opt into a build tag, reads their declarations and
//! turns each package into a validated [`PackageModel`]: the commands an
//! argument parser and executor can expose, with names, descriptions and
//! invocation shapes.
//!
//! # Pipeline
//!
//! - [`walker`] walks the tree breadth-first and keeps files whose
//!   `//go:build` constraint matches the tag
//! - [`scanner`] parses each file and records command candidates into a
//!   per-directory [`PackageScan`]
//! - [`PackageScan::finish`] filters, deduplicates and sorts the candidates
//!
//! # Example
//!
//! ```no_run
//! use gantry_discover::{DiscoverOptions, OsFileSystem, discover};
//!
//! fn main() -> Result<(), gantry_discover::DiscoverError> {
//!     let packages = discover(&OsFileSystem, &DiscoverOptions::new("."))?;
//!     for package in packages {
//!         for command in &package.commands {
//!             println!("{} {}", package.package_name, command.command_name());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod assembler;
mod config;
mod discover;
mod error;
mod model;

pub mod constraint;
pub mod fs;
pub mod kebab;
pub mod scanner;
pub mod syntax;
pub mod tag;
pub mod walker;

pub use assembler::WRAPPER_SUFFIX;
pub use config::{DEFAULT_BUILD_TAG, DiscoverOptions, DiscoverOptionsBuilder};
pub use constraint::matches_build_tag;
pub use discover::{build_package, discover};
pub use error::{DiscoverError, DiscoverResult};
pub use fs::{DirEntry, EntryKind, FileSystem, MemoryFileSystem, OsFileSystem};
pub use kebab::to_kebab_case;
pub use model::{CommandInfo, CommandKind, FileInfo, PackageModel};
pub use scanner::{CommandCandidate, PackageScan, SubcommandLink};
pub use syntax::SignatureProblem;
pub use walker::{TaggedDir, TaggedFile};
