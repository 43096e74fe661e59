#![allow(clippy::missing_errors_doc, clippy::uninlined_format_args)]
//! Gantry Codegen - command wrappers for plain Go functions.
//!
//! For every exported, command-shaped function in a directory the generator
//! emits a zero-field `<Name>Command` type with `Run`, `Name` and (when the
//! function is documented) `Description` methods, so functions can be used
//! wherever a command object is expected. The output lands in
//! `<dir>/generated_<tag>_<package>.go`.
//!
//! ```no_run
//! use gantry_codegen::{GenerateOptions, generate};
//! use gantry_discover::OsFileSystem;
//!
//! match generate(&OsFileSystem, &GenerateOptions::new("build"))? {
//!     Some(path) => println!("wrote {}", path.display()),
//!     None => println!("nothing to generate"),
//! }
//! # Ok::<(), gantry_codegen::GenerateError>(())
//! ```

mod error;
mod format;
mod generate;
mod render;
mod scan;

pub use error::{GenerateError, GenerateResult};
pub use format::format_source;
pub use generate::{GENERATED_FILE_MODE, GenerateOptions, generate};
pub use render::{GENERATED_MARKER, go_quote, render_unit, wrapper_type_name};
pub use scan::{DirectoryScan, WrappedFunction, scan_directory};
