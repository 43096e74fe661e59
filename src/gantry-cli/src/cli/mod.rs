//! CLI argument parsing and command dispatch.
//!
//! - `args` - Command-line argument structures
//! - `handlers` - Option merging and command execution

pub mod args;
pub mod handlers;

pub use args::{Cli, Commands, DiscoverArgs, GenerateArgs, LogLevel};
pub use handlers::{discover_options, dispatch_command, format_packages, generate_options};
