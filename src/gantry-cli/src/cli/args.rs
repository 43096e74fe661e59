//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Gantry - discover Go build commands and generate command wrappers.
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about = "Discover Go build commands and generate wrappers", long_about = None)]
pub struct Cli {
    /// Path to a gantry.toml (defaults to ./gantry.toml when present)
    #[arg(long, short = 'c', global = true, env = "GANTRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Build tag that command files opt into
    #[arg(long, short = 't', global = true)]
    pub tag: Option<String>,

    /// Log level for diagnostics on stderr
    #[arg(long = "log-level", global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose output (same as --log-level debug)
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Enable trace-level logging for debugging
    #[arg(long = "trace", global = true)]
    pub trace: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Walk the tree and print the command model
    #[command(visible_alias = "ls")]
    Discover(DiscoverArgs),

    /// Generate command wrappers for the functions in one directory
    #[command(visible_alias = "gen")]
    Generate(GenerateArgs),
}

/// Arguments for the discover command.
#[derive(Debug, Default, Args)]
pub struct DiscoverArgs {
    /// Directory to start from
    pub root: Option<PathBuf>,

    /// Return every tagged directory instead of the closest one
    #[arg(long, short = 'm')]
    pub multi_package: bool,

    /// Descend into hidden directories
    #[arg(long)]
    pub include_hidden: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the generate command.
#[derive(Debug, Default, Args)]
pub struct GenerateArgs {
    /// Directory whose functions are wrapped
    pub dir: Option<PathBuf>,

    /// Only read files whose build constraint matches the tag
    #[arg(long)]
    pub only_tagged: bool,

    /// Do not write a build constraint into the generated file
    #[arg(long, conflicts_with = "only_tagged")]
    pub no_tag: bool,
}

impl Cli {
    /// Effective log level: `--trace`, `--verbose`, `--log-level`, then
    /// `GANTRY_LOG`, then the default.
    pub fn log_level(&self) -> LogLevel {
        if self.trace {
            LogLevel::Trace
        } else if self.verbose {
            LogLevel::Debug
        } else if let Some(level) = self.log_level {
            level
        } else if let Ok(env_level) = std::env::var("GANTRY_LOG") {
            LogLevel::from_str_loose(&env_level).unwrap_or_default()
        } else {
            LogLevel::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str_loose() {
        assert_eq!(LogLevel::from_str_loose("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str_loose("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_str_loose("loud"), None);
    }

    #[test]
    fn test_parse_discover() {
        let cli = Cli::try_parse_from([
            "gantry", "--tag", "ops", "discover", "tools", "--json", "-m",
        ])
        .unwrap();
        assert_eq!(cli.tag.as_deref(), Some("ops"));
        match cli.command {
            Commands::Discover(args) => {
                assert_eq!(args.root, Some(PathBuf::from("tools")));
                assert!(args.json);
                assert!(args.multi_package);
                assert!(!args.include_hidden);
            }
            Commands::Generate(_) => panic!("expected discover"),
        }
    }

    #[test]
    fn test_parse_generate_alias() {
        let cli = Cli::try_parse_from(["gantry", "gen", "--only-tagged", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_level(), LogLevel::Debug);
        assert!(matches!(
            cli.command,
            Commands::Generate(GenerateArgs {
                dir: None,
                only_tagged: true,
                no_tag: false
            })
        ));
    }

    #[test]
    fn test_no_tag_conflicts_with_only_tagged() {
        assert!(Cli::try_parse_from(["gantry", "generate", "--only-tagged", "--no-tag"]).is_err());
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["gantry"]).is_err());
    }
}
