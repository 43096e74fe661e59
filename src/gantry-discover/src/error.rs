//! Error types for discovery operations.

use std::path::PathBuf;

use crate::syntax::SignatureProblem;

/// Result type alias for discovery operations.
pub type DiscoverResult<T> = std::result::Result<T, DiscoverError>;

/// Errors that can occur while discovering commands.
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    /// Failed to list a directory through the file-system port.
    #[error("Failed to read directory '{path}': {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a file through the file-system port.
    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The Go grammar could not be loaded into the parser.
    #[error("Failed to load Go grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    /// Source text could not be parsed.
    #[error("Parse error in '{path}' at {line}:{column}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// Files in one directory declare different package names.
    #[error("Multiple package names in '{dir}': {first} and {second}")]
    MultiplePackages {
        dir: PathBuf,
        first: String,
        second: String,
    },

    /// Tagged files declare a program entry point.
    #[error("Tagged files must not declare main(): {}", join_paths(.files))]
    EntryPoint { files: Vec<PathBuf> },

    /// An exported function has a signature that cannot be invoked as a command.
    #[error("Function {function} in '{file}' {problem}")]
    InvalidSignature {
        function: String,
        file: PathBuf,
        problem: SignatureProblem,
    },

    /// Two commands normalize to the same kebab-case name.
    #[error("Duplicate command name '{name}': {first} and {second}")]
    DuplicateCommand {
        name: String,
        first: String,
        second: String,
    },

    /// More than one directory qualifies at the closest tagged depth.
    #[error(
        "Multiple tagged directories at depth {depth}: {}; enable multi-package mode or narrow the start directory",
        join_paths(.dirs)
    )]
    DepthConflict { depth: usize, dirs: Vec<PathBuf> },
}

impl DiscoverError {
    /// Creates a new `ReadDirectory` error.
    pub fn read_directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadDirectory {
            path: path.into(),
            source,
        }
    }

    /// Creates a new `ReadFile` error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a new `Parse` error from a zero-based tree-sitter position.
    pub fn parse(
        path: impl Into<PathBuf>,
        point: tree_sitter::Point,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            line: point.row + 1,
            column: point.column + 1,
            message: message.into(),
        }
    }

    /// Creates a new `InvalidSignature` error.
    pub fn invalid_signature(
        function: impl Into<String>,
        file: impl Into<PathBuf>,
        problem: SignatureProblem,
    ) -> Self {
        Self::InvalidSignature {
            function: function.into(),
            file: file.into(),
            problem,
        }
    }

    /// Returns true for I/O failures reported by the file-system port.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::ReadDirectory { .. } | Self::ReadFile { .. })
    }
}

pub(crate) fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
