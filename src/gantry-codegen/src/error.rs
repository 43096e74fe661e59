//! Error types for wrapper generation.

use std::path::PathBuf;

use gantry_discover::DiscoverError;

/// Result type alias for generation operations.
pub type GenerateResult<T> = std::result::Result<T, GenerateError>;

/// Errors that can occur while generating wrappers.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Reading or scanning the directory failed.
    #[error(transparent)]
    Scan(#[from] DiscoverError),

    /// The directory holds no Go source files.
    #[error("No Go source files in '{dir}'")]
    NoSourceFiles { dir: PathBuf },

    /// Input is filtered by a build tag the output would not carry.
    #[error("Tag filtering requires a build tag on the generated file")]
    FilterWithoutTag,

    /// None of the source files declares a package.
    #[error("No package name found in '{dir}'")]
    NoPackageName { dir: PathBuf },

    /// A function already has a wrapper type.
    #[error("Wrapper already exists for {function}: type {type_name} is declared")]
    WrapperExists {
        function: String,
        type_name: String,
    },

    /// The rendered unit is not valid Go.
    #[error("Failed to format generated code: {0}")]
    Format(String),

    /// Writing the output file failed.
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenerateError {
    /// Creates a new `Write` error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Returns true for I/O failures, whether reading or writing.
    pub fn is_io(&self) -> bool {
        match self {
            Self::Scan(err) => err.is_io(),
            Self::Write { .. } => true,
            _ => false,
        }
    }
}
