//! Configuration types for discovery.

use std::path::PathBuf;

use crate::walker::WalkOptions;

/// Build tag used when none is configured.
pub const DEFAULT_BUILD_TAG: &str = "gantry";

/// Configuration for one discovery run.
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Directory the breadth-first walk starts from.
    pub start_dir: PathBuf,

    /// Build tag that files must opt into.
    pub build_tag: String,

    /// Return every tagged directory instead of stopping at the closest one.
    pub multi_package: bool,

    /// Whether to skip hidden directories (starting with .).
    pub skip_hidden_dirs: bool,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            start_dir: PathBuf::from("."),
            build_tag: DEFAULT_BUILD_TAG.to_string(),
            multi_package: false,
            skip_hidden_dirs: true,
        }
    }
}

impl DiscoverOptions {
    /// Creates options for the given start directory.
    pub fn new(start_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_dir: start_dir.into(),
            ..Default::default()
        }
    }

    /// Creates a builder for constructing options.
    pub fn builder(start_dir: impl Into<PathBuf>) -> DiscoverOptionsBuilder {
        DiscoverOptionsBuilder::new(start_dir)
    }

    pub(crate) fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            build_tag: self.build_tag.clone(),
            multi_package: self.multi_package,
            skip_hidden_dirs: self.skip_hidden_dirs,
        }
    }
}

/// Builder for creating `DiscoverOptions` instances.
#[derive(Debug)]
pub struct DiscoverOptionsBuilder {
    options: DiscoverOptions,
}

impl DiscoverOptionsBuilder {
    /// Creates a new builder with the specified start directory.
    pub fn new(start_dir: impl Into<PathBuf>) -> Self {
        Self {
            options: DiscoverOptions::new(start_dir),
        }
    }

    /// Sets the build tag.
    pub fn build_tag(mut self, tag: impl Into<String>) -> Self {
        self.options.build_tag = tag.into();
        self
    }

    /// Sets multi-package mode.
    pub fn multi_package(mut self, multi: bool) -> Self {
        self.options.multi_package = multi;
        self
    }

    /// Sets whether to skip hidden directories.
    pub fn skip_hidden_dirs(mut self, skip: bool) -> Self {
        self.options.skip_hidden_dirs = skip;
        self
    }

    /// Builds the options.
    pub fn build(self) -> DiscoverOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = DiscoverOptions::default();
        assert_eq!(options.start_dir, PathBuf::from("."));
        assert_eq!(options.build_tag, "gantry");
        assert!(!options.multi_package);
        assert!(options.skip_hidden_dirs);
    }

    #[test]
    fn test_builder() {
        let options = DiscoverOptions::builder("tools")
            .build_tag("ops")
            .multi_package(true)
            .skip_hidden_dirs(false)
            .build();

        assert_eq!(options.start_dir, PathBuf::from("tools"));
        let walk = options.walk_options();
        assert_eq!(walk.build_tag, "ops");
        assert!(walk.multi_package);
        assert!(!walk.skip_hidden_dirs);
    }
}
