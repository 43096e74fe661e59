//! Optional `gantry.toml` project configuration.
//!
//! Values here sit between command-line flags and built-in defaults. Relative
//! paths are resolved against the directory holding the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "gantry.toml";

/// Project settings read from `gantry.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GantryConfig {
    /// Directory discovery starts from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Build tag used by discovery and generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_package: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_hidden_dirs: Option<bool>,
    pub generate: GenerateSettings,
}

/// `[generate]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_tagged: Option<bool>,
}

impl GantryConfig {
    /// Read and parse one config file, resolving its relative paths.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: GantryConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.root = config.root.map(|p| base.join(p));
        config.generate.dir = config.generate.dir.map(|p| base.join(p));
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `explicit` when given (it must exist), otherwise
    /// `<cwd>/gantry.toml` when present, otherwise the defaults.
    pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                bail!("config file {} does not exist", path.display());
            }
            return Self::load(path);
        }

        let candidate = cwd.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_full() {
        let config: GantryConfig = toml::from_str(
            r#"
            root = "build"
            tag = "ops"
            multi_package = true
            skip_hidden_dirs = false

            [generate]
            dir = "build/tasks"
            only_tagged = true
            "#,
        )
        .expect("should parse");

        assert_eq!(config.root, Some(PathBuf::from("build")));
        assert_eq!(config.tag.as_deref(), Some("ops"));
        assert_eq!(config.multi_package, Some(true));
        assert_eq!(config.skip_hidden_dirs, Some(false));
        assert_eq!(config.generate.dir, Some(PathBuf::from("build/tasks")));
        assert_eq!(config.generate.only_tagged, Some(true));
    }

    #[test]
    fn test_deserialize_empty() {
        let config: GantryConfig = toml::from_str("").expect("should parse empty TOML");
        assert_eq!(config, GantryConfig::default());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(toml::from_str::<GantryConfig>("colour = true").is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "root = \"tools\"\n[generate]\ndir = \"tools/ops\"\n").unwrap();

        let config = GantryConfig::resolve(None, dir.path()).unwrap();
        assert_eq!(config.root, Some(dir.path().join("tools")));
        assert_eq!(config.generate.dir, Some(dir.path().join("tools/ops")));
    }

    #[test]
    fn test_resolve_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            GantryConfig::resolve(None, dir.path()).unwrap(),
            GantryConfig::default()
        );

        let missing = dir.path().join("nope.toml");
        let err = GantryConfig::resolve(Some(&missing), dir.path()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_parse_error_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "tag = [").unwrap();

        let err = GantryConfig::load(&path).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse config"));
    }
}
