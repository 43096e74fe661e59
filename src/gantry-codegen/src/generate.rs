//! Wrapper generation entry point.

use std::path::PathBuf;

use gantry_discover::DEFAULT_BUILD_TAG;
use gantry_discover::fs::FileSystem;
use gantry_discover::walker::{SOURCE_EXTENSION, generated_file_prefix};
use tracing::{debug, info};

use crate::error::{GenerateError, GenerateResult};
use crate::format::format_source;
use crate::render::{render_unit, wrapper_type_name};
use crate::scan::scan_directory;

/// File mode of generated files.
pub const GENERATED_FILE_MODE: u32 = 0o644;

/// Options for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Directory whose functions are wrapped.
    pub dir: PathBuf,
    /// Build tag written into the generated file. Also names the output file;
    /// `gantry` is used for the name when unset.
    pub build_tag: Option<String>,
    /// Only read files whose build constraint matches the tag.
    pub only_tagged: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            build_tag: Some(DEFAULT_BUILD_TAG.to_string()),
            only_tagged: false,
        }
    }
}

impl GenerateOptions {
    /// Creates options for the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Sets the build tag.
    pub fn with_build_tag(mut self, tag: Option<String>) -> Self {
        self.build_tag = tag;
        self
    }

    /// Restricts input to files matching the build tag.
    pub fn with_only_tagged(mut self, only_tagged: bool) -> Self {
        self.only_tagged = only_tagged;
        self
    }

    fn effective_tag(&self) -> &str {
        self.build_tag.as_deref().unwrap_or(DEFAULT_BUILD_TAG)
    }
}

/// Generate command wrappers for the exported functions in `options.dir`.
///
/// Returns the path written, or `None` when no function needs a wrapper.
/// Filtering by tag requires the output to carry that tag, otherwise a second
/// run would not see the wrappers written by the first.
pub fn generate(
    fs: &dyn FileSystem,
    options: &GenerateOptions,
) -> GenerateResult<Option<PathBuf>> {
    if options.only_tagged && options.build_tag.is_none() {
        return Err(GenerateError::FilterWithoutTag);
    }

    let tag = options.effective_tag();
    let filter = options.only_tagged.then_some(tag);
    let scan = scan_directory(fs, &options.dir, filter)?;

    if scan.source_files.is_empty() {
        return Err(GenerateError::NoSourceFiles {
            dir: options.dir.clone(),
        });
    }
    let Some(package) = scan.package_name.as_deref() else {
        return Err(GenerateError::NoPackageName {
            dir: options.dir.clone(),
        });
    };

    let functions = scan.eligible();
    if functions.is_empty() {
        info!("Nothing to generate in {:?}", options.dir);
        return Ok(None);
    }

    for function in &functions {
        let type_name = wrapper_type_name(&function.name);
        if scan.type_names.contains(&type_name) {
            return Err(GenerateError::WrapperExists {
                function: function.name.clone(),
                type_name,
            });
        }
    }

    let path = options.dir.join(format!(
        "{}{}{}",
        generated_file_prefix(tag),
        package,
        SOURCE_EXTENSION
    ));
    let rendered = render_unit(package, options.build_tag.as_deref(), &functions);
    let formatted = format_source(&path, &rendered)?;
    debug!("Rendered {} wrappers for {:?}", functions.len(), path);

    fs.write_file(&path, formatted.as_bytes(), GENERATED_FILE_MODE)
        .map_err(|e| GenerateError::write(&path, e))?;
    info!("Wrote {:?}", path);

    Ok(Some(path))
}
