//! Breadth-first directory walker that finds tagged Go files.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::constraint::matches_build_tag;
use crate::error::{DiscoverError, DiscoverResult};
use crate::fs::FileSystem;

/// Directory names that are never descended into.
pub const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn", "vendor", "node_modules"];

/// Source file extension.
pub const SOURCE_EXTENSION: &str = ".go";

/// Suffix of test files, which never hold commands.
pub const TEST_SUFFIX: &str = "_test.go";

/// A source file whose build constraint matches the target tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedFile {
    pub path: PathBuf,
    pub content: String,
}

/// A directory holding at least one tagged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedDir {
    pub path: PathBuf,
    /// Distance from the walk root; the root itself is depth 0.
    pub depth: usize,
    /// Tagged files in name order.
    pub files: Vec<TaggedFile>,
}

/// Walker settings.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Build tag files must opt into.
    pub build_tag: String,
    /// Walk the whole tree and allow several tagged directories per depth.
    pub multi_package: bool,
    /// Skip directories whose name starts with `.`.
    pub skip_hidden_dirs: bool,
}

/// File name prefix of wrappers written by the generator for `tag`.
pub fn generated_file_prefix(tag: &str) -> String {
    format!("generated_{tag}_")
}

/// Whether a directory entry should be descended into.
pub fn should_descend(name: &str, skip_hidden: bool) -> bool {
    if SKIPPED_DIRS.contains(&name) {
        return false;
    }
    !(skip_hidden && name.starts_with('.'))
}

/// Whether a file name is a non-test Go source file.
pub fn is_source_file(name: &str) -> bool {
    name.ends_with(SOURCE_EXTENSION) && !name.ends_with(TEST_SUFFIX)
}

/// Read a file through the port, returning its text when `tag` is `None` or
/// the file's build constraint matches `tag`.
///
/// The constraint is checked on a lossy decoding, so an unselected file may
/// hold any bytes. A selected file that is not valid UTF-8 is a parse error.
pub fn read_tagged_source(
    fs: &dyn FileSystem,
    path: &Path,
    tag: Option<&str>,
) -> DiscoverResult<Option<String>> {
    let bytes = fs
        .read_file(path)
        .map_err(|e| DiscoverError::read_file(path, e))?;

    if let Some(tag) = tag
        && !matches_build_tag(&String::from_utf8_lossy(&bytes), tag)
    {
        return Ok(None);
    }

    match String::from_utf8(bytes) {
        Ok(content) => Ok(Some(content)),
        Err(e) => {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            let row = valid.iter().filter(|&&b| b == b'\n').count();
            let line_start = valid.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
            let column = valid.len() - line_start;
            Err(DiscoverError::parse(
                path,
                tree_sitter::Point { row, column },
                "invalid UTF-8 in source file",
            ))
        }
    }
}

/// Walk `start` breadth-first and collect tagged directories.
///
/// In single-package mode the walk stops after the first depth that yields a
/// tagged directory and fails if that depth yields more than one.
pub fn walk(
    fs: &dyn FileSystem,
    start: &Path,
    options: &WalkOptions,
) -> DiscoverResult<Vec<TaggedDir>> {
    let generated_prefix = generated_file_prefix(&options.build_tag);
    let mut queue = VecDeque::from([(start.to_path_buf(), 0usize)]);
    let mut found: Vec<TaggedDir> = Vec::new();

    while let Some((dir, depth)) = queue.pop_front() {
        // Queue is depth-ordered, so the first deeper entry ends a depth
        if !options.multi_package
            && let Some(first) = found.first()
            && depth > first.depth
        {
            break;
        }

        let mut entries = fs
            .read_dir(&dir)
            .map_err(|e| DiscoverError::read_directory(&dir, e))?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let mut files = Vec::new();
        for entry in entries {
            let path = dir.join(&entry.name);

            if entry.is_dir() {
                if should_descend(&entry.name, options.skip_hidden_dirs) {
                    queue.push_back((path, depth + 1));
                } else {
                    trace!("Skipping directory {:?}", path);
                }
                continue;
            }

            if !entry.is_file()
                || !is_source_file(&entry.name)
                || entry.name.starts_with(&generated_prefix)
            {
                continue;
            }

            if let Some(content) = read_tagged_source(fs, &path, Some(&options.build_tag))? {
                debug!("Tagged file {:?}", path);
                files.push(TaggedFile { path, content });
            }
        }

        if !files.is_empty() {
            found.push(TaggedDir {
                path: dir,
                depth,
                files,
            });
        }
    }

    if !options.multi_package && found.len() > 1 {
        return Err(DiscoverError::DepthConflict {
            depth: found[0].depth,
            dirs: found.into_iter().map(|d| d.path).collect(),
        });
    }

    Ok(found)
}
