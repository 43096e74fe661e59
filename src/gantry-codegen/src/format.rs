//! Canonical layout for generated Go source.

use std::path::Path;

use gantry_discover::syntax::GoFile;

use crate::error::{GenerateError, GenerateResult};

/// Check that `source` parses as Go and normalize its layout: no trailing
/// whitespace, no leading or repeated blank lines, one final newline.
pub fn format_source(path: &Path, source: &str) -> GenerateResult<String> {
    GoFile::parse(path, source.to_string()).map_err(|e| GenerateError::Format(e.to_string()))?;

    let mut out = String::with_capacity(source.len());
    let mut pending_blank = false;
    for line in source.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(line);
        out.push('\n');
    }

    Ok(out)
}
