//! Lightweight declaration scan of one directory.
//!
//! Only what the generator needs: the package name, every declared type name,
//! the names claimed by subcommand fields and the exported functions that can
//! be wrapped. Methods are not inspected.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use gantry_discover::fs::FileSystem;
use gantry_discover::kebab::to_kebab_case;
use gantry_discover::scanner::struct_subcommand_links;
use gantry_discover::syntax::{GoFile, is_exported};
use gantry_discover::DiscoverError;
use gantry_discover::walker::{is_source_file, read_tagged_source};
use tracing::trace;
use tree_sitter::Node;

use crate::error::GenerateResult;

/// An exported function with a command-compatible signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedFunction {
    pub name: String,
    pub description: Option<String>,
    pub uses_context: bool,
    pub returns_error: bool,
}

/// Declarations gathered from one directory.
#[derive(Debug, Default)]
pub struct DirectoryScan {
    pub source_files: Vec<PathBuf>,
    pub package_name: Option<String>,
    pub type_names: BTreeSet<String>,
    /// Command names taken by subcommand fields.
    pub claimed_names: BTreeSet<String>,
    pub functions: Vec<WrappedFunction>,
}

impl DirectoryScan {
    /// Functions left after removing those claimed as subcommands, by name.
    pub fn eligible(&self) -> Vec<&WrappedFunction> {
        let mut out: Vec<&WrappedFunction> = self
            .functions
            .iter()
            .filter(|f| !self.claimed_names.contains(&to_kebab_case(&f.name)))
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    fn scan_file(&mut self, dir: &Path, path: &Path, content: String) -> GenerateResult<()> {
        let unit = GoFile::parse(path, content)?;

        if let Some(name) = unit.package_name() {
            match &self.package_name {
                None => self.package_name = Some(name),
                Some(existing) if *existing != name => {
                    return Err(DiscoverError::MultiplePackages {
                        dir: dir.to_path_buf(),
                        first: existing.clone(),
                        second: name,
                    }
                    .into());
                }
                Some(_) => {}
            }
        }

        let context = unit.context_import();
        for decl in unit.declarations() {
            match decl.kind() {
                "type_declaration" => self.record_types(&unit, decl),
                "function_declaration" => {
                    let Some(name) = decl.child_by_field_name("name").map(|n| unit.text(n)) else {
                        continue;
                    };
                    if !is_exported(name) {
                        continue;
                    }
                    let shape = unit.command_signature(decl, &context).map_err(|problem| {
                        DiscoverError::invalid_signature(name, path, problem)
                    })?;
                    self.functions.push(WrappedFunction {
                        name: name.to_string(),
                        description: unit.doc_comment(decl),
                        uses_context: shape.uses_context,
                        returns_error: shape.returns_error,
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn record_types(&mut self, unit: &GoFile, decl: Node<'_>) {
        let mut cursor = decl.walk();
        let specs: Vec<Node<'_>> = decl.named_children(&mut cursor).collect();

        for spec in specs {
            if !matches!(spec.kind(), "type_spec" | "type_alias") {
                continue;
            }
            let Some(name) = spec.child_by_field_name("name").map(|n| unit.text(n)) else {
                continue;
            };
            if let Some(ty) = spec.child_by_field_name("type")
                && ty.kind() == "struct_type"
            {
                for link in struct_subcommand_links(unit, name, ty) {
                    self.claimed_names.insert(link.name);
                }
            }
            self.type_names.insert(name.to_string());
        }
    }
}

/// Scan the Go files directly inside `dir`, in name order. With `filter_tag`
/// only files whose build constraint matches the tag are read.
pub fn scan_directory(
    fs: &dyn FileSystem,
    dir: &Path,
    filter_tag: Option<&str>,
) -> GenerateResult<DirectoryScan> {
    let mut entries = fs
        .read_dir(dir)
        .map_err(|e| DiscoverError::read_directory(dir, e))?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let mut scan = DirectoryScan::default();
    for entry in entries {
        if !entry.is_file() || !is_source_file(&entry.name) {
            continue;
        }
        let path = dir.join(&entry.name);
        let Some(content) = read_tagged_source(fs, &path, filter_tag)? else {
            trace!("Skipping untagged {:?}", path);
            continue;
        };

        scan.scan_file(dir, &path, content)?;
        scan.source_files.push(path);
    }

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use gantry_discover::MemoryFileSystem;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collects_types_claims_and_functions() {
        let fs = MemoryFileSystem::new()
            .with_file(
                "ops/a.go",
                "package ops\n\n\
                 type Root struct {\n\tLint LintCmd `gantry:\"subcommand\"`\n}\n\n\
                 type LintCmd struct{}\n\n\
                 type Alias = Root\n\n\
                 // Lint checks style.\n\
                 func Lint() error { return nil }\n\n\
                 func Build() {}\n\n\
                 func main() {}\n",
            )
            .with_file("ops/a_test.go", "package ops\n\nfunc TestX(n int) {}\n");

        let scan = scan_directory(&fs, Path::new("ops"), None).unwrap();
        assert_eq!(scan.package_name.as_deref(), Some("ops"));
        assert_eq!(
            scan.type_names.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["Alias", "LintCmd", "Root"]
        );
        assert!(scan.claimed_names.contains("lint"));
        assert_eq!(scan.functions.len(), 2);
        assert_eq!(scan.functions[0].description.as_deref(), Some("Lint checks style."));

        let eligible: Vec<&str> = scan.eligible().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(eligible, vec!["Build"]);
    }

    #[test]
    fn test_filter_tag() {
        let fs = MemoryFileSystem::new()
            .with_file("ops/a.go", "//go:build gantry\n\npackage ops\n\nfunc Build() {}\n")
            .with_file("ops/b.go", "package ops\n\nfunc Other() {}\n");

        let scan = scan_directory(&fs, Path::new("ops"), Some("gantry")).unwrap();
        assert_eq!(scan.source_files, vec![PathBuf::from("ops/a.go")]);
        assert_eq!(scan.functions.len(), 1);

        let scan = scan_directory(&fs, Path::new("ops"), None).unwrap();
        assert_eq!(scan.functions.len(), 2);

        // Stray bytes only matter in a file that is read
        fs.add_file("ops/c.go", b"package ops\n// caf\xe9\n");
        let scan = scan_directory(&fs, Path::new("ops"), Some("gantry")).unwrap();
        assert_eq!(scan.source_files, vec![PathBuf::from("ops/a.go")]);
        let err = scan_directory(&fs, Path::new("ops"), None).unwrap_err();
        assert_matches!(err, crate::GenerateError::Scan(DiscoverError::Parse { .. }));
    }

    #[test]
    fn test_package_mismatch_and_bad_signature() {
        let fs = MemoryFileSystem::new()
            .with_file("ops/a.go", "package ops\n")
            .with_file("ops/b.go", "package tools\n");
        let err = scan_directory(&fs, Path::new("ops"), None).unwrap_err();
        assert_matches!(
            err,
            crate::GenerateError::Scan(DiscoverError::MultiplePackages { .. })
        );

        let fs = MemoryFileSystem::new()
            .with_file("ops/a.go", "package ops\n\nfunc Deploy() int { return 1 }\n");
        let err = scan_directory(&fs, Path::new("ops"), None).unwrap_err();
        assert!(err.to_string().ends_with("must return only error"));
    }
}
