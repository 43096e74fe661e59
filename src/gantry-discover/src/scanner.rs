//! Declaration scanner.
//!
//! [`PackageScan`] accumulates command candidates across every tagged file of
//! one directory. Promotion decisions need the whole package (a `Run` method
//! may live in a different file than its type), so nothing is decided until
//! [`PackageScan::finish`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use tree_sitter::Node;

use crate::error::{DiscoverError, DiscoverResult};
use crate::kebab::to_kebab_case;
use crate::syntax::{
    ContextImport, GoFile, SignatureShape, base_type_name, is_exported, string_literal_value,
};
use crate::tag::FieldAnnotation;
use crate::walker::TaggedFile;

/// Name of the program entry point, forbidden in tagged files.
pub const ENTRY_POINT: &str = "main";

/// Method that gives a type the run capability.
pub const RUN_METHOD: &str = "Run";

/// Method whose constant return value describes a type.
pub const DESCRIPTION_METHOD: &str = "Description";

/// Provisional command extracted from one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandCandidate {
    Function {
        name: String,
        file: PathBuf,
        description: String,
        uses_context: bool,
        returns_error: bool,
    },
    Type {
        name: String,
        file: PathBuf,
        has_subcommand_fields: bool,
    },
}

impl CommandCandidate {
    pub fn name(&self) -> &str {
        match self {
            CommandCandidate::Function { name, .. } | CommandCandidate::Type { name, .. } => name,
        }
    }
}

/// A struct field marked as a subcommand of its enclosing type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcommandLink {
    /// Type declaring the field.
    pub parent: String,
    /// Field identifier.
    pub field: String,
    /// Command name the child answers to.
    pub name: String,
    /// Base type name of the field, used only to exclude the child from the
    /// top level.
    pub child_type: String,
}

/// Per-directory accumulator fed one file at a time.
#[derive(Debug)]
pub struct PackageScan {
    pub(crate) dir: PathBuf,
    pub(crate) package_name: Option<String>,
    pub(crate) doc: String,
    pub(crate) candidates: Vec<CommandCandidate>,
    pub(crate) links: Vec<SubcommandLink>,
    /// Receiver type name to the shape of its `Run` method.
    pub(crate) run_methods: HashMap<String, SignatureShape>,
    pub(crate) descriptions: HashMap<String, String>,
    pub(crate) entry_points: Vec<PathBuf>,
}

impl PackageScan {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            package_name: None,
            doc: String::new(),
            candidates: Vec::new(),
            links: Vec::new(),
            run_methods: HashMap::new(),
            descriptions: HashMap::new(),
            entry_points: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }

    pub fn candidates(&self) -> &[CommandCandidate] {
        &self.candidates
    }

    pub fn links(&self) -> &[SubcommandLink] {
        &self.links
    }

    /// Parse one file and add its declarations to the accumulator.
    pub fn scan_file(&mut self, file: &TaggedFile) -> DiscoverResult<()> {
        trace!("Scanning {:?}", file.path);
        let unit = GoFile::parse(&file.path, file.content.clone())?;
        self.record_package(&unit, &file.path)?;

        let context = unit.context_import();
        for decl in unit.declarations() {
            match decl.kind() {
                "type_declaration" => self.scan_type_declaration(&unit, decl, &file.path),
                "method_declaration" => self.scan_method(&unit, decl, &context),
                "function_declaration" => {
                    self.scan_function(&unit, decl, &context, &file.path)?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn record_package(&mut self, unit: &GoFile, path: &Path) -> DiscoverResult<()> {
        let name = unit.package_name().ok_or_else(|| {
            DiscoverError::parse(path, tree_sitter::Point::new(0, 0), "missing package clause")
        })?;

        match &self.package_name {
            None => {
                debug!("Package {} in {:?}", name, self.dir);
                self.doc = unit.package_doc().unwrap_or_default();
                self.package_name = Some(name);
            }
            Some(existing) if *existing != name => {
                return Err(DiscoverError::MultiplePackages {
                    dir: self.dir.clone(),
                    first: existing.clone(),
                    second: name,
                });
            }
            Some(_) => {}
        }

        Ok(())
    }

    fn scan_type_declaration(&mut self, unit: &GoFile, decl: Node<'_>, path: &Path) {
        let mut cursor = decl.walk();
        let specs: Vec<Node<'_>> = decl
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "type_spec")
            .collect();

        for spec in specs {
            let (Some(name_node), Some(ty)) =
                (spec.child_by_field_name("name"), spec.child_by_field_name("type"))
            else {
                continue;
            };
            let name = unit.text(name_node).to_string();
            if ty.kind() != "struct_type" || !is_exported(&name) {
                continue;
            }

            let links = struct_subcommand_links(unit, &name, ty);
            let has_subcommand_fields = !links.is_empty();
            self.links.extend(links);
            self.candidates.push(CommandCandidate::Type {
                name,
                file: path.to_path_buf(),
                has_subcommand_fields,
            });
        }
    }

    fn scan_method(&mut self, unit: &GoFile, method: Node<'_>, context: &ContextImport) {
        let Some(name) = method.child_by_field_name("name").map(|n| unit.text(n)) else {
            return;
        };
        let Some(receiver) = unit.receiver_type_name(method) else {
            return;
        };

        match name {
            RUN_METHOD => {
                // Run methods with unusual shapes still mark the type runnable
                let shape = unit
                    .command_signature(method, context)
                    .unwrap_or(SignatureShape {
                        uses_context: false,
                        returns_error: false,
                    });
                self.run_methods.insert(receiver, shape);
            }
            DESCRIPTION_METHOD => {
                if let Some(text) = unit.constant_string_method(method) {
                    self.descriptions.insert(receiver, text.trim().to_string());
                }
            }
            _ => {}
        }
    }

    fn scan_function(
        &mut self,
        unit: &GoFile,
        func: Node<'_>,
        context: &ContextImport,
        path: &Path,
    ) -> DiscoverResult<()> {
        let Some(name) = func.child_by_field_name("name").map(|n| unit.text(n)) else {
            return Ok(());
        };

        if name == ENTRY_POINT {
            self.entry_points.push(path.to_path_buf());
            return Ok(());
        }
        if !is_exported(name) {
            return Ok(());
        }

        let shape = unit
            .command_signature(func, context)
            .map_err(|problem| DiscoverError::invalid_signature(name, path, problem))?;

        self.candidates.push(CommandCandidate::Function {
            name: name.to_string(),
            file: path.to_path_buf(),
            description: unit.doc_comment(func).unwrap_or_default(),
            uses_context: shape.uses_context,
            returns_error: shape.returns_error,
        });
        Ok(())
    }
}

/// Subcommand links declared by the fields of one struct type.
pub fn struct_subcommand_links(
    unit: &GoFile,
    parent: &str,
    struct_type: Node<'_>,
) -> Vec<SubcommandLink> {
    let mut links = Vec::new();
    let mut cursor = struct_type.walk();
    let Some(list) = struct_type
        .named_children(&mut cursor)
        .find(|n| n.kind() == "field_declaration_list")
    else {
        return links;
    };

    let mut list_cursor = list.walk();
    let fields: Vec<Node<'_>> = list
        .named_children(&mut list_cursor)
        .filter(|n| n.kind() == "field_declaration")
        .collect();

    for field in fields {
        let annotation = field
            .child_by_field_name("tag")
            .and_then(|tag| string_literal_value(tag, unit.source()))
            .and_then(|tag| FieldAnnotation::from_struct_tag(&tag));
        let Some(annotation) = annotation.filter(|a| a.subcommand) else {
            continue;
        };
        let Some(ty) = field.child_by_field_name("type") else {
            continue;
        };
        let child_type = base_type_name(ty, unit.source());

        let mut name_cursor = field.walk();
        let mut field_names: Vec<String> = field
            .children_by_field_name("name", &mut name_cursor)
            .map(|n| unit.text(n).to_string())
            .collect();
        if field_names.is_empty() {
            // Embedded field: Go names it after the type
            let embedded = child_type.rsplit('.').next().unwrap_or(&child_type);
            field_names.push(embedded.to_string());
        }

        for field_name in field_names {
            let name = annotation
                .name
                .clone()
                .unwrap_or_else(|| to_kebab_case(&field_name));
            trace!("Subcommand {} -> {} ({})", parent, name, child_type);
            links.push(SubcommandLink {
                parent: parent.to_string(),
                field: field_name,
                name,
                child_type: child_type.clone(),
            });
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn tagged(path: &str, body: &str) -> TaggedFile {
        TaggedFile {
            path: PathBuf::from(path),
            content: format!("//go:build gantry\n\n{body}"),
        }
    }

    fn scan(files: &[TaggedFile]) -> DiscoverResult<PackageScan> {
        let mut scan = PackageScan::new("ops");
        for file in files {
            scan.scan_file(file)?;
        }
        Ok(scan)
    }

    #[test]
    fn test_records_package_and_doc() {
        let scan =
            scan(&[tagged("ops/a.go", "// Package ops builds things.\npackage ops\n")]).unwrap();
        assert_eq!(scan.package_name(), Some("ops"));
        assert_eq!(scan.doc, "Package ops builds things.");
    }

    #[test]
    fn test_multiple_package_names() {
        let err = scan(&[
            tagged("ops/a.go", "package ops\n"),
            tagged("ops/b.go", "package tools\n"),
        ])
        .unwrap_err();
        assert_matches!(
            err,
            DiscoverError::MultiplePackages { ref first, ref second, .. }
                if first == "ops" && second == "tools"
        );
        assert!(err.to_string().contains("ops"));
    }

    #[test]
    fn test_function_candidates() {
        let scan = scan(&[tagged(
            "ops/a.go",
            "package ops\n\nimport \"context\"\n\n\
             // Build compiles the project.\n\
             func Build() {}\n\n\
             func Test(ctx context.Context) error { return nil }\n\n\
             func helper() {}\n",
        )])
        .unwrap();

        assert_eq!(
            scan.candidates(),
            &[
                CommandCandidate::Function {
                    name: "Build".to_string(),
                    file: PathBuf::from("ops/a.go"),
                    description: "Build compiles the project.".to_string(),
                    uses_context: false,
                    returns_error: false,
                },
                CommandCandidate::Function {
                    name: "Test".to_string(),
                    file: PathBuf::from("ops/a.go"),
                    description: String::new(),
                    uses_context: true,
                    returns_error: true,
                },
            ]
        );
    }

    #[test]
    fn test_invalid_signatures() {
        let err = scan(&[tagged("ops/a.go", "package ops\n\nfunc Deploy(a, b string) {}\n")])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Function Deploy in 'ops/a.go' must be niladic or accept context"
        );

        let err = scan(&[tagged("ops/a.go", "package ops\n\nfunc Deploy(env string) {}\n")])
            .unwrap_err();
        assert!(err.to_string().ends_with("must accept context.Context"));

        let err = scan(&[tagged("ops/a.go", "package ops\n\nfunc Deploy() int { return 0 }\n")])
            .unwrap_err();
        assert!(err.to_string().ends_with("must return only error"));
    }

    #[test]
    fn test_context_without_import_is_rejected() {
        let err = scan(&[tagged(
            "ops/a.go",
            "package ops\n\nfunc Deploy(ctx context.Context) {}\n",
        )])
        .unwrap_err();
        assert!(err.to_string().ends_with("must accept context.Context"));
    }

    #[test]
    fn test_entry_point_recorded() {
        let scan = scan(&[tagged("ops/a.go", "package ops\n\nfunc main() {}\n")]).unwrap();
        assert_eq!(scan.entry_points, vec![PathBuf::from("ops/a.go")]);
        assert!(scan.candidates().is_empty());
    }

    #[test]
    fn test_types_methods_and_links() {
        let scan = scan(&[
            tagged(
                "ops/root.go",
                "package ops\n\n\
                 type Root struct {\n\
                 \tDeploy *DeployCmd `gantry:\"subcommand\"`\n\
                 \tLintAll LintCmd `gantry:\"subcommand,name=check\"`\n\
                 \tVerbose bool `gantry:\"flag\"`\n\
                 }\n\n\
                 type internal struct{}\n\n\
                 type Alias = Root\n",
            ),
            tagged(
                "ops/deploy.go",
                "package ops\n\nimport \"context\"\n\n\
                 type DeployCmd struct{}\n\n\
                 func (d *DeployCmd) Run(ctx context.Context) error { return nil }\n\n\
                 func (DeployCmd) Description() string {\n\treturn \" Ship it \"\n}\n",
            ),
        ])
        .unwrap();

        assert_eq!(
            scan.links(),
            &[
                SubcommandLink {
                    parent: "Root".to_string(),
                    field: "Deploy".to_string(),
                    name: "deploy".to_string(),
                    child_type: "DeployCmd".to_string(),
                },
                SubcommandLink {
                    parent: "Root".to_string(),
                    field: "LintAll".to_string(),
                    name: "check".to_string(),
                    child_type: "LintCmd".to_string(),
                },
            ]
        );

        let type_names: Vec<&str> = scan.candidates().iter().map(|c| c.name()).collect();
        assert_eq!(type_names, vec!["Root", "DeployCmd"]);
        assert_eq!(
            scan.run_methods.get("DeployCmd"),
            Some(&SignatureShape {
                uses_context: true,
                returns_error: true
            })
        );
        assert_eq!(
            scan.descriptions.get("DeployCmd").map(String::as_str),
            Some("Ship it")
        );
    }

    #[test]
    fn test_embedded_subcommand_field() {
        let scan = scan(&[tagged(
            "ops/a.go",
            "package ops\n\ntype Root struct {\n\t*ReleaseNotes `gantry:\"subcommand\"`\n}\n",
        )])
        .unwrap();
        assert_eq!(scan.links()[0].field, "ReleaseNotes");
        assert_eq!(scan.links()[0].name, "release-notes");
    }

    #[test]
    fn test_parse_error_aborts() {
        let err = scan(&[tagged("ops/a.go", "package ops\n\nfunc Broken( {\n")]).unwrap_err();
        assert_matches!(err, DiscoverError::Parse { .. });
    }
}
