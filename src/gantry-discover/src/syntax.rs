//! Shared Go syntax helpers built on tree-sitter.
//!
//! Both the declaration scanner and the wrapper generator read declarations
//! through these helpers. Nothing here keeps a [`Node`] alive beyond the call
//! that received it; results are copied out as plain strings and flags.

use std::fmt;
use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::error::{DiscoverError, DiscoverResult};

/// Import path of the cancellation context package.
pub const CONTEXT_PACKAGE: &str = "context";

/// Name of the context type inside [`CONTEXT_PACKAGE`].
pub const CONTEXT_TYPE: &str = "Context";

/// A parsed Go compilation unit together with its source text.
pub struct GoFile {
    tree: Tree,
    source: String,
}

impl GoFile {
    /// Parse `source`, failing on any syntax error.
    pub fn parse(path: &Path, source: String) -> DiscoverResult<Self> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_go::LANGUAGE.into())?;

        let tree = parser.parse(&source, None).ok_or_else(|| {
            DiscoverError::parse(path, tree_sitter::Point::new(0, 0), "parser produced no tree")
        })?;

        if let Some(bad) = first_error(tree.root_node()) {
            let message = if bad.is_missing() {
                format!("missing {}", bad.kind())
            } else {
                let snippet: String = text(bad, &source).chars().take(32).collect();
                format!("unexpected `{}`", snippet.trim())
            };
            return Err(DiscoverError::parse(path, bad.start_position(), message));
        }

        Ok(Self { tree, source })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Text covered by `node`.
    pub fn text(&self, node: Node<'_>) -> &str {
        text(node, &self.source)
    }

    /// Top-level declarations (comments excluded).
    pub fn declarations(&self) -> Vec<Node<'_>> {
        let root = self.root();
        let mut cursor = root.walk();
        let decls = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() != "comment")
            .collect();
        decls
    }

    /// Declared package name.
    pub fn package_name(&self) -> Option<String> {
        let clause = self.package_clause()?;
        let mut cursor = clause.walk();
        let name = clause
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_identifier")
            .map(|n| self.text(n).to_string());
        name
    }

    /// Documentation comment attached to the package clause.
    pub fn package_doc(&self) -> Option<String> {
        self.package_clause().and_then(|c| self.doc_comment(c))
    }

    fn package_clause(&self) -> Option<Node<'_>> {
        let root = self.root();
        let mut cursor = root.walk();
        let clause = root
            .named_children(&mut cursor)
            .find(|n| n.kind() == "package_clause");
        clause
    }

    /// Doc comment group immediately preceding `node`, cleaned up the way
    /// `go doc` presents it. Directive lines such as `//go:build` are dropped.
    pub fn doc_comment(&self, node: Node<'_>) -> Option<String> {
        let mut comments = Vec::new();
        let mut next_row = node.start_position().row;
        let mut current = node.prev_sibling();

        while let Some(prev) = current {
            if prev.kind() != "comment" || prev.end_position().row + 1 != next_row {
                break;
            }
            // A trailing comment on a code line belongs to that line
            if let Some(before) = prev.prev_sibling()
                && before.kind() != "comment"
                && before.end_position().row == prev.start_position().row
            {
                break;
            }
            comments.push(prev);
            next_row = prev.start_position().row;
            current = prev.prev_sibling();
        }

        comments.reverse();
        let lines: Vec<String> = comments
            .into_iter()
            .flat_map(|c| comment_lines(self.text(c)))
            .collect();
        let doc = lines.join("\n").trim().to_string();
        (!doc.is_empty()).then_some(doc)
    }

    /// How this file refers to `context.Context`.
    pub fn context_import(&self) -> ContextImport {
        let mut result = ContextImport::NotImported;

        for decl in self.declarations() {
            if decl.kind() != "import_declaration" {
                continue;
            }
            for spec in descendants_of_kind(decl, "import_spec") {
                let Some(path) = spec.child_by_field_name("path") else {
                    continue;
                };
                if string_literal_value(path, &self.source).as_deref() != Some(CONTEXT_PACKAGE) {
                    continue;
                }
                result = match spec.child_by_field_name("name") {
                    None => ContextImport::Named(CONTEXT_PACKAGE.to_string()),
                    Some(name) if name.kind() == "dot" => ContextImport::Dot,
                    Some(name) if name.kind() == "blank_identifier" => ContextImport::NotImported,
                    Some(name) => ContextImport::Named(self.text(name).to_string()),
                };
            }
        }

        result
    }

    /// Validate a receiver-less function's parameters and results.
    pub fn command_signature(
        &self,
        func: Node<'_>,
        context: &ContextImport,
    ) -> Result<SignatureShape, SignatureProblem> {
        let params = func
            .child_by_field_name("parameters")
            .map(|p| self.parameter_types(p))
            .unwrap_or_default();

        let uses_context = match params.as_slice() {
            [] => false,
            [single] if single.is_context(context) => true,
            [_] => return Err(SignatureProblem::NotContext),
            _ => return Err(SignatureProblem::TooManyParams),
        };

        let results = match func.child_by_field_name("result") {
            None => Vec::new(),
            Some(result) if result.kind() == "parameter_list" => self.parameter_types(result),
            Some(result) => vec![ParamType::from_node(result, &self.source, false)],
        };

        let returns_error = match results.as_slice() {
            [] => false,
            [single] if single.is_named("error") => true,
            _ => return Err(SignatureProblem::BadResults),
        };

        Ok(SignatureShape {
            uses_context,
            returns_error,
        })
    }

    /// One entry per declared parameter; `a, b int` yields two entries.
    fn parameter_types(&self, list: Node<'_>) -> Vec<ParamType> {
        let mut out = Vec::new();
        let mut cursor = list.walk();
        let decls: Vec<Node<'_>> = list.named_children(&mut cursor).collect();

        for decl in decls {
            let variadic = match decl.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => continue,
            };
            let Some(ty) = decl.child_by_field_name("type") else {
                continue;
            };
            let mut name_cursor = decl.walk();
            let names = decl
                .children_by_field_name("name", &mut name_cursor)
                .count()
                .max(1);
            let param = ParamType::from_node(ty, &self.source, variadic);
            out.extend(std::iter::repeat_n(param, names));
        }

        out
    }

    /// Name of the type a method is declared on, with pointers and type
    /// arguments stripped.
    pub fn receiver_type_name(&self, method: Node<'_>) -> Option<String> {
        let receiver = method.child_by_field_name("receiver")?;
        let mut cursor = receiver.walk();
        let decl = receiver
            .named_children(&mut cursor)
            .find(|n| n.kind() == "parameter_declaration")?;
        let ty = decl.child_by_field_name("type")?;
        Some(base_type_name(ty, &self.source))
    }

    /// For a method with no parameters and a single `string` result whose body
    /// is exactly `return "<literal>"`, the literal value.
    pub fn constant_string_method(&self, method: Node<'_>) -> Option<String> {
        let params = method
            .child_by_field_name("parameters")
            .map(|p| self.parameter_types(p))
            .unwrap_or_default();
        if !params.is_empty() {
            return None;
        }

        let results = match method.child_by_field_name("result") {
            None => return None,
            Some(result) if result.kind() == "parameter_list" => self.parameter_types(result),
            Some(result) => vec![ParamType::from_node(result, &self.source, false)],
        };
        if !matches!(results.as_slice(), [single] if single.is_named("string")) {
            return None;
        }

        let body = method.child_by_field_name("body")?;
        let statements = block_statements(body);
        let [statement] = statements.as_slice() else {
            return None;
        };
        if statement.kind() != "return_statement" {
            return None;
        }

        let mut cursor = statement.walk();
        let list = statement
            .named_children(&mut cursor)
            .find(|n| n.kind() == "expression_list")?;
        let mut list_cursor = list.walk();
        let values: Vec<Node<'_>> = list.named_children(&mut list_cursor).collect();
        let [value] = values.as_slice() else {
            return None;
        };
        string_literal_value(*value, &self.source)
    }
}

/// How a file imports the context package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextImport {
    /// `import "context"` or `import name "context"`.
    Named(String),
    /// `import . "context"`.
    Dot,
    /// Not imported, or imported as `_`.
    NotImported,
}

/// Shape of a valid command function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureShape {
    pub uses_context: bool,
    pub returns_error: bool,
}

/// Why a function cannot be invoked as a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureProblem {
    TooManyParams,
    NotContext,
    BadResults,
}

impl fmt::Display for SignatureProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureProblem::TooManyParams => write!(f, "must be niladic or accept context"),
            SignatureProblem::NotContext => write!(f, "must accept context.Context"),
            SignatureProblem::BadResults => write!(f, "must return only error"),
        }
    }
}

/// Parameter or result type reduced to what signature checks need.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ParamType {
    /// `pkg.Name`
    Qualified { package: String, name: String },
    /// A bare type identifier such as `error` or `Context`.
    Named(String),
    /// Pointers, slices, funcs, variadics and everything else.
    Other,
}

impl ParamType {
    fn from_node(node: Node<'_>, src: &str, variadic: bool) -> Self {
        if variadic {
            return ParamType::Other;
        }
        match node.kind() {
            "qualified_type" => {
                let package = node.child_by_field_name("package").map(|n| text(n, src));
                let name = node.child_by_field_name("name").map(|n| text(n, src));
                match (package, name) {
                    (Some(package), Some(name)) => ParamType::Qualified {
                        package: package.to_string(),
                        name: name.to_string(),
                    },
                    _ => ParamType::Other,
                }
            }
            "type_identifier" => ParamType::Named(text(node, src).to_string()),
            "parenthesized_type" => {
                let mut cursor = node.walk();
                let inner = node.named_children(&mut cursor).next();
                inner.map_or(ParamType::Other, |inner| Self::from_node(inner, src, false))
            }
            _ => ParamType::Other,
        }
    }

    fn is_named(&self, expected: &str) -> bool {
        matches!(self, ParamType::Named(name) if name == expected)
    }

    fn is_context(&self, import: &ContextImport) -> bool {
        match (self, import) {
            (ParamType::Qualified { package, name }, ContextImport::Named(alias)) => {
                package == alias && name == CONTEXT_TYPE
            }
            (ParamType::Named(name), ContextImport::Dot) => name == CONTEXT_TYPE,
            _ => false,
        }
    }
}

/// Source text of a node.
pub fn text<'s>(node: Node<'_>, src: &'s str) -> &'s str {
    src.get(node.byte_range()).unwrap_or("")
}

/// Go's export rule: the identifier starts with an uppercase letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Base name of a type expression: `*pkg.Foo[T]` becomes `pkg.Foo`,
/// `*Foo` becomes `Foo`.
pub fn base_type_name(node: Node<'_>, src: &str) -> String {
    match node.kind() {
        "pointer_type" | "parenthesized_type" => {
            let mut cursor = node.walk();
            let inner = node.named_children(&mut cursor).next();
            inner.map_or_else(
                || text(node, src).to_string(),
                |inner| base_type_name(inner, src),
            )
        }
        "generic_type" => node
            .child_by_field_name("type")
            .map_or_else(|| text(node, src).to_string(), |t| base_type_name(t, src)),
        _ => text(node, src).to_string(),
    }
}

/// Value of an interpreted or raw string literal node.
pub fn string_literal_value(node: Node<'_>, src: &str) -> Option<String> {
    let raw = text(node, src);
    match node.kind() {
        "interpreted_string_literal" => raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .map(crate::tag::unescape),
        "raw_string_literal" => raw
            .strip_prefix('`')
            .and_then(|s| s.strip_suffix('`'))
            .map(|s| s.replace('\r', "")),
        _ => None,
    }
}

/// Statements of a block, looking through the `statement_list` wrapper
/// newer grammars emit.
fn block_statements(block: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut cursor = block.walk();
    let children: Vec<Node<'_>> = block.named_children(&mut cursor).collect();

    for child in children {
        match child.kind() {
            "comment" => {}
            "statement_list" => out.extend(block_statements(child)),
            _ => out.push(child),
        }
    }

    out
}

fn descendants_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == kind {
            out.push(current);
            continue;
        }
        let mut cursor = current.walk();
        let children: Vec<Node<'t>> = current.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    if !root.has_error() {
        return None;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    Some(root)
}

/// Lines of one comment with markers removed.
fn comment_lines(comment: &str) -> Vec<String> {
    if let Some(line) = comment.strip_prefix("//") {
        if is_directive(line) {
            return Vec::new();
        }
        return vec![line.strip_prefix(' ').unwrap_or(line).trim_end().to_string()];
    }

    let body = comment
        .strip_prefix("/*")
        .and_then(|c| c.strip_suffix("*/"))
        .unwrap_or(comment);
    body.lines().map(|l| l.trim().to_string()).collect()
}

/// `//go:build`, `//gantry:skip` and friends: a lowercase word and a colon
/// with no space after the slashes.
fn is_directive(line: &str) -> bool {
    let Some((prefix, rest)) = line.split_once(':') else {
        return false;
    };
    !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && rest
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> GoFile {
        GoFile::parse(Path::new("test.go"), src.to_string()).unwrap()
    }

    fn find_func<'a>(file: &'a GoFile, name: &str) -> Node<'a> {
        file.declarations()
            .into_iter()
            .find(|d| {
                matches!(d.kind(), "function_declaration" | "method_declaration")
                    && d.child_by_field_name("name").map(|n| file.text(n)) == Some(name)
            })
            .unwrap()
    }

    #[test]
    fn test_package_name_and_doc() {
        let file = parse(
            "//go:build gantry\n\n// Package ops holds build tasks.\n// Second line.\npackage ops\n",
        );
        assert_eq!(file.package_name().as_deref(), Some("ops"));
        assert_eq!(
            file.package_doc().as_deref(),
            Some("Package ops holds build tasks.\nSecond line.")
        );
    }

    #[test]
    fn test_doc_requires_adjacency() {
        let file = parse(
            "package ops\n\n// Detached.\n\nfunc Build() {}\n\n// Attached.\nfunc Test() {}\n",
        );
        assert_eq!(file.doc_comment(find_func(&file, "Build")), None);
        assert_eq!(
            file.doc_comment(find_func(&file, "Test")).as_deref(),
            Some("Attached.")
        );
    }

    #[test]
    fn test_doc_block_comment() {
        let file = parse("package ops\n\n/*\n  Build compiles.\n*/\nfunc Build() {}\n");
        assert_eq!(
            file.doc_comment(find_func(&file, "Build")).as_deref(),
            Some("Build compiles.")
        );
    }

    #[test]
    fn test_parse_error_reports_position() {
        let err = GoFile::parse(Path::new("bad.go"), "package ops\n\nfunc {\n".to_string())
            .err()
            .unwrap();
        assert_matches!(err, DiscoverError::Parse { ref path, .. } if path == Path::new("bad.go"));
    }

    #[test]
    fn test_context_import_forms() {
        assert_eq!(
            parse("package a\nimport \"context\"\n").context_import(),
            ContextImport::Named("context".to_string())
        );
        assert_eq!(
            parse("package a\nimport (\n\t\"fmt\"\n\tctxpkg \"context\"\n)\n").context_import(),
            ContextImport::Named("ctxpkg".to_string())
        );
        assert_eq!(
            parse("package a\nimport . \"context\"\n").context_import(),
            ContextImport::Dot
        );
        assert_eq!(
            parse("package a\nimport _ \"context\"\n").context_import(),
            ContextImport::NotImported
        );
        assert_eq!(parse("package a\n").context_import(), ContextImport::NotImported);
    }

    #[test]
    fn test_command_signature_shapes() {
        let file = parse(
            "package a\n\nimport c \"context\"\n\n\
             func A() {}\n\
             func B(ctx c.Context) error { return nil }\n\
             func C() error { return nil }\n\
             func D(x, y int) {}\n\
             func E(n int) {}\n\
             func F() (int, error) { return 0, nil }\n\
             func G() (err error) { return }\n\
             func H(ctx context.Context) {}\n",
        );
        let import = file.context_import();
        let shape = |name: &str| file.command_signature(find_func(&file, name), &import);

        assert_eq!(
            shape("A"),
            Ok(SignatureShape {
                uses_context: false,
                returns_error: false
            })
        );
        assert_eq!(
            shape("B"),
            Ok(SignatureShape {
                uses_context: true,
                returns_error: true
            })
        );
        assert_eq!(
            shape("C"),
            Ok(SignatureShape {
                uses_context: false,
                returns_error: true
            })
        );
        assert_eq!(shape("D"), Err(SignatureProblem::TooManyParams));
        assert_eq!(shape("E"), Err(SignatureProblem::NotContext));
        assert_eq!(shape("F"), Err(SignatureProblem::BadResults));
        assert!(shape("G").is_ok());
        // `context` is renamed in this file, so the default name is not a context
        assert_eq!(shape("H"), Err(SignatureProblem::NotContext));
    }

    #[test]
    fn test_dot_imported_context() {
        let file = parse("package a\n\nimport . \"context\"\n\nfunc Run(ctx Context) {}\n");
        let shape = file
            .command_signature(find_func(&file, "Run"), &file.context_import())
            .unwrap();
        assert!(shape.uses_context);
    }

    #[test]
    fn test_receiver_and_constant_string() {
        let file = parse(
            "package a\n\n\
             func (c *Deploy) Description() string {\n\treturn \"  Ship it.  \"\n}\n\
             func (Deploy) Name() string { x := 1; _ = x; return \"n\" }\n\
             func (d Deploy) Other(n int) string { return \"x\" }\n",
        );
        let desc = find_func(&file, "Description");
        assert_eq!(file.receiver_type_name(desc).as_deref(), Some("Deploy"));
        assert_eq!(
            file.constant_string_method(desc).as_deref(),
            Some("  Ship it.  ")
        );
        assert_eq!(file.constant_string_method(find_func(&file, "Name")), None);
        assert_eq!(file.constant_string_method(find_func(&file, "Other")), None);
    }

    #[test]
    fn test_is_exported() {
        assert!(is_exported("Build"));
        assert!(!is_exported("build"));
        assert!(!is_exported("_Build"));
        assert!(!is_exported(""));
    }

    #[test]
    fn test_directive_detection() {
        assert!(is_directive("go:build gantry"));
        assert!(is_directive("gantry:skip"));
        assert!(!is_directive(" go:build gantry"));
        assert!(!is_directive(" Note: something"));
    }
}
