//! Go source rendering for wrapper types.

use std::fmt::Write;

use gantry_discover::WRAPPER_SUFFIX;
use gantry_discover::syntax::CONTEXT_PACKAGE;

use crate::scan::WrappedFunction;

/// Marker recognized by Go tooling as generated code.
pub const GENERATED_MARKER: &str = "// Code generated by gantry. DO NOT EDIT.";

/// Name of the wrapper type for `function`.
pub fn wrapper_type_name(function: &str) -> String {
    format!("{function}{WRAPPER_SUFFIX}")
}

/// Render the whole generated compilation unit.
pub fn render_unit(
    package: &str,
    build_tag: Option<&str>,
    functions: &[&WrappedFunction],
) -> String {
    let mut out = String::new();

    if let Some(tag) = build_tag {
        let _ = writeln!(out, "//go:build {tag}\n");
    }
    let _ = writeln!(out, "{GENERATED_MARKER}\n");
    let _ = writeln!(out, "package {package}\n");
    if functions.iter().any(|f| f.uses_context) {
        let _ = writeln!(out, "import \"{CONTEXT_PACKAGE}\"\n");
    }

    for function in functions {
        render_wrapper(&mut out, function);
    }

    out
}

fn render_wrapper(out: &mut String, function: &WrappedFunction) {
    let name = &function.name;
    let ty = wrapper_type_name(name);

    let _ = writeln!(out, "// {ty} runs {name} as a command.");
    let _ = writeln!(out, "type {ty} struct{{}}\n");

    let params = if function.uses_context {
        "ctx context.Context"
    } else {
        ""
    };
    let args = if function.uses_context { "ctx" } else { "" };
    if function.returns_error {
        let _ = writeln!(out, "func ({ty}) Run({params}) error {{");
        let _ = writeln!(out, "\treturn {name}({args})");
    } else {
        let _ = writeln!(out, "func ({ty}) Run({params}) {{");
        let _ = writeln!(out, "\t{name}({args})");
    }
    let _ = writeln!(out, "}}\n");

    let _ = writeln!(out, "func ({ty}) Name() string {{");
    let _ = writeln!(out, "\treturn {}", go_quote(name));
    let _ = writeln!(out, "}}\n");

    if let Some(description) = &function.description {
        let _ = writeln!(out, "func ({ty}) Description() string {{");
        let _ = writeln!(out, "\treturn {}", go_quote(description));
        let _ = writeln!(out, "}}\n");
    }
}

/// Quote `text` as a Go interpreted string literal.
pub fn go_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
