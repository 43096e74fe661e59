//! Struct field tag reader.
//!
//! Field annotations use the Go struct tag convention, a space separated list
//! of `key:"value"` pairs. Gantry reads the value stored under
//! [`ANNOTATION_KEY`] as a comma separated `key[=value]` list:
//!
//! ```text
//! Deploy DeployCmd `gantry:"subcommand,name=ship"`
//! Lint   LintCmd   `gantry:"subcommand=check"`
//! ```

/// Struct tag key holding gantry annotations.
pub const ANNOTATION_KEY: &str = "gantry";

/// Look up `key` in a struct tag, mirroring Go's `reflect.StructTag.Lookup`.
///
/// Returns `None` when the key is absent or the tag is malformed before the
/// key is reached.
pub fn lookup(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        // Key runs until ':' and may not contain spaces, quotes or control chars
        let key_end = rest
            .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\x7f')
            .unwrap_or(rest.len());
        if key_end == 0 || !rest[key_end..].starts_with(":\"") {
            return None;
        }
        let name = &rest[..key_end];
        rest = &rest[key_end + 2..];

        // Quoted value with backslash escapes
        let mut value_end = None;
        let mut escaped = false;
        for (i, c) in rest.char_indices() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                value_end = Some(i);
                break;
            }
        }
        let value_end = value_end?;
        let raw_value = &rest[..value_end];
        rest = &rest[value_end + 1..];

        if name == key {
            return Some(unescape(raw_value));
        }
    }
}

/// Decode the escapes Go allows in an interpreted string literal.
///
/// Unknown escapes are kept verbatim.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0c}'),
            Some('v') => out.push('\u{0b}'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

/// Subcommand settings read from one field annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldAnnotation {
    /// The field is a subcommand of its enclosing type.
    pub subcommand: bool,
    /// Explicit command name. The last `name=` or `subcommand=` wins.
    pub name: Option<String>,
}

impl FieldAnnotation {
    /// Parse the comma separated annotation value.
    pub fn parse(value: &str) -> Self {
        let mut annotation = Self::default();

        for item in value.split(',') {
            let item = item.trim();
            let (key, val) = match item.split_once('=') {
                Some((key, val)) => (key.trim(), Some(val.trim())),
                None => (item, None),
            };

            match (key, val) {
                ("subcommand", None) => annotation.subcommand = true,
                ("subcommand", Some(name)) => {
                    annotation.subcommand = true;
                    if !name.is_empty() {
                        annotation.name = Some(name.to_string());
                    }
                }
                ("name", Some(name)) if !name.is_empty() => {
                    annotation.name = Some(name.to_string());
                }
                _ => {}
            }
        }

        annotation
    }

    /// Read the annotation from a full struct tag, if the key is present.
    pub fn from_struct_tag(tag: &str) -> Option<Self> {
        lookup(tag, ANNOTATION_KEY).map(|value| Self::parse(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup() {
        let tag = r#"json:"deploy,omitempty" gantry:"subcommand""#;
        assert_eq!(lookup(tag, "gantry").as_deref(), Some("subcommand"));
        assert_eq!(lookup(tag, "json").as_deref(), Some("deploy,omitempty"));
        assert_eq!(lookup(tag, "yaml"), None);
    }

    #[test]
    fn test_lookup_escaped_quote() {
        let tag = r#"gantry:"name=say \"hi\"""#;
        assert_eq!(lookup(tag, "gantry").as_deref(), Some(r#"name=say "hi""#));
    }

    #[test]
    fn test_lookup_malformed() {
        assert_eq!(lookup("gantry:subcommand", "gantry"), None);
        assert_eq!(lookup(r#"gantry:"unterminated"#, "gantry"), None);
    }

    #[test]
    fn test_parse_plain_subcommand() {
        let annotation = FieldAnnotation::parse("subcommand");
        assert!(annotation.subcommand);
        assert_eq!(annotation.name, None);
    }

    #[test]
    fn test_parse_overrides_last_wins() {
        let annotation = FieldAnnotation::parse("subcommand=first,name=second");
        assert_eq!(annotation.name.as_deref(), Some("second"));

        let annotation = FieldAnnotation::parse("name=first, subcommand=second");
        assert_eq!(annotation.name.as_deref(), Some("second"));
        assert!(annotation.subcommand);
    }

    #[test]
    fn test_name_without_subcommand() {
        let annotation = FieldAnnotation::parse("name=flag-name,required");
        assert!(!annotation.subcommand);
        assert_eq!(annotation.name.as_deref(), Some("flag-name"));
    }

    #[test]
    fn test_from_struct_tag() {
        let annotation = FieldAnnotation::from_struct_tag(r#"gantry:"subcommand,name=ship""#);
        assert_eq!(
            annotation,
            Some(FieldAnnotation {
                subcommand: true,
                name: Some("ship".to_string()),
            })
        );
        assert_eq!(FieldAnnotation::from_struct_tag(r#"json:"x""#), None);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\tb\nc"), "a\tb\nc");
        assert_eq!(unescape(r"keep \q"), r"keep \q");
    }
}
