//! Identifier to command-name normalization.

/// Convert a Go identifier to its kebab-case command name.
///
/// A hyphen goes before an uppercase letter when the previous character is
/// lowercase, or when the next character is lowercase. The second rule lets
/// an acronym hand its last letter to the following word, so `APIServer`
/// becomes `api-server`.
pub fn to_kebab_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || next_is_lower {
                out.push('-');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}
