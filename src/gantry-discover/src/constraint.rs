//! Build-constraint evaluation.
//!
//! A file opts into a tag with a `//go:build` directive in its leading comment
//! block. The directive holds a boolean expression over tag atoms:
//!
//! ```text
//! //go:build gantry && !windows
//! ```
//!
//! Evaluation treats exactly one atom (the target tag) as true.

use std::fmt;

/// Directive prefix that introduces a build constraint.
pub const BUILD_DIRECTIVE: &str = "//go:build";

/// Errors produced while parsing a constraint expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintError {
    #[error("empty build expression")]
    Empty,

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unexpected token '{token}'")]
    UnexpectedToken { token: String },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("missing closing parenthesis")]
    UnclosedParen,
}

/// Parsed build-constraint expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildExpr {
    Tag(String),
    Not(Box<BuildExpr>),
    And(Box<BuildExpr>, Box<BuildExpr>),
    Or(Box<BuildExpr>, Box<BuildExpr>),
}

impl BuildExpr {
    /// Evaluate the expression, asking `is_set` for the value of each atom.
    pub fn eval(&self, is_set: &dyn Fn(&str) -> bool) -> bool {
        match self {
            BuildExpr::Tag(tag) => is_set(tag),
            BuildExpr::Not(inner) => !inner.eval(is_set),
            BuildExpr::And(lhs, rhs) => lhs.eval(is_set) && rhs.eval(is_set),
            BuildExpr::Or(lhs, rhs) => lhs.eval(is_set) || rhs.eval(is_set),
        }
    }
}

impl fmt::Display for BuildExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildExpr::Tag(tag) => write!(f, "{tag}"),
            BuildExpr::Not(inner) => write!(f, "!{inner}"),
            BuildExpr::And(lhs, rhs) => write!(f, "({lhs} && {rhs})"),
            BuildExpr::Or(lhs, rhs) => write!(f, "({lhs} || {rhs})"),
        }
    }
}

/// Returns true when `content` carries a build constraint satisfied by `tag`.
///
/// Files without a directive never match. When the expression fails to
/// parse, the trimmed expression text must equal the tag exactly.
pub fn matches_build_tag(content: &str, tag: &str) -> bool {
    let Some(expr) = find_build_directive(content) else {
        return false;
    };

    match parse_build_expr(expr) {
        Ok(parsed) => parsed.eval(&|atom| atom == tag),
        Err(_) => expr.trim() == tag,
    }
}

/// Locate the `//go:build` expression in the leading comment block.
///
/// Scanning stops at the first line that is neither blank nor a comment.
pub fn find_build_directive(content: &str) -> Option<&str> {
    let mut in_block = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if in_block {
            if let Some(end) = trimmed.find("*/") {
                if !trimmed[end + 2..].trim().is_empty() {
                    return None;
                }
                in_block = false;
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix(BUILD_DIRECTIVE) {
            // `//go:buildfoo` is not a directive
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Some(rest.trim());
            }
            continue;
        }
        if trimmed.starts_with("//") {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("/*") {
            match rest.find("*/") {
                // Code after a closed block comment ends the header
                Some(end) if !rest[end + 2..].trim().is_empty() => return None,
                Some(_) => {}
                None => in_block = true,
            }
            continue;
        }
        return None;
    }

    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Tag(String),
    Not,
    And,
    Or,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Tag(tag) => write!(f, "{tag}"),
            Token::Not => write!(f, "!"),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn tokenize(input: &str) -> Result<Vec<Token>, ConstraintError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '!' => tokens.push(Token::Not),
            '&' | '|' => {
                if chars.next_if(|&(_, next)| next == c).is_none() {
                    return Err(ConstraintError::UnexpectedChar { ch: c, offset });
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            c if is_tag_char(c) => {
                let mut tag = String::from(c);
                while let Some((_, next)) = chars.next_if(|&(_, next)| is_tag_char(next)) {
                    tag.push(next);
                }
                tokens.push(Token::Tag(tag));
            }
            _ => return Err(ConstraintError::UnexpectedChar { ch: c, offset }),
        }
    }

    Ok(tokens)
}

/// Parse a build expression with the usual precedence: `!` binds tightest,
/// then `&&`, then `||`.
pub fn parse_build_expr(input: &str) -> Result<BuildExpr, ConstraintError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ConstraintError::Empty);
    }

    let mut parser = ExprParser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ConstraintError::UnexpectedToken {
            token: token.to_string(),
        }),
    }
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<BuildExpr, ConstraintError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = BuildExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<BuildExpr, ConstraintError> {
        let mut lhs = self.parse_not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.parse_not()?;
            lhs = BuildExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<BuildExpr, ConstraintError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let inner = self.parse_not()?;
            return Ok(BuildExpr::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<BuildExpr, ConstraintError> {
        match self.next() {
            Some(Token::Tag(tag)) => Ok(BuildExpr::Tag(tag)),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(token) => Err(ConstraintError::UnexpectedToken {
                        token: token.to_string(),
                    }),
                    None => Err(ConstraintError::UnclosedParen),
                }
            }
            Some(token) => Err(ConstraintError::UnexpectedToken {
                token: token.to_string(),
            }),
            None => Err(ConstraintError::UnexpectedEnd),
        }
    }
}
