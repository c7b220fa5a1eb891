//! Query tokenizer.
//!
//! One compiled regex table, built on first use and shared by every query.
//! Tokens must tile the input exactly; the first gap is a parse error.

use domcypher_core::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        (?P<ws>\s+)
      | (?P<str>"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')
      | (?P<num>\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)
      | (?P<ident>[A-Za-z_][A-Za-z0-9_]*)
      | (?P<punct>\.\.|==|<>|<=|>=|[()\[\]{}:,.|*<>=\-])
    "#,
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    /// Quoted string; `text` holds the unescaped contents.
    Str,
    Number,
    Punct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the token start.
    pub offset: usize,
}

impl Token {
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == p
    }

    /// Case-insensitive keyword test.
    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind == TokenKind::Ident && self.text.eq_ignore_ascii_case(kw)
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    for caps in TOKEN_RE.captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() != pos {
            return Err(unexpected(input, pos));
        }
        pos = whole.end();

        let (kind, text) = if caps.name("ws").is_some() {
            continue;
        } else if caps.name("str").is_some() {
            (TokenKind::Str, unescape(whole.as_str()))
        } else if caps.name("num").is_some() {
            (TokenKind::Number, whole.as_str().to_string())
        } else if caps.name("ident").is_some() {
            (TokenKind::Ident, whole.as_str().to_string())
        } else {
            (TokenKind::Punct, whole.as_str().to_string())
        };
        tokens.push(Token {
            kind,
            text,
            offset: whole.start(),
        });
    }

    if pos != input.len() {
        return Err(unexpected(input, pos));
    }
    Ok(tokens)
}

fn unexpected(input: &str, pos: usize) -> ParseError {
    let found = input[pos..].chars().next().unwrap_or(' ');
    if found == '"' || found == '\'' {
        return ParseError::new("unterminated string", pos);
    }
    ParseError::new(format!("unexpected character {:?}", found), pos)
}

/// Strip the quotes and resolve backslash escapes.
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
