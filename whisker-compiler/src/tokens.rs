use std::sync::LazyLock;

use regex::Regex;

use whisker_html::{ParseError, Scanner};

/// Classification of a JavaScript-style token in argument position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsTokenKind {
    Identifier,
    Keyword,
    Boolean,
    Null,
    Number,
    Str,
    Punctuation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsToken {
    pub kind: JsTokenKind,
    /// Raw source text, including quotes for strings.
    pub text: String,
}

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z$_][a-zA-Z0-9$_]*").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:0[xX][0-9a-fA-F]+|[0-9]+\.?[0-9]*(?:[eE][+-]?[0-9]+)?|\.[0-9]+(?:[eE][+-]?[0-9]+)?)")
        .unwrap()
});

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "catch",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "else",
    "finally",
    "for",
    "function",
    "if",
    "in",
    "instanceof",
    "new",
    "return",
    "switch",
    "this",
    "throw",
    "try",
    "typeof",
    "var",
    "void",
    "while",
    "with",
];

const PUNCTUATION: &[char] = &[
    '-', '+', '*', '/', '%', '=', '<', '>', '!', '&', '|', '^', '~', '?', ':', ',', ';', '(', ')',
    '{', '}', '[', ']', '.',
];

/// Match an identifier name (identifier or keyword) at the start of `input`.
pub fn identifier_name(input: &str) -> Option<&str> {
    IDENTIFIER_RE.find(input).map(|m| m.as_str())
}

/// Classify the token at the scanner position without consuming it.
///
/// Returns `Ok(None)` when nothing token-like starts here. Unterminated
/// string literals are a hard error.
pub fn peek_js_token(scanner: &Scanner) -> Result<Option<JsToken>, ParseError> {
    let rest = scanner.rest();
    let Some(first) = rest.chars().next() else {
        return Ok(None);
    };

    if first == '"' || first == '\'' {
        let len = string_token_len(rest, first)
            .ok_or_else(|| scanner.fatal("Unterminated string literal"))?;
        return Ok(Some(JsToken {
            kind: JsTokenKind::Str,
            text: rest[..len].to_string(),
        }));
    }

    if let Some(m) = NUMBER_RE.find(rest) {
        return Ok(Some(JsToken {
            kind: JsTokenKind::Number,
            text: m.as_str().to_string(),
        }));
    }

    if let Some(name) = identifier_name(rest) {
        let kind = match name {
            "true" | "false" => JsTokenKind::Boolean,
            "null" => JsTokenKind::Null,
            _ if KEYWORDS.contains(&name) => JsTokenKind::Keyword,
            _ => JsTokenKind::Identifier,
        };
        return Ok(Some(JsToken {
            kind,
            text: name.to_string(),
        }));
    }

    if PUNCTUATION.contains(&first) {
        return Ok(Some(JsToken {
            kind: JsTokenKind::Punctuation,
            text: first.to_string(),
        }));
    }

    Ok(None)
}

/// Byte length of a quoted string token, or `None` if unterminated.
fn string_token_len(input: &str, quote: char) -> Option<usize> {
    let mut chars = input.char_indices();
    chars.next(); // opening quote
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            c if c == quote => return Some(i + c.len_utf8()),
            _ => {}
        }
    }
    None
}

/// Numeric value of a number token.
pub fn number_value(text: &str) -> f64 {
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    text.parse().unwrap_or(f64::NAN)
}
