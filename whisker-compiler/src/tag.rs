use std::sync::LazyLock;

use regex::Regex;

use whisker_html::{Arg, ArgValue, ParseError, Path, Scanner, StacheTag};

use crate::tokens::{identifier_name, number_value, peek_js_token, JsToken, JsTokenKind};

/// A parsed stache tag plus the input span it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedTag {
    pub tag: StacheTag,
    pub char_pos: usize,
    pub char_length: usize,
}

/// Parse exactly one stache tag starting at byte position `pos` of `input`.
///
/// On success the scanned span is `[char_pos, char_pos + char_length)`; on
/// failure the error is located at the offending position.
pub fn parse_stache_tag(
    input: &str,
    pos: usize,
    source_name: Option<&str>,
) -> Result<ScannedTag, ParseError> {
    let mut scanner = Scanner::with_source_name(input, source_name);
    scanner.pos = pos;
    let tag = scan_tag(&mut scanner)?;
    Ok(ScannedTag {
        tag,
        char_pos: pos,
        char_length: scanner.pos - pos,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opening {
    Else,
    Double,
    Triple,
    Comment,
    Inclusion,
    BlockOpen,
    BlockClose,
}

static ELSE_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{\{\s*else").unwrap());
static DOUBLE_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{\{\s*").unwrap());
static TRIPLE_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{\{\{\s*").unwrap());
static COMMENT_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{\{\s*!").unwrap());
static INCLUSION_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{\{\s*>\s*").unwrap());
static BLOCK_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{\{\s*#\s*").unwrap());
static BLOCK_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{\{\s*/\s*").unwrap());

static COMMENT_BODY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?s).*?\}\}").unwrap());
static DOUBLE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\}\}").unwrap());
static TRIPLE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\}\}\}").unwrap());
static CLOSE_AFTER_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\}\}").unwrap());

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s+").unwrap());
static DOTS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[./]+").unwrap());
static SEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[./]").unwrap());
static BRACKET_BODY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?s).*?\]").unwrap());
static KWARG_EQ_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*=").unwrap());
static EQ_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*=\s*").unwrap());

fn expected(scanner: &Scanner, what: &str) -> ParseError {
    scanner.fatal(format!("Expected {}", what))
}

/// Sigil characters forbidden by the opening patterns' lookahead.
fn is_sigil(c: char) -> bool {
    matches!(c, '{' | '>' | '!' | '#' | '/')
}

/// Match the opening pattern, in priority order. `{{else` must be tried
/// before the plain double form or it would parse as a path.
fn match_opening(scanner: &mut Scanner) -> Option<Opening> {
    let start = scanner.pos;

    if scanner.take_re(&ELSE_OPEN_RE).is_some() {
        if scanner.peek().is_some_and(|c| c.is_whitespace() || c == '}') {
            return Some(Opening::Else);
        }
        scanner.pos = start;
    }
    if scanner.take_re(&DOUBLE_OPEN_RE).is_some() {
        if !scanner.peek().is_some_and(is_sigil) {
            return Some(Opening::Double);
        }
        scanner.pos = start;
    }
    if scanner.take_re(&TRIPLE_OPEN_RE).is_some() {
        if !scanner.peek().is_some_and(is_sigil) {
            return Some(Opening::Triple);
        }
        scanner.pos = start;
    }
    if scanner.take_re(&COMMENT_OPEN_RE).is_some() {
        return Some(Opening::Comment);
    }
    if scanner.take_re(&INCLUSION_OPEN_RE).is_some() {
        if !scanner.peek().is_some_and(is_sigil) {
            return Some(Opening::Inclusion);
        }
        scanner.pos = start;
    }
    if scanner.take_re(&BLOCK_OPEN_RE).is_some() {
        if !scanner.peek().is_some_and(is_sigil) {
            return Some(Opening::BlockOpen);
        }
        scanner.pos = start;
    }
    if scanner.take_re(&BLOCK_CLOSE_RE).is_some() {
        if !scanner.peek().is_some_and(is_sigil) {
            return Some(Opening::BlockClose);
        }
        scanner.pos = start;
    }
    None
}

fn scan_tag(scanner: &mut Scanner) -> Result<StacheTag, ParseError> {
    let Some(opening) = match_opening(scanner) else {
        return Err(scanner.fatal("Unknown stache tag"));
    };

    match opening {
        Opening::Comment => match scanner.take_re(&COMMENT_BODY_RE) {
            Some(body) => Ok(StacheTag::Comment(body[..body.len() - 2].to_string())),
            None => Err(scanner.fatal("Unclosed comment")),
        },
        Opening::Else => {
            if scanner.take_re(&CLOSE_AFTER_WS_RE).is_none() {
                return Err(expected(scanner, "}}"));
            }
            Ok(StacheTag::Else)
        }
        Opening::BlockClose => {
            let path = scan_path(scanner)?;
            if scanner.take_re(&CLOSE_AFTER_WS_RE).is_none() {
                return Err(expected(scanner, "}}"));
            }
            Ok(StacheTag::BlockClose { path })
        }
        Opening::Double | Opening::Triple | Opening::Inclusion | Opening::BlockOpen => {
            let triple = opening == Opening::Triple;
            let path = scan_path(scanner)?;
            let args = scan_args(scanner, triple)?;
            match opening {
                Opening::Double => Ok(StacheTag::Double { path, args }),
                Opening::Triple => Ok(StacheTag::Triple { path, args }),
                Opening::Inclusion => {
                    let positional = args.iter().filter(|a| a.is_positional()).count();
                    if positional > 1 {
                        return Err(
                            scanner.fatal("Only one positional argument is allowed here")
                        );
                    }
                    Ok(StacheTag::Inclusion { path, args })
                }
                Opening::BlockOpen => Ok(StacheTag::BlockOpen {
                    path,
                    args,
                    content: Vec::new(),
                    else_content: None,
                }),
                _ => unreachable!(),
            }
        }
    }
}

/// Scan arguments up to and including the close marker.
///
/// Each argument must be preceded by whitespace; a lone `}` where the close
/// marker is required is its own error.
fn scan_args(scanner: &mut Scanner, triple: bool) -> Result<Vec<Arg>, ParseError> {
    let mut args = Vec::new();
    loop {
        let had_ws = scanner.take_re(&WS_RE).is_some();
        let end_re = if triple { &TRIPLE_END_RE } else { &DOUBLE_END_RE };
        if scanner.take_re(end_re).is_some() {
            return Ok(args);
        }
        if scanner.peek() == Some('}') {
            return Err(expected(scanner, if triple { "}}}" } else { "}}" }));
        }
        if !had_ws {
            return Err(expected(scanner, "space"));
        }
        args.push(scan_arg(scanner, true)?);
    }
}

fn scan_path(scanner: &mut Scanner) -> Result<Path, ParseError> {
    let mut segments: Vec<String> = Vec::new();

    // leading `.`, `..`, `./`, `../..` etc; the whole run folds into one
    // ancestor segment of `.` plus one dot per `..`
    if let Some(dots) = scanner.take_re(&DOTS_RE) {
        let ends_with_slash = dots.ends_with('/');
        let run = if ends_with_slash {
            &dots[..dots.len() - 1]
        } else {
            dots
        };
        let mut ancestor = String::from(".");
        for (i, clause) in run.split('/').enumerate() {
            if i == 0 {
                if clause != "." && clause != ".." {
                    return Err(expected(scanner, "`.`, `..`, `./` or `../`"));
                }
            } else if clause != ".." {
                return Err(expected(scanner, "`..` or `../`"));
            }
            if clause == ".." {
                ancestor.push('.');
            }
        }
        segments.push(ancestor);
        if !ends_with_slash {
            return Ok(segments);
        }
    }

    loop {
        if scanner.take_prefix("[") {
            let Some(body) = scanner.take_re(&BRACKET_BODY_RE) else {
                return Err(scanner.fatal("Unterminated path segment"));
            };
            let segment = &body[..body.len() - 1];
            if segment.is_empty() && segments.is_empty() {
                return Err(scanner.fatal("Path can't start with empty string"));
            }
            segments.push(segment.to_string());
        } else {
            let id = scan_identifier(scanner, segments.is_empty())?;
            if id == "this" {
                if segments.is_empty() {
                    segments.push(".".to_string());
                } else {
                    return Err(expected(scanner, "identifier"));
                }
            } else {
                segments.push(id);
            }
        }
        if scanner.take_re(&SEP_RE).is_none() {
            break;
        }
    }
    Ok(segments)
}

/// Identifiers and keywords are both legal path segments, but the literals
/// `null`, `true`, `false` may not start a path.
fn scan_identifier(scanner: &mut Scanner, is_first: bool) -> Result<String, ParseError> {
    let Some(name) = identifier_name(scanner.rest()) else {
        return Err(expected(scanner, "identifier"));
    };
    if is_first && matches!(name, "null" | "true" | "false") {
        return Err(
            scanner.fatal("Can't use null, true, or false, as an identifier at start of path")
        );
    }
    let name = name.to_string();
    scanner.advance(name.len());
    Ok(name)
}

fn scan_arg(scanner: &mut Scanner, allow_keyword: bool) -> Result<Arg, ParseError> {
    let rest = scanner.rest();
    let token = peek_js_token(scanner)?;

    // `.`- and `[`-led arguments are paths unless they tokenize as a number
    if (rest.starts_with('.') || rest.starts_with('['))
        && !matches!(
            token,
            Some(JsToken {
                kind: JsTokenKind::Number,
                ..
            })
        )
    {
        return Ok(Arg::positional(ArgValue::Path(scan_path(scanner)?)));
    }

    let Some(token) = token else {
        return Err(expected(
            scanner,
            "identifier, number, string, boolean, or null",
        ));
    };

    match token.kind {
        JsTokenKind::Punctuation if token.text == "-" => {
            scanner.advance(1);
            match peek_js_token(scanner)? {
                Some(JsToken {
                    kind: JsTokenKind::Number,
                    text,
                }) => {
                    scanner.advance(text.len());
                    Ok(Arg::positional(ArgValue::Number(-number_value(&text))))
                }
                _ => Err(expected(scanner, "number")),
            }
        }
        JsTokenKind::Number => {
            scanner.advance(token.text.len());
            Ok(Arg::positional(ArgValue::Number(number_value(&token.text))))
        }
        JsTokenKind::Str => {
            scanner.advance(token.text.len());
            let decoded = decode_string_literal(scanner, &token.text)?;
            Ok(Arg::positional(ArgValue::Str(decoded)))
        }
        JsTokenKind::Boolean => {
            scanner.advance(token.text.len());
            Ok(Arg::positional(ArgValue::Bool(token.text == "true")))
        }
        JsTokenKind::Null => {
            scanner.advance(token.text.len());
            Ok(Arg::positional(ArgValue::Null))
        }
        JsTokenKind::Identifier | JsTokenKind::Keyword => {
            let after_name = &scanner.rest()[token.text.len()..];
            if allow_keyword && KWARG_EQ_RE.is_match(after_name) {
                scanner.advance(token.text.len());
                scanner.take_re(&EQ_WS_RE);
                let value = scan_arg(scanner, false)?;
                Ok(Arg::keyword(token.text, value.value))
            } else {
                Ok(Arg::positional(ArgValue::Path(scan_path(scanner)?)))
            }
        }
        JsTokenKind::Punctuation => Err(expected(
            scanner,
            "identifier, number, string, boolean, or null",
        )),
    }
}

/// Decode a string-literal token.
///
/// A single-quoted form has its delimiters swapped to double quotes, the
/// line-continuation characters are mapped to the letter `n`, and the result
/// is parsed as a JSON string. (The `n` mapping reproduces long-standing
/// behavior; it drops information for raw newlines.)
fn decode_string_literal(scanner: &Scanner, raw: &str) -> Result<String, ParseError> {
    let mut text = raw.to_string();
    if text.starts_with('\'') {
        text.replace_range(..1, "\"");
        let last = text.len() - 1;
        text.replace_range(last.., "\"");
    }
    let cleaned: String = text
        .chars()
        .map(|c| match c {
            '\r' | '\n' | '\u{2028}' | '\u{2029}' => 'n',
            other => other,
        })
        .collect();
    serde_json::from_str(&cleaned).map_err(|_| scanner.fatal("Invalid string literal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &str) -> StacheTag {
        parse_stache_tag(input, 0, None).unwrap().tag
    }

    #[test]
    fn else_wins_over_double() {
        assert_eq!(scan("{{else}}"), StacheTag::Else);
        assert_eq!(scan("{{ else }}"), StacheTag::Else);
        // `elsewhere` is an ordinary path
        assert!(matches!(
            scan("{{elsewhere}}"),
            StacheTag::Double { ref path, .. } if path == &vec!["elsewhere".to_string()]
        ));
    }

    #[test]
    fn triple_needs_three_braces_to_close() {
        assert!(matches!(scan("{{{html}}}"), StacheTag::Triple { .. }));
        let err = parse_stache_tag("{{{html}}", 0, None).unwrap_err();
        assert_eq!(err.message, "Expected }}}");
    }

    #[test]
    fn unknown_opening_is_rejected() {
        let err = parse_stache_tag("{{#>x}}", 0, None).unwrap_err();
        assert_eq!(err.message, "Unknown stache tag");
    }

    #[test]
    fn string_decoding_swaps_single_quotes() {
        match scan("{{foo 'a b'}}") {
            StacheTag::Double { args, .. } => {
                assert_eq!(args[0].value, ArgValue::Str("a b".into()));
            }
            other => panic!("unexpected tag {:?}", other),
        }
    }
}
