use std::sync::LazyLock;

use regex::Regex;

use crate::charref::parse_char_ref;
use crate::error::ParseError;
use crate::scanner::Scanner;
use crate::tohtml::is_void_element;
use crate::tree::{Attrs, Node, Tag, SPECIALS_KEY};

/// How character data is tokenized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    Data,
    /// Inside `<textarea>` or `<title>`: character references but no tags.
    Rcdata,
}

/// Where in the markup a template-tag callback is being consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPosition {
    Element,
    InStartTag,
    InAttribute,
    InRcdata,
}

/// Callback that recognizes template tags at the scanner position.
///
/// It peeks first; returning `Ok(None)` without advancing means "not mine".
/// It may also consume input and still return `Ok(None)` (comments).
pub type SpecialHook<'h> =
    dyn Fn(&mut Scanner, TagPosition, TextMode) -> Result<Option<Node>, ParseError> + 'h;

/// Predicate that stops content parsing before the current position.
pub type StopHook<'h> = dyn Fn(&Scanner) -> bool + 'h;

pub struct FragmentOptions<'x> {
    pub text_mode: TextMode,
    pub should_stop: Option<&'x StopHook<'x>>,
    pub special: Option<&'x SpecialHook<'x>>,
}

impl Default for FragmentOptions<'_> {
    fn default() -> Self {
        FragmentOptions {
            text_mode: TextMode::Data,
            should_stop: None,
            special: None,
        }
    }
}

static TAG_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9-]*").unwrap());
static ATTR_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[^\s=/"'<>{}]+"#).unwrap());
static OPEN_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<[a-zA-Z]").unwrap());

/// Parse a run of HTML content items at the scanner position.
pub fn parse_fragment(
    scanner: &mut Scanner,
    opts: &FragmentOptions,
) -> Result<Vec<Node>, ParseError> {
    match opts.text_mode {
        TextMode::Data => parse_content(scanner, opts, None),
        TextMode::Rcdata => parse_rcdata(scanner, opts, None),
    }
}

fn is_rcdata_element(name: &str) -> bool {
    name.eq_ignore_ascii_case("textarea") || name.eq_ignore_ascii_case("title")
}

fn parse_content(
    scanner: &mut Scanner,
    opts: &FragmentOptions,
    enclosing: Option<&str>,
) -> Result<Vec<Node>, ParseError> {
    let mut items: Vec<Node> = Vec::new();
    loop {
        if let Some(stop) = opts.should_stop {
            if stop(scanner) {
                match enclosing {
                    Some(name) => {
                        return Err(scanner.fatal(format!("Expected closing tag </{}>", name)))
                    }
                    None => return Ok(items),
                }
            }
        }
        if scanner.is_eof() {
            match enclosing {
                Some(name) => {
                    return Err(scanner.fatal(format!("Expected closing tag </{}>", name)))
                }
                None => return Ok(items),
            }
        }

        if let Some(hook) = opts.special {
            let before = scanner.pos;
            if let Some(node) = hook(scanner, TagPosition::Element, TextMode::Data)? {
                items.push(node);
                continue;
            }
            if scanner.pos != before {
                continue;
            }
        }

        let rest = scanner.rest();
        if rest.starts_with("<!--") {
            items.push(parse_comment(scanner)?);
            continue;
        }
        if rest.starts_with("</") {
            match enclosing {
                Some(name) => {
                    if let Some(len) = close_tag_len(scanner, name) {
                        scanner.advance(len);
                        return Ok(items);
                    }
                    return Err(scanner.fatal(format!("Expected closing tag </{}>", name)));
                }
                None => return Err(scanner.fatal("Unexpected HTML close tag")),
            }
        }
        if rest.starts_with("<!") {
            return Err(scanner.fatal("Unexpected <!"));
        }
        if OPEN_TAG_RE.is_match(rest) {
            let element = parse_element(scanner, opts)?;
            items.push(element);
            continue;
        }
        if rest.starts_with('&') {
            if let Some(c) = parse_char_ref(scanner) {
                items.push(Node::CharRef(c));
                continue;
            }
        }

        let stop_braces = opts.special.is_some() || opts.should_stop.is_some();
        let text = take_content_text(scanner, stop_braces);
        push_text(&mut items, text);
    }
}

fn parse_rcdata(
    scanner: &mut Scanner,
    opts: &FragmentOptions,
    enclosing: Option<&str>,
) -> Result<Vec<Node>, ParseError> {
    let mut items: Vec<Node> = Vec::new();
    loop {
        if let Some(stop) = opts.should_stop {
            if stop(scanner) {
                match enclosing {
                    Some(name) => {
                        return Err(scanner.fatal(format!("Expected closing tag </{}>", name)))
                    }
                    None => return Ok(items),
                }
            }
        }
        if scanner.is_eof() {
            match enclosing {
                Some(name) => {
                    return Err(scanner.fatal(format!("Expected closing tag </{}>", name)))
                }
                None => return Ok(items),
            }
        }
        if let Some(name) = enclosing {
            if let Some(len) = close_tag_len(scanner, name) {
                scanner.advance(len);
                return Ok(items);
            }
        }

        if let Some(hook) = opts.special {
            let before = scanner.pos;
            if let Some(node) = hook(scanner, TagPosition::InRcdata, TextMode::Rcdata)? {
                items.push(node);
                continue;
            }
            if scanner.pos != before {
                continue;
            }
        }

        if scanner.rest().starts_with('&') {
            if let Some(c) = parse_char_ref(scanner) {
                items.push(Node::CharRef(c));
                continue;
            }
        }

        let stop_braces = opts.special.is_some() || opts.should_stop.is_some();
        let text = take_rcdata_text(scanner, stop_braces);
        push_text(&mut items, text);
    }
}

fn parse_comment(scanner: &mut Scanner) -> Result<Node, ParseError> {
    scanner.advance("<!--".len());
    let rest = scanner.rest();
    match rest.find("-->") {
        Some(idx) => {
            let text = rest[..idx].to_string();
            scanner.advance(idx + "-->".len());
            Ok(Node::Comment(text))
        }
        None => Err(scanner.fatal("Unclosed HTML comment")),
    }
}

fn parse_element(scanner: &mut Scanner, opts: &FragmentOptions) -> Result<Node, ParseError> {
    scanner.advance(1); // consume `<`
    let name = match scanner.take_re(&TAG_NAME_RE) {
        Some(n) => n.to_string(),
        None => return Err(scanner.fatal("Expected tag name")),
    };

    let mut attrs = Attrs::new();
    let mut specials: Vec<Node> = Vec::new();
    let mut self_closing = false;

    loop {
        skip_whitespace(scanner);
        if scanner.is_eof() {
            return Err(scanner.fatal(format!("Unclosed <{}> tag", name)));
        }
        if scanner.take_prefix("/>") {
            self_closing = true;
            break;
        }
        if scanner.take_prefix(">") {
            break;
        }

        if let Some(hook) = opts.special {
            let before = scanner.pos;
            if let Some(node) = hook(scanner, TagPosition::InStartTag, opts.text_mode)? {
                specials.push(node);
                continue;
            }
            if scanner.pos != before {
                continue;
            }
        }

        let attr_name = match scanner.take_re(&ATTR_NAME_RE) {
            Some(n) => n.to_string(),
            None => return Err(scanner.fatal("Expected attribute name")),
        };
        skip_whitespace(scanner);
        let value = if scanner.take_prefix("=") {
            skip_whitespace(scanner);
            parse_attr_value(scanner, opts)?
        } else {
            Node::Text(String::new())
        };
        attrs.set(attr_name, value);
    }

    if !specials.is_empty() {
        attrs.set(SPECIALS_KEY, Node::Seq(specials));
    }

    let children = if is_void_element(&name) || self_closing {
        Vec::new()
    } else if is_rcdata_element(&name) {
        let child_opts = FragmentOptions {
            text_mode: TextMode::Rcdata,
            should_stop: opts.should_stop,
            special: opts.special,
        };
        parse_rcdata(scanner, &child_opts, Some(&name))?
    } else {
        parse_content(scanner, opts, Some(&name))?
    };

    Ok(Node::Tag(Tag {
        name,
        attrs,
        children,
    }))
}

fn parse_attr_value(scanner: &mut Scanner, opts: &FragmentOptions) -> Result<Node, ParseError> {
    if scanner.take_prefix("\"") {
        parse_quoted_value(scanner, opts, '"')
    } else if scanner.take_prefix("'") {
        parse_quoted_value(scanner, opts, '\'')
    } else {
        parse_unquoted_value(scanner, opts)
    }
}

fn parse_quoted_value(
    scanner: &mut Scanner,
    opts: &FragmentOptions,
    quote: char,
) -> Result<Node, ParseError> {
    let mut parts: Vec<Node> = Vec::new();
    loop {
        match scanner.peek() {
            None => return Err(scanner.fatal("Unclosed attribute value")),
            Some(c) if c == quote => {
                scanner.advance(1);
                break;
            }
            _ => {}
        }

        if let Some(hook) = opts.special {
            let before = scanner.pos;
            if let Some(node) = hook(scanner, TagPosition::InAttribute, opts.text_mode)? {
                parts.push(node);
                continue;
            }
            if scanner.pos != before {
                continue;
            }
        }

        if scanner.rest().starts_with('&') {
            if let Some(c) = parse_char_ref(scanner) {
                parts.push(Node::CharRef(c));
                continue;
            }
        }

        let text = take_attr_text(scanner, Some(quote), opts.special.is_some());
        push_text(&mut parts, text);
    }
    Ok(normalize_value(parts))
}

fn parse_unquoted_value(
    scanner: &mut Scanner,
    opts: &FragmentOptions,
) -> Result<Node, ParseError> {
    let mut parts: Vec<Node> = Vec::new();
    loop {
        match scanner.peek() {
            None => break,
            Some(c) if c.is_whitespace() || c == '>' => break,
            Some('/') if scanner.rest().starts_with("/>") => break,
            _ => {}
        }

        if let Some(hook) = opts.special {
            let before = scanner.pos;
            if let Some(node) = hook(scanner, TagPosition::InAttribute, opts.text_mode)? {
                parts.push(node);
                continue;
            }
            if scanner.pos != before {
                continue;
            }
        }

        if scanner.rest().starts_with('&') {
            if let Some(c) = parse_char_ref(scanner) {
                parts.push(Node::CharRef(c));
                continue;
            }
        }

        let text = take_attr_text(scanner, None, opts.special.is_some());
        push_text(&mut parts, text);
    }
    if parts.is_empty() {
        return Err(scanner.fatal("Expected attribute value"));
    }
    Ok(normalize_value(parts))
}

fn normalize_value(mut parts: Vec<Node>) -> Node {
    match parts.len() {
        0 => Node::Text(String::new()),
        1 => parts.remove(0),
        _ => Node::Seq(parts),
    }
}

/// Length of `</name …>` at the scanner position, matched case-insensitively.
fn close_tag_len(scanner: &Scanner, name: &str) -> Option<usize> {
    let rest = scanner.rest();
    let after = rest.strip_prefix("</")?;
    let head = after.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    let tail = &after[name.len()..];
    // the name must end here, not be a prefix of a longer one
    if tail
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return None;
    }
    let ws = tail.len() - tail.trim_start().len();
    if tail[ws..].starts_with('>') {
        Some(2 + name.len() + ws + 1)
    } else {
        None
    }
}

fn skip_whitespace(scanner: &mut Scanner) {
    while scanner.peek().is_some_and(|c| c.is_whitespace()) {
        let c = scanner.peek().map(|c| c.len_utf8()).unwrap_or(1);
        scanner.advance(c);
    }
}

fn push_text(items: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(prev)) = items.last_mut() {
        prev.push_str(text);
    } else {
        items.push(Node::Text(text.to_string()));
    }
}

/// Consume a text run. Always consumes at least one character; later
/// characters stop before `&`, markup-starting `<`, and (when template tags
/// are live) `{{`.
fn take_content_text<'a>(scanner: &mut Scanner<'a>, stop_braces: bool) -> &'a str {
    let rest = scanner.rest();
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if i > 0 {
            let b = bytes[i];
            if b == b'&' {
                break;
            }
            if b == b'<'
                && bytes
                    .get(i + 1)
                    .is_some_and(|c| c.is_ascii_alphabetic() || *c == b'/' || *c == b'!')
            {
                break;
            }
            if stop_braces && b == b'{' && bytes.get(i + 1) == Some(&b'{') {
                break;
            }
        }
        i += 1;
    }
    let text = &rest[..i];
    scanner.advance(i);
    text
}

fn take_rcdata_text<'a>(scanner: &mut Scanner<'a>, stop_braces: bool) -> &'a str {
    let rest = scanner.rest();
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if i > 0 {
            let b = bytes[i];
            if b == b'&' {
                break;
            }
            if b == b'<' && bytes.get(i + 1) == Some(&b'/') {
                break;
            }
            if stop_braces && b == b'{' && bytes.get(i + 1) == Some(&b'{') {
                break;
            }
        }
        i += 1;
    }
    let text = &rest[..i];
    scanner.advance(i);
    text
}

fn take_attr_text<'a>(
    scanner: &mut Scanner<'a>,
    quote: Option<char>,
    stop_braces: bool,
) -> &'a str {
    let rest = scanner.rest();
    let mut end = rest.len();
    for (i, c) in rest.char_indices() {
        if i == 0 {
            continue;
        }
        let stop = match quote {
            Some(q) => c == q || c == '&' || (stop_braces && rest[i..].starts_with("{{")),
            None => {
                c.is_whitespace()
                    || c == '>'
                    || c == '&'
                    || rest[i..].starts_with("/>")
                    || (stop_braces && rest[i..].starts_with("{{"))
            }
        };
        if stop {
            end = i;
            break;
        }
    }
    let text = &rest[..end];
    scanner.advance(end);
    text
}
