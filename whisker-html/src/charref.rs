use std::sync::LazyLock;

use regex::Regex;

use crate::scanner::Scanner;
use crate::tree::CharRef;

// Named references recognized by the parser. Templates overwhelmingly use a
// small set; unknown names fall through as literal text.
const NAMED: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", "\u{a0}"),
    ("copy", "\u{a9}"),
    ("reg", "\u{ae}"),
    ("trade", "\u{2122}"),
    ("deg", "\u{b0}"),
    ("plusmn", "\u{b1}"),
    ("frac12", "\u{bd}"),
    ("times", "\u{d7}"),
    ("divide", "\u{f7}"),
    ("laquo", "\u{ab}"),
    ("raquo", "\u{bb}"),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("ldquo", "\u{201c}"),
    ("rdquo", "\u{201d}"),
    ("ndash", "\u{2013}"),
    ("mdash", "\u{2014}"),
    ("hellip", "\u{2026}"),
    ("middot", "\u{b7}"),
    ("sect", "\u{a7}"),
    ("para", "\u{b6}"),
    ("bull", "\u{2022}"),
    ("dagger", "\u{2020}"),
    ("euro", "\u{20ac}"),
    ("pound", "\u{a3}"),
    ("yen", "\u{a5}"),
    ("cent", "\u{a2}"),
];

static NAMED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^&([a-zA-Z][a-zA-Z0-9]*);").unwrap());
static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^&#([0-9]{1,7});").unwrap());
static HEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^&#[xX]([0-9a-fA-F]{1,6});").unwrap());

/// Try to consume a character reference at the scanner position.
///
/// Returns `None` (without consuming) when the input is not a recognizable
/// reference; a bare `&` is then ordinary text.
pub fn parse_char_ref(scanner: &mut Scanner) -> Option<CharRef> {
    let rest = scanner.rest();
    if !rest.starts_with('&') {
        return None;
    }

    if let Some(caps) = NAMED_RE.captures(rest) {
        let name = caps.get(1).map(|m| m.as_str())?;
        let decoded = NAMED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, text)| *text)?;
        let html = caps.get(0).map(|m| m.as_str().to_string())?;
        scanner.advance(html.len());
        return Some(CharRef {
            html,
            text: decoded.to_string(),
        });
    }

    if let Some(caps) = DECIMAL_RE.captures(rest) {
        let digits = caps.get(1)?.as_str();
        let code: u32 = digits.parse().ok()?;
        let ch = char::from_u32(code)?;
        let html = caps.get(0)?.as_str().to_string();
        scanner.advance(html.len());
        return Some(CharRef {
            html,
            text: ch.to_string(),
        });
    }

    if let Some(caps) = HEX_RE.captures(rest) {
        let digits = caps.get(1)?.as_str();
        let code = u32::from_str_radix(digits, 16).ok()?;
        let ch = char::from_u32(code)?;
        let html = caps.get(0)?.as_str().to_string();
        scanner.advance(html.len());
        return Some(CharRef {
            html,
            text: ch.to_string(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &str) -> Option<(CharRef, usize)> {
        let mut s = Scanner::new(input);
        parse_char_ref(&mut s).map(|c| (c, s.pos))
    }

    #[test]
    fn named_reference() {
        let (c, consumed) = decode("&amp;rest").unwrap();
        assert_eq!(c.html, "&amp;");
        assert_eq!(c.text, "&");
        assert_eq!(consumed, 5);
    }

    #[test]
    fn decimal_and_hex() {
        assert_eq!(decode("&#65;").unwrap().0.text, "A");
        assert_eq!(decode("&#x2603;").unwrap().0.text, "\u{2603}");
    }

    #[test]
    fn bare_ampersand_is_not_a_reference() {
        assert!(decode("& x").is_none());
        assert!(decode("&notaref x").is_none());
        assert!(decode("&#xZZ;").is_none());
    }
}
