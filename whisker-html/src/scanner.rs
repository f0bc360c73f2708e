use regex::Regex;

use crate::error::ParseError;

/// Position cursor over an input string.
///
/// Shared sequentially between the HTML parser and the stache-tag callback:
/// whoever holds it advances `pos` past what it consumed.
#[derive(Debug)]
pub struct Scanner<'a> {
    pub input: &'a str,
    pub pos: usize,
    pub source_name: Option<String>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Scanner {
            input,
            pos: 0,
            source_name: None,
        }
    }

    pub fn with_source_name(input: &'a str, name: Option<&str>) -> Self {
        Scanner {
            input,
            pos: 0,
            source_name: name.map(|n| n.to_string()),
        }
    }

    /// Remaining input from the current position.
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Consume `prefix` if the remaining input starts with it.
    pub fn take_prefix(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    /// Consume an anchored regex match at the current position.
    ///
    /// The pattern must be written with a leading `^`.
    pub fn take_re(&mut self, re: &Regex) -> Option<&'a str> {
        let m = re.find(self.rest())?;
        if m.start() != 0 {
            return None;
        }
        let text = &self.input[self.pos..self.pos + m.end()];
        self.pos += m.end();
        Some(text)
    }

    /// An error located at the current position.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        self.fatal_at(self.pos, message)
    }

    /// An error located at an explicit position.
    pub fn fatal_at(&self, pos: usize, message: impl Into<String>) -> ParseError {
        ParseError::at(self.input, pos, message).with_source_name(self.source_name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_prefix_advances() {
        let mut s = Scanner::new("{{foo}}");
        assert!(s.take_prefix("{{"));
        assert_eq!(s.pos, 2);
        assert_eq!(s.rest(), "foo}}");
        assert!(!s.take_prefix("{{"));
    }

    #[test]
    fn take_re_is_anchored() {
        let re = Regex::new(r"^[a-z]+").unwrap();
        let mut s = Scanner::new("abc def");
        assert_eq!(s.take_re(&re), Some("abc"));
        // now at the space; the pattern matches later but not here
        assert_eq!(s.take_re(&re), None);
        assert_eq!(s.pos, 3);
    }

    #[test]
    fn fatal_carries_source_name() {
        let s = Scanner::with_source_name("x\ny", Some("t.html"));
        let err = s.fatal_at(2, "nope");
        assert_eq!(err.line, 2);
        assert_eq!(err.source_name.as_deref(), Some("t.html"));
    }
}
