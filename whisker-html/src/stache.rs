use crate::tree::Node;

/// A reference path: one or more segments resolved against the evaluation
/// context. The first segment may be the ancestor marker `"."` followed by
/// one extra dot per ancestor step (`..` parses to `".."`, `../..` to
/// `"..."`).
pub type Path = Vec<String>;

/// Join a path for block open/close matching and error messages.
pub fn join_path(path: &[String]) -> String {
    path.join(",")
}

/// A parsed stache tag.
#[derive(Debug, Clone, PartialEq)]
pub enum StacheTag {
    /// `{{…}}` — escaped interpolation or helper call.
    Double { path: Path, args: Vec<Arg> },
    /// `{{{…}}}` — unescaped interpolation.
    Triple { path: Path, args: Vec<Arg> },
    /// `{{> …}}` — partial / component inclusion.
    Inclusion { path: Path, args: Vec<Arg> },
    /// `{{#…}}…{{/…}}`, with content filled in by the template parser.
    BlockOpen {
        path: Path,
        args: Vec<Arg>,
        content: Vec<Node>,
        else_content: Option<Vec<Node>>,
    },
    /// `{{/…}}` — consumed by the parser, never in the final tree.
    BlockClose { path: Path },
    /// `{{else}}` — consumed by the parser.
    Else,
    /// `{{! …}}` — discarded by the parser.
    Comment(String),
}

/// One argument inside a stache tag; `name` is set for `name=value` forms.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: ArgValue,
}

impl Arg {
    pub fn positional(value: ArgValue) -> Arg {
        Arg { name: None, value }
    }

    pub fn keyword(name: impl Into<String>, value: ArgValue) -> Arg {
        Arg {
            name: Some(name.into()),
            value,
        }
    }

    pub fn is_positional(&self) -> bool {
        self.name.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Path(Path),
    Str(String),
    Number(f64),
    Bool(bool),
    Null,
}
