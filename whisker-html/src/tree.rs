use crate::stache::StacheTag;

/// One node of the intermediate template tree.
///
/// Every node is exclusively owned by its parent; rewrite passes build new
/// nodes rather than sharing subtrees.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Plain text, escaped when rendered.
    Text(String),
    /// Pre-rendered HTML, emitted verbatim.
    Raw(String),
    /// A character reference such as `&amp;`.
    CharRef(CharRef),
    /// An HTML comment.
    Comment(String),
    /// An element with attributes and children.
    Tag(Tag),
    /// A stache tag awaiting specialization.
    Special(StacheTag),
    /// Verbatim target source, produced only by the specializer.
    Code(String),
    /// A sequence of sibling nodes.
    Seq(Vec<Node>),
}

impl Node {
    pub fn text(t: impl Into<String>) -> Node {
        Node::Text(t.into())
    }

    /// Collapse a parsed item list into a single node.
    pub fn from_items(mut items: Vec<Node>) -> Node {
        if items.len() == 1 {
            items.remove(0)
        } else {
            Node::Seq(items)
        }
    }
}

/// A decoded character reference: the source form and the character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharRef {
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub attrs: Attrs,
    pub children: Vec<Node>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Tag {
        Tag {
            name: name.into(),
            attrs: Attrs::new(),
            children: Vec::new(),
        }
    }
}

pub fn h(name: impl Into<String>, attrs: Attrs, children: Vec<Node>) -> Node {
    Node::Tag(Tag {
        name: name.into(),
        attrs,
        children,
    })
}

/// Attribute key reserved for whole-attribute stache tags (`<div {{attrs}}>`).
pub const SPECIALS_KEY: &str = "$specials";
/// Attribute key carrying specialized whole-attribute code.
pub const DYNAMIC_KEY: &str = "$dynamic";

/// Insertion-ordered attribute map.
///
/// Keys starting with `$` are synthetic and skipped by ordinary attribute
/// processing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attrs {
    pairs: Vec<(String, Node)>,
}

impl Attrs {
    pub fn new() -> Attrs {
        Attrs { pairs: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Insert or replace an attribute, preserving first-seen order.
    pub fn set(&mut self, name: impl Into<String>, value: Node) {
        let name = name.into();
        if let Some(entry) = self.pairs.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = value;
        } else {
            self.pairs.push((name, value));
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: Node) -> Attrs {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }
}
