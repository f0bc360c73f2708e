use crate::tree::{Attrs, Node, Tag};

/// Elements that never take children or a close tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|v| v.eq_ignore_ascii_case(name))
}

/// Render a tree of static content to HTML.
///
/// Panics if the tree still contains `Special` or `Code` nodes; those must be
/// compiled away before the tree can be stringified.
pub fn to_html(node: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Text(t) => out.push_str(&escape_text(t)),
        Node::Raw(html) => out.push_str(html),
        Node::CharRef(c) => out.push_str(&c.html),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::Tag(tag) => write_tag(out, tag),
        Node::Seq(items) => {
            for item in items {
                write_node(out, item);
            }
        }
        Node::Special(_) => panic!("can't render a template tag to HTML"),
        Node::Code(_) => panic!("can't render generated code to HTML"),
    }
}

fn write_tag(out: &mut String, tag: &Tag) {
    out.push('<');
    out.push_str(&tag.name);
    write_attrs(out, &tag.attrs);
    out.push('>');
    if is_void_element(&tag.name) {
        return;
    }
    for child in &tag.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&tag.name);
    out.push('>');
}

fn write_attrs(out: &mut String, attrs: &Attrs) {
    for (name, value) in attrs.iter() {
        if name.starts_with('$') {
            panic!("can't render dynamic attributes to HTML");
        }
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        write_attr_value(out, value);
        out.push('"');
    }
}

fn write_attr_value(out: &mut String, value: &Node) {
    match value {
        Node::Text(t) => out.push_str(&escape_attr(t)),
        Node::CharRef(c) => out.push_str(&c.html),
        Node::Raw(html) => out.push_str(html),
        Node::Seq(items) => {
            for item in items {
                write_attr_value(out, item);
            }
        }
        _ => panic!("can't render a template tag to HTML"),
    }
}

/// Escape character data: `&` and `<` start markup, everything else is safe.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
