use whisker_html::{to_html, Node, Tag, SPECIALS_KEY};

/// Collapse static subtrees into pre-rendered HTML.
///
/// Subtrees free of template tags render once at compile time; anything
/// dynamic survives with its static siblings fused into `Raw` runs.
pub fn optimize(tree: &Node) -> Node {
    match optimize_parts(tree) {
        Some(node) => node,
        None => {
            // nothing dynamic anywhere
            let html = to_html(tree);
            if is_pure_chars(&html) {
                Node::Text(html)
            } else {
                Node::Raw(html)
            }
        }
    }
}

/// HTML that re-parses as itself: no character references, no tags.
fn is_pure_chars(html: &str) -> bool {
    !html.contains('&') && !html.contains('<')
}

/// Returns `None` when the node contains nothing dynamic; the caller decides
/// how to stringify it.
fn optimize_parts(node: &Node) -> Option<Node> {
    match node {
        Node::Text(_) | Node::Raw(_) | Node::CharRef(_) | Node::Comment(_) => None,
        Node::Seq(items) => optimize_array_parts(items, false).map(Node::Seq),
        Node::Tag(tag) => {
            // fusing into RCDATA would need text-mode escaping rules
            if tag.name.eq_ignore_ascii_case("textarea") {
                return Some(node.clone());
            }
            let must_optimize = attrs_have_specials(tag);
            let children = optimize_array_parts(&tag.children, must_optimize)?;
            Some(Node::Tag(Tag {
                name: tag.name.clone(),
                attrs: tag.attrs.clone(),
                children,
            }))
        }
        Node::Special(_) | Node::Code(_) => Some(node.clone()),
    }
}

/// Walk children left to right. Once anything dynamic is found (or
/// unconditionally under `force`), preceding and following static children
/// are rendered to HTML and coalesced.
fn optimize_array_parts(items: &[Node], force: bool) -> Option<Vec<Node>> {
    let mut result: Option<Vec<Node>> = if force { Some(Vec::new()) } else { None };
    for (i, item) in items.iter().enumerate() {
        match optimize_parts(item) {
            Some(part) => {
                if result.is_none() {
                    let mut buf = Vec::new();
                    for plain in &items[..i] {
                        push_raw_html(&mut buf, &to_html(plain));
                    }
                    result = Some(buf);
                }
                if let Some(buf) = result.as_mut() {
                    buf.push(part);
                }
            }
            None => {
                if let Some(buf) = result.as_mut() {
                    push_raw_html(buf, &to_html(item));
                }
            }
        }
    }
    result.map(|buf| {
        buf.into_iter()
            .map(|node| match node {
                Node::Raw(html) if is_pure_chars(&html) => Node::Text(html),
                other => other,
            })
            .collect()
    })
}

fn push_raw_html(buf: &mut Vec<Node>, html: &str) {
    if let Some(Node::Raw(prev)) = buf.last_mut() {
        prev.push_str(html);
    } else {
        buf.push(Node::Raw(html.to_string()));
    }
}

/// A tag whose attributes carry template tags must keep its element
/// structure, so its children are each examined even if static.
fn attrs_have_specials(tag: &Tag) -> bool {
    tag.attrs.iter().any(|(name, value)| {
        if name == SPECIALS_KEY {
            !matches!(value, Node::Seq(items) if items.is_empty())
        } else if name.starts_with('$') {
            true
        } else {
            value_has_specials(value)
        }
    })
}

fn value_has_specials(value: &Node) -> bool {
    match value {
        Node::Special(_) | Node::Code(_) => true,
        Node::Seq(items) => items.iter().any(value_has_specials),
        _ => false,
    }
}
