use std::sync::LazyLock;

use regex::Regex;

use whisker_html::{Arg, ArgValue, Attrs, Node, StacheTag, Tag, DYNAMIC_KEY, SPECIALS_KEY};

use crate::optimize::optimize;
use crate::CompileOptions;

/// Rewrite a tree and serialize it to a JavaScript expression, with the
/// `self` wrapper selected by the options.
pub fn code_gen(tree: &Node, options: &CompileOptions) -> String {
    let optimized = optimize(tree);
    let specialized = specialize(&optimized);
    let body = node_to_code(&specialized);
    if options.is_template {
        format!(
            "(function () {{ var self = this; var __content = self.__content, __elseContent = self.__elseContent; return {}; }})",
            body
        )
    } else {
        format!("(function () {{ var self = this; return {}; }})", body)
    }
}

/// Replace every `Special` node (and dynamic attribute value) with a `Code`
/// node invoking the runtime. Builds a new tree; the input is untouched.
pub fn specialize(node: &Node) -> Node {
    match node {
        Node::Special(tag) => Node::Code(code_gen_special(tag)),
        Node::Tag(tag) => Node::Tag(Tag {
            name: tag.name.clone(),
            attrs: specialize_attrs(&tag.attrs),
            children: tag.children.iter().map(specialize).collect(),
        }),
        Node::Seq(items) => Node::Seq(items.iter().map(specialize).collect()),
        other => other.clone(),
    }
}

fn code_gen_special(tag: &StacheTag) -> String {
    match tag {
        StacheTag::Double { path, args } => format!(
            "function () {{ return Spacebars.mustache({}); }}",
            mustache_call_args(path, args)
        ),
        StacheTag::Triple { path, args } => format!(
            "function () {{ return Spacebars.makeRaw(Spacebars.mustache({})); }}",
            mustache_call_args(path, args)
        ),
        StacheTag::Inclusion { path, args } => inclusion_code(path, args, None, None),
        StacheTag::BlockOpen {
            path,
            args,
            content,
            else_content,
        } => inclusion_code(path, args, Some(content.as_slice()), else_content.as_deref()),
        _ => panic!("unexpected template tag at code generation"),
    }
}

// ── attribute specialization ────────────────────────────────────────

fn specialize_attrs(attrs: &Attrs) -> Attrs {
    let mut specials: Vec<&StacheTag> = Vec::new();
    if let Some(Node::Seq(items)) = attrs.get(SPECIALS_KEY) {
        for item in items {
            if let Node::Special(tag) = item {
                specials.push(tag);
            }
        }
    }

    let mut found = !specials.is_empty();
    let mut result = Attrs::new();
    for (name, value) in attrs.iter() {
        if name.starts_with('$') {
            continue;
        }
        let (new_value, dynamic) = specialize_attr_value(value);
        found |= dynamic;
        result.set(name, new_value);
    }

    if !found {
        // nothing dynamic: hand back the attrs unchanged
        return attrs.clone();
    }

    if !specials.is_empty() {
        let codes = specials
            .iter()
            .map(|tag| Node::Code(attr_set_code(tag)))
            .collect();
        result.set(DYNAMIC_KEY, Node::Seq(codes));
    }
    result
}

fn specialize_attr_value(value: &Node) -> (Node, bool) {
    match value {
        Node::Special(tag) => (Node::Code(attr_value_code(tag)), true),
        Node::Seq(items) => {
            let mut any = false;
            let parts = items
                .iter()
                .map(|item| {
                    let (node, dynamic) = specialize_attr_value(item);
                    any |= dynamic;
                    node
                })
                .collect();
            (Node::Seq(parts), any)
        }
        other => (other.clone(), false),
    }
}

fn attr_value_code(tag: &StacheTag) -> String {
    match tag {
        StacheTag::Double { path, args } => format!(
            "function () {{ return Spacebars.mustache({}); }}",
            mustache_call_args(path, args)
        ),
        _ => panic!("unexpected template tag in an attribute value"),
    }
}

/// `<div {{attrs}}>`: each whole-attribute tag becomes an attrMustache thunk.
fn attr_set_code(tag: &StacheTag) -> String {
    match tag {
        StacheTag::Double { path, args } => format!(
            "function () {{ return Spacebars.attrMustache({}); }}",
            mustache_call_args(path, args)
        ),
        _ => panic!("unexpected template tag in attribute-set position"),
    }
}

// ── mustache calls ──────────────────────────────────────────────────

/// Arguments for `Spacebars.mustache`/`attrMustache`: the resolved name,
/// positional arguments in source order, then keywords in a trailing
/// `Spacebars.kw({…})`.
fn mustache_call_args(path: &[String], args: &[Arg]) -> String {
    let mut parts = vec![code_gen_path(path)];
    let mut keywords: Vec<(String, String)> = Vec::new();
    for arg in args {
        match &arg.name {
            Some(name) => keywords.push((name.clone(), bare_arg_code(&arg.value))),
            None => parts.push(bare_arg_code(&arg.value)),
        }
    }
    if !keywords.is_empty() {
        parts.push(format!("Spacebars.kw({})", object_literal(&keywords)));
    }
    parts.join(", ")
}

fn code_gen_path(path: &[String]) -> String {
    let head = format!("self.lookup({})", js_string(&path[0]));
    if path.len() == 1 {
        head
    } else {
        let ids: Vec<String> = path[1..].iter().map(|s| js_string(s)).collect();
        format!("Spacebars.dot({}, {})", head, ids.join(", "))
    }
}

// ── inclusion / block calls ─────────────────────────────────────────

fn inclusion_code(
    path: &[String],
    args: &[Arg],
    content: Option<&[Node]>,
    else_content: Option<&[Node]>,
) -> String {
    let comp = component_code(path);
    match inclusion_args_literal(args, content, else_content) {
        Some(obj) => format!(
            "function () {{ return Spacebars.include({}, {}); }}",
            comp, obj
        ),
        None => format!("function () {{ return Spacebars.include({}); }}", comp),
    }
}

fn builtin_component(name: &str) -> Option<&'static str> {
    match name {
        "content" => Some("__content"),
        "elseContent" => Some("__elseContent"),
        "if" => Some("UI.If"),
        "unless" => Some("UI.Unless"),
        "with" => Some("UI.With"),
        "each" => Some("UI.Each"),
        _ => None,
    }
}

/// A single-segment component name prefers the template of that name and
/// falls back to a helper lookup; longer paths are plain lookups.
fn component_code(path: &[String]) -> String {
    if path.len() == 1 {
        if let Some(builtin) = builtin_component(&path[0]) {
            return builtin.to_string();
        }
        format!(
            "(Template[{}] || {})",
            js_string(&path[0]),
            code_gen_path(path)
        )
    } else {
        code_gen_path(path)
    }
}

fn inclusion_args_literal(
    args: &[Arg],
    content: Option<&[Node]>,
    else_content: Option<&[Node]>,
) -> Option<String> {
    let positional: Vec<&ArgValue> = args
        .iter()
        .filter(|a| a.is_positional())
        .map(|a| &a.value)
        .collect();

    let mut entries: Vec<(String, String)> = Vec::new();
    if let Some(content) = content {
        entries.push(("__content".to_string(), block_code(content)));
    }
    if let Some(else_content) = else_content {
        entries.push(("__elseContent".to_string(), block_code(else_content)));
    }
    for arg in args {
        if let Some(name) = &arg.name {
            entries.push((name.clone(), keyword_arg_code(&arg.value)));
        }
    }
    match positional.len() {
        0 => {}
        1 => entries.push(("data".to_string(), data_arg_code(positional[0]))),
        _ => {
            let codes: Vec<String> = positional.iter().map(|v| bare_arg_code(v)).collect();
            entries.push((
                "data".to_string(),
                format!(
                    "function () {{ return Spacebars.call({}); }}",
                    codes.join(", ")
                ),
            ));
        }
    }

    if entries.is_empty() {
        None
    } else {
        Some(object_literal(&entries))
    }
}

fn bare_arg_code(value: &ArgValue) -> String {
    match value {
        ArgValue::Path(path) => code_gen_path(path),
        ArgValue::Str(text) => js_string(text),
        ArgValue::Number(n) => js_number(*n),
        ArgValue::Bool(b) => b.to_string(),
        ArgValue::Null => "null".to_string(),
    }
}

/// Keyword values: a bare single lookup establishes its dependency in place;
/// a chained lookup is deferred into a call thunk.
fn keyword_arg_code(value: &ArgValue) -> String {
    match value {
        ArgValue::Path(path) if path.len() > 1 => format!(
            "function () {{ return Spacebars.call({}); }}",
            code_gen_path(path)
        ),
        other => bare_arg_code(other),
    }
}

/// The `data` argument is evaluated by the component when it rebuilds, so
/// path values are always deferred and called.
fn data_arg_code(value: &ArgValue) -> String {
    match value {
        ArgValue::Path(path) => format!(
            "function () {{ return Spacebars.call({}); }}",
            code_gen_path(path)
        ),
        other => bare_arg_code(other),
    }
}

fn block_code(content: &[Node]) -> String {
    let node = Node::from_items(content.to_vec());
    let optimized = optimize(&node);
    let specialized = specialize(&optimized);
    format!(
        "UI.block(function () {{ var self = this; return {}; }})",
        node_to_code(&specialized)
    )
}

// ── emission ────────────────────────────────────────────────────────

static TAG_CTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9]*$").unwrap());
static ATTR_KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z]+$").unwrap());
static JS_IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z$_][a-zA-Z0-9$_]*$").unwrap());

/// Serialize a specialized node to a JavaScript expression.
pub fn node_to_code(node: &Node) -> String {
    match node {
        Node::Text(text) => js_string(text),
        Node::Raw(html) => format!("HTML.Raw({})", js_string(html)),
        Node::CharRef(c) => format!(
            "HTML.CharRef({{html: {}, str: {}}})",
            js_string(&c.html),
            js_string(&c.text)
        ),
        Node::Comment(text) => format!("HTML.Comment({})", js_string(text)),
        Node::Code(code) => code.clone(),
        Node::Seq(items) => {
            let codes: Vec<String> = items.iter().map(node_to_code).collect();
            format!("[{}]", codes.join(", "))
        }
        Node::Tag(tag) => tag_to_code(tag),
        Node::Special(_) => panic!("template tag survived to code emission"),
    }
}

fn tag_to_code(tag: &Tag) -> String {
    let ctor = if TAG_CTOR_RE.is_match(&tag.name) {
        format!("UI.Tag.{}", tag.name)
    } else {
        format!("UI.Tag[{}]", js_string(&tag.name))
    };
    let mut parts = Vec::new();
    if !tag.attrs.is_empty() {
        parts.push(attrs_literal(&tag.attrs));
    }
    for child in &tag.children {
        parts.push(node_to_code(child));
    }
    format!("{}({})", ctor, parts.join(", "))
}

fn attrs_literal(attrs: &Attrs) -> String {
    let fields: Vec<String> = attrs
        .iter()
        .map(|(name, value)| {
            let key = if ATTR_KEY_RE.is_match(name) {
                name.to_string()
            } else {
                js_string(name)
            };
            format!("{}: {}", key, node_to_code(value))
        })
        .collect();
    format!("{{{}}}", fields.join(", "))
}

fn object_literal(entries: &[(String, String)]) -> String {
    let fields: Vec<String> = entries
        .iter()
        .map(|(key, value)| {
            let key = if JS_IDENT_RE.is_match(key) {
                key.clone()
            } else {
                js_string(key)
            };
            format!("{}: {}", key, value)
        })
        .collect();
    format!("{{{}}}", fields.join(", "))
}

/// A JavaScript string literal. JSON covers the escapes except the two
/// line-separator characters, which are legal JSON but not legal JS source.
fn js_string(text: &str) -> String {
    let json = serde_json::to_string(text).unwrap_or_else(|_| format!("{:?}", text));
    json.replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

fn js_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
