use std::sync::LazyLock;

use regex::Regex;

use whisker_html::{
    join_path, parse_fragment, Arg, FragmentOptions, Node, ParseError, Path, Scanner, SpecialHook,
    StacheTag, StopHook, TagPosition, TextMode,
};

use crate::tag::parse_stache_tag;

/// Parse a template into the intermediate tree, with stache tags embedded as
/// `Special` leaves.
pub fn parse(input: &str) -> Result<Node, ParseError> {
    parse_with_source(input, None)
}

pub fn parse_with_source(input: &str, source_name: Option<&str>) -> Result<Node, ParseError> {
    let mut scanner = Scanner::with_source_name(input, source_name);
    let hook: &SpecialHook = &template_tag_hook;
    let opts = FragmentOptions {
        text_mode: TextMode::Data,
        should_stop: None,
        special: Some(hook),
    };
    let items = parse_fragment(&mut scanner, &opts)?;
    Ok(Node::from_items(items))
}

static BLOCK_BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{\s*(/|else\b)").unwrap());

/// Block content runs until the next `{{/…}}` or `{{else}}`.
fn is_block_boundary(scanner: &Scanner) -> bool {
    BLOCK_BOUNDARY_RE.is_match(scanner.rest())
}

/// The callback handed to the HTML parser for every tokenization decision.
fn template_tag_hook(
    scanner: &mut Scanner,
    position: TagPosition,
    mode: TextMode,
) -> Result<Option<Node>, ParseError> {
    if !scanner.rest().starts_with("{{") {
        return Ok(None);
    }
    let start = scanner.pos;
    let scanned = parse_stache_tag(scanner.input, scanner.pos, scanner.source_name.as_deref())?;
    scanner.pos = start + scanned.char_length;

    match scanned.tag {
        // consumed, produces nothing
        StacheTag::Comment(_) => Ok(None),
        StacheTag::Else => Err(scanner.fatal_at(start, "Unexpected {{else}}")),
        StacheTag::BlockClose { .. } => {
            Err(scanner.fatal_at(start, "Unexpected block close tag"))
        }
        StacheTag::BlockOpen { path, args, .. } => match position {
            TagPosition::InStartTag | TagPosition::InAttribute => Err(scanner.fatal_at(
                start,
                "Can't use a block tag in an HTML start tag or attribute",
            )),
            _ => {
                let block = parse_block(scanner, path, args, mode)?;
                Ok(Some(Node::Special(block)))
            }
        },
        tag @ StacheTag::Double { .. } => Ok(Some(Node::Special(tag))),
        tag @ StacheTag::Triple { .. } => match position {
            TagPosition::InStartTag | TagPosition::InAttribute => Err(scanner.fatal_at(
                start,
                "Can't use a triple-brace tag in an HTML start tag or attribute",
            )),
            _ => Ok(Some(Node::Special(tag))),
        },
        tag @ StacheTag::Inclusion { .. } => match position {
            TagPosition::InStartTag | TagPosition::InAttribute => Err(scanner.fatal_at(
                start,
                "Can't use an inclusion tag in an HTML start tag or attribute",
            )),
            _ => Ok(Some(Node::Special(tag))),
        },
    }
}

/// Parse block content after `{{#…}}`, handling `{{else}}` and the matching
/// close tag.
fn parse_block(
    scanner: &mut Scanner,
    path: Path,
    args: Vec<Arg>,
    mode: TextMode,
) -> Result<StacheTag, ParseError> {
    let block_name = join_path(&path);
    let stop: &StopHook = &is_block_boundary;
    let hook: &SpecialHook = &template_tag_hook;
    let opts = FragmentOptions {
        text_mode: mode,
        should_stop: Some(stop),
        special: Some(hook),
    };

    let content = parse_fragment(scanner, &opts)?;

    let mut else_content = None;
    let mut next = take_block_tag(scanner, &block_name)?;
    if matches!(next, StacheTag::Else) {
        else_content = Some(parse_fragment(scanner, &opts)?);
        next = take_block_tag(scanner, &block_name)?;
    }

    match next {
        StacheTag::BlockClose { path: close_path } => {
            let close_name = join_path(&close_path);
            if close_name != block_name {
                return Err(scanner.fatal(format!(
                    "Expected tag to close {}, found {}",
                    block_name, close_name
                )));
            }
        }
        _ => {
            return Err(scanner.fatal(format!("Expected tag to close {}", block_name)));
        }
    }

    Ok(StacheTag::BlockOpen {
        path,
        args,
        content,
        else_content,
    })
}

fn take_block_tag(scanner: &mut Scanner, block_name: &str) -> Result<StacheTag, ParseError> {
    if !scanner.rest().starts_with("{{") {
        return Err(scanner.fatal(format!("Expected tag to close {}", block_name)));
    }
    let scanned = parse_stache_tag(scanner.input, scanner.pos, scanner.source_name.as_deref())?;
    scanner.pos += scanned.char_length;
    Ok(scanned.tag)
}
