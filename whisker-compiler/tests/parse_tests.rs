use whisker_compiler::{parse, ArgValue, Node, StacheTag};
use whisker_html::SPECIALS_KEY;

fn parse_ok(input: &str) -> Node {
    parse(input).unwrap()
}

fn parse_err(input: &str) -> String {
    parse(input).unwrap_err().message
}

#[test]
fn plain_text_parses_to_text() {
    assert_eq!(parse_ok("Hello"), Node::text("Hello"));
}

#[test]
fn lone_interpolation_parses_to_a_special() {
    match parse_ok("{{name}}") {
        Node::Special(StacheTag::Double { path, args }) => {
            assert_eq!(path, vec!["name"]);
            assert!(args.is_empty());
        }
        other => panic!("expected a special, got {:?}", other),
    }
}

#[test]
fn mixed_content_parses_to_a_sequence() {
    match parse_ok("a{{x}}b") {
        Node::Seq(items) => {
            assert_eq!(items.len(), 3);
            assert_eq!(items[0], Node::text("a"));
            assert!(matches!(items[1], Node::Special(_)));
            assert_eq!(items[2], Node::text("b"));
        }
        other => panic!("expected a sequence, got {:?}", other),
    }
}

#[test]
fn comments_are_absorbed() {
    assert_eq!(parse_ok("a{{! note }}b"), Node::text("ab"));
}

#[test]
fn block_with_else_collects_both_fragments() {
    match parse_ok("{{#if x}}yes{{else}}no{{/if}}") {
        Node::Special(StacheTag::BlockOpen {
            path,
            args,
            content,
            else_content,
        }) => {
            assert_eq!(path, vec!["if"]);
            assert_eq!(args.len(), 1);
            assert_eq!(args[0].value, ArgValue::Path(vec!["x".into()]));
            assert_eq!(content, vec![Node::text("yes")]);
            assert_eq!(else_content, Some(vec![Node::text("no")]));
        }
        other => panic!("expected a block, got {:?}", other),
    }
}

#[test]
fn blocks_nest() {
    match parse_ok("{{#with a}}{{#if b}}x{{/if}}y{{/with}}") {
        Node::Special(StacheTag::BlockOpen { content, .. }) => {
            assert_eq!(content.len(), 2);
            assert!(matches!(
                &content[0],
                Node::Special(StacheTag::BlockOpen { .. })
            ));
            assert_eq!(content[1], Node::text("y"));
        }
        other => panic!("expected a block, got {:?}", other),
    }
}

#[test]
fn block_spanning_markup_keeps_the_tree_shape() {
    match parse_ok("<p>{{#if x}}<b>yes</b>{{else}}no{{/if}}</p>") {
        Node::Tag(p) => {
            assert_eq!(p.name, "p");
            assert_eq!(p.children.len(), 1);
            match &p.children[0] {
                Node::Special(StacheTag::BlockOpen {
                    content,
                    else_content,
                    ..
                }) => {
                    assert!(matches!(&content[0], Node::Tag(b) if b.name == "b"));
                    assert_eq!(else_content, &Some(vec![Node::text("no")]));
                }
                other => panic!("expected a block child, got {:?}", other),
            }
        }
        other => panic!("expected p, got {:?}", other),
    }
}

#[test]
fn else_at_top_level_is_fatal() {
    assert_eq!(parse_err("{{ else }}"), "Unexpected {{else}}");
}

#[test]
fn close_at_top_level_is_fatal() {
    assert_eq!(parse_err("{{/if}}"), "Unexpected block close tag");
}

#[test]
fn mismatched_block_names_are_fatal() {
    assert_eq!(parse_err("{{#a}}{{/b}}"), "Expected tag to close a, found b");
    assert_eq!(
        parse_err("{{#a.b}}{{/a.c}}"),
        "Expected tag to close a,b, found a,c"
    );
}

#[test]
fn unclosed_block_is_fatal() {
    assert_eq!(parse_err("{{#if x}}abc"), "Expected tag to close if");
    // a second {{else}} does not close anything either
    assert_eq!(
        parse_err("{{#if x}}a{{else}}b{{else}}c{{/if}}"),
        "Expected tag to close if"
    );
}

#[test]
fn interpolation_in_attribute_value() {
    match parse_ok(r#"<a href="{{url}}">x</a>"#) {
        Node::Tag(a) => {
            assert!(matches!(
                a.attrs.get("href"),
                Some(Node::Special(StacheTag::Double { .. }))
            ));
        }
        other => panic!("expected a, got {:?}", other),
    }
}

#[test]
fn composite_attribute_value() {
    match parse_ok(r#"<a href="/u/{{id}}/p">x</a>"#) {
        Node::Tag(a) => match a.attrs.get("href") {
            Some(Node::Seq(parts)) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[0], Node::text("/u/"));
                assert!(matches!(parts[1], Node::Special(_)));
                assert_eq!(parts[2], Node::text("/p"));
            }
            other => panic!("expected composite value, got {:?}", other),
        },
        other => panic!("expected a, got {:?}", other),
    }
}

#[test]
fn whole_attribute_tags_collect_under_specials() {
    match parse_ok("<div {{attrs}}>x</div>") {
        Node::Tag(div) => match div.attrs.get(SPECIALS_KEY) {
            Some(Node::Seq(specials)) => {
                assert!(matches!(
                    &specials[0],
                    Node::Special(StacheTag::Double { path, .. }) if path == &vec!["attrs".to_string()]
                ));
            }
            other => panic!("expected $specials, got {:?}", other),
        },
        other => panic!("expected div, got {:?}", other),
    }
}

#[test]
fn blocks_are_rejected_in_attributes() {
    let msg = parse_err(r#"<div class="{{#if x}}a{{/if}}">x</div>"#);
    assert!(msg.contains("block tag"), "got: {}", msg);
}

#[test]
fn triples_are_rejected_in_attributes() {
    let msg = parse_err(r#"<div class="{{{raw}}}">x</div>"#);
    assert!(msg.contains("triple-brace"), "got: {}", msg);
}

#[test]
fn blocks_work_inside_rcdata() {
    match parse_ok("<textarea>{{#if x}}a{{/if}}</textarea>") {
        Node::Tag(t) => {
            assert_eq!(t.name, "textarea");
            match &t.children[0] {
                Node::Special(StacheTag::BlockOpen { content, .. }) => {
                    assert_eq!(content, &vec![Node::text("a")]);
                }
                other => panic!("expected a block, got {:?}", other),
            }
        }
        other => panic!("expected textarea, got {:?}", other),
    }
}

#[test]
fn unclosed_element_inside_block_is_fatal() {
    let msg = parse_err("{{#if x}}<b>y{{/if}}");
    assert!(msg.contains("</b>"), "got: {}", msg);
}

#[test]
fn static_html_round_trips() {
    let src = "<div class=\"a\"><p>one</p><br><p>two</p></div>";
    let tree = parse_ok(src);
    assert_eq!(whisker_html::to_html(&tree), src);
    assert_eq!(parse_ok(&whisker_html::to_html(&tree)), tree);
}
