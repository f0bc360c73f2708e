use whisker_html::{
    parse_fragment, to_html, FragmentOptions, Node, Scanner, StacheTag, TagPosition, TextMode,
};

fn parse(input: &str) -> Vec<Node> {
    let mut scanner = Scanner::new(input);
    parse_fragment(&mut scanner, &FragmentOptions::default()).unwrap()
}

#[test]
fn parse_element_with_text() {
    let items = parse("<div>hi</div>");
    assert_eq!(items.len(), 1);
    match &items[0] {
        Node::Tag(tag) => {
            assert_eq!(tag.name, "div");
            assert_eq!(tag.children, vec![Node::text("hi")]);
        }
        _ => panic!("expected element"),
    }
}

#[test]
fn parse_nested_elements_and_attributes() {
    let items = parse(r#"<div class="app"><span id='s'>x</span></div>"#);
    match &items[0] {
        Node::Tag(div) => {
            assert_eq!(div.attrs.get("class"), Some(&Node::text("app")));
            match &div.children[0] {
                Node::Tag(span) => {
                    assert_eq!(span.name, "span");
                    assert_eq!(span.attrs.get("id"), Some(&Node::text("s")));
                }
                _ => panic!("expected span"),
            }
        }
        _ => panic!("expected div"),
    }
}

#[test]
fn parse_boolean_and_unquoted_attributes() {
    let items = parse("<input disabled value=ok>");
    match &items[0] {
        Node::Tag(tag) => {
            assert_eq!(tag.attrs.get("disabled"), Some(&Node::text("")));
            assert_eq!(tag.attrs.get("value"), Some(&Node::text("ok")));
            assert!(tag.children.is_empty());
        }
        _ => panic!("expected element"),
    }
}

#[test]
fn parse_comment_node() {
    let items = parse("a<!-- note -->b");
    assert_eq!(
        items,
        vec![
            Node::text("a"),
            Node::Comment(" note ".into()),
            Node::text("b"),
        ]
    );
}

#[test]
fn parse_character_references() {
    let items = parse("x &amp; y");
    assert_eq!(items.len(), 3);
    match &items[1] {
        Node::CharRef(c) => {
            assert_eq!(c.html, "&amp;");
            assert_eq!(c.text, "&");
        }
        _ => panic!("expected character reference"),
    }
    // a bare ampersand is just text
    assert_eq!(parse("a & b"), vec![Node::text("a & b")]);
}

#[test]
fn void_elements_take_no_children() {
    let items = parse("<p>a<br>b</p>");
    match &items[0] {
        Node::Tag(p) => {
            assert_eq!(p.children.len(), 3);
            assert!(matches!(&p.children[1], Node::Tag(t) if t.name == "br"));
        }
        _ => panic!("expected p"),
    }
}

#[test]
fn rcdata_treats_markup_as_text() {
    let items = parse("<textarea><b>not bold</b></textarea>");
    match &items[0] {
        Node::Tag(t) => {
            assert_eq!(t.children, vec![Node::text("<b>not bold</b>")]);
        }
        _ => panic!("expected textarea"),
    }
}

#[test]
fn mismatched_close_tag_is_fatal() {
    let mut scanner = Scanner::new("<div>x</span>");
    let err = parse_fragment(&mut scanner, &FragmentOptions::default()).unwrap_err();
    assert!(err.message.contains("</div>"), "got: {}", err.message);
}

#[test]
fn stray_close_tag_is_fatal() {
    let mut scanner = Scanner::new("x</div>");
    let err = parse_fragment(&mut scanner, &FragmentOptions::default()).unwrap_err();
    assert!(err.message.contains("Unexpected"), "got: {}", err.message);
}

#[test]
fn unclosed_comment_is_fatal() {
    let mut scanner = Scanner::new("<!-- never ends");
    let err = parse_fragment(&mut scanner, &FragmentOptions::default()).unwrap_err();
    assert!(err.message.contains("Unclosed"), "got: {}", err.message);
}

#[test]
fn double_braces_are_text_without_a_callback() {
    assert_eq!(parse("a {{b}} c"), vec![Node::text("a {{b}} c")]);
}

// A minimal callback: turns `{{…}}` into a Special with a one-segment path.
fn toy_hook(
    scanner: &mut Scanner,
    _position: TagPosition,
    _mode: TextMode,
) -> Result<Option<Node>, whisker_html::ParseError> {
    let rest = scanner.rest();
    if !rest.starts_with("{{") {
        return Ok(None);
    }
    let end = rest.find("}}").ok_or_else(|| scanner.fatal("Expected }}"))?;
    let name = rest[2..end].trim().to_string();
    scanner.advance(end + 2);
    Ok(Some(Node::Special(StacheTag::Double {
        path: vec![name],
        args: vec![],
    })))
}

#[test]
fn callback_produces_special_nodes() {
    let mut scanner = Scanner::new("<p>Hello {{name}}</p>");
    let opts = FragmentOptions {
        special: Some(&toy_hook),
        ..Default::default()
    };
    let items = parse_fragment(&mut scanner, &opts).unwrap();
    match &items[0] {
        Node::Tag(p) => {
            assert_eq!(p.children[0], Node::text("Hello "));
            assert!(matches!(&p.children[1], Node::Special(_)));
        }
        _ => panic!("expected p"),
    }
}

#[test]
fn callback_runs_in_attribute_values() {
    let mut scanner = Scanner::new(r#"<a href="/u/{{id}}">x</a>"#);
    let opts = FragmentOptions {
        special: Some(&toy_hook),
        ..Default::default()
    };
    let items = parse_fragment(&mut scanner, &opts).unwrap();
    match &items[0] {
        Node::Tag(a) => match a.attrs.get("href") {
            Some(Node::Seq(parts)) => {
                assert_eq!(parts[0], Node::text("/u/"));
                assert!(matches!(&parts[1], Node::Special(_)));
            }
            other => panic!("expected composite value, got {:?}", other),
        },
        _ => panic!("expected a"),
    }
}

#[test]
fn whole_attribute_specials_collect_under_specials_key() {
    let mut scanner = Scanner::new("<div {{attrs}}>x</div>");
    let opts = FragmentOptions {
        special: Some(&toy_hook),
        ..Default::default()
    };
    let items = parse_fragment(&mut scanner, &opts).unwrap();
    match &items[0] {
        Node::Tag(div) => match div.attrs.get(whisker_html::SPECIALS_KEY) {
            Some(Node::Seq(specials)) => {
                assert_eq!(specials.len(), 1);
                assert!(matches!(&specials[0], Node::Special(_)));
            }
            other => panic!("expected $specials, got {:?}", other),
        },
        _ => panic!("expected div"),
    }
}

fn stop_at_block_close(s: &Scanner) -> bool {
    s.rest().starts_with("{{/")
}

#[test]
fn should_stop_halts_content() {
    let mut scanner = Scanner::new("abc{{/if}}");
    let opts = FragmentOptions {
        should_stop: Some(&stop_at_block_close),
        ..Default::default()
    };
    let items = parse_fragment(&mut scanner, &opts).unwrap();
    assert_eq!(items, vec![Node::text("abc")]);
    assert_eq!(scanner.rest(), "{{/if}}");
}

#[test]
fn static_tree_round_trips_through_to_html() {
    let src = "<div class=\"a\"><p>one</p><br><p>two</p></div>";
    let items = parse(src);
    let html = to_html(&Node::from_items(items));
    assert_eq!(html, src);
    // parse the rendered HTML again: same tree
    let again = parse(&html);
    assert_eq!(parse(src), again);
}
