// Reference scenarios exercised against the default HTML tag set.

use bbcode2html::{defaults, render, render_with, Options, Parser, TagDef};
use pretty_assertions::assert_eq;

fn html_options() -> Options {
    Options::new().with_tags(defaults::html_tags())
}

#[test]
fn bold_text() {
    assert_eq!(render("[b]hello[/b]").unwrap(), "<b>hello</b>");
}

#[test]
fn markup_in_content_is_escaped() {
    assert_eq!(
        render("[b]bold<html>[/b]").unwrap(),
        "<b>bold&lt;html&gt;</b>"
    );
}

#[test]
fn url_with_path_attribute() {
    assert_eq!(
        render("[url=/foo.html]a link[/url]").unwrap(),
        "<a href=\"/foo.html\" rel=\"nofollow\">a link</a>"
    );
}

#[test]
fn noparse_preserves_inner_markup() {
    assert_eq!(
        render("[noparse] [b]x[/b] [/noparse]").unwrap(),
        "<pre> [b]x[/b] </pre>"
    );
}

#[test]
fn unclosed_tag_stays_literal_by_default() {
    let mut parser = Parser::new(html_options());
    assert_eq!(parser.render("[b]open").unwrap(), "[b]open");
    assert_eq!(parser.error(), ["b"]);
}

#[test]
fn unclosed_tag_gets_synthesized_closer_when_enabled() {
    let mut parser = Parser::new(html_options().with_close_open_tags(true));
    assert_eq!(parser.render("[b]open").unwrap(), "<b>open</b>");
    assert_eq!(parser.error(), ["b"]);
}

#[test]
fn custom_url_tag_with_uri_escape() {
    let options = html_options().with_tag(
        "wikipedia",
        TagDef::template(r#"url:<a href="http://w/?q=%{uri}A">%{parse}s</a>"#),
    );
    assert_eq!(
        render_with("[wikipedia]Harold & Maude[/wikipedia]", options).unwrap(),
        "<a href=\"http://w/?q=Harold+%26+Maude\">Harold &amp; Maude</a>"
    );
}

#[test]
fn numeric_attribute() {
    assert_eq!(
        render("[size=7]big[/size]").unwrap(),
        "<font size=\"7\">big</font>"
    );
}

#[test]
fn malformed_attributes_echo_the_whole_tag() {
    let options = html_options().with_tag("foo", TagDef::template("<foo>%s</foo>"));
    let mut parser = Parser::new(options);
    assert_eq!(
        parser.render("[foo=bar far boo]x[/foo]").unwrap(),
        "[foo=bar far boo]x[/foo]"
    );
    assert_eq!(parser.error(), ["foo"]);
}
