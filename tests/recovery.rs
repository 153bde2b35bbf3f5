// Recovery-path tests: unbalanced, mis-nested, and malformed input must
// render without aborting, and every recovery must be observable through
// `error()` and `raw_text()`.

use bbcode2html::{defaults, render, Options, Parser};
use pretty_assertions::assert_eq;

fn html_parser() -> Parser {
    Parser::with_html_defaults()
}

/// An unmatched closer is plain prose, not an error.
#[test]
fn stray_closer_is_literal() {
    let mut parser = html_parser();
    assert_eq!(parser.render("x[/b]y").unwrap(), "x[/b]y");
    assert!(parser.error().is_empty());
}

/// Undefined names keep their delimiters while inner markup still renders.
#[test]
fn unknown_tag_keeps_delimiters_but_children_render() {
    let mut parser = html_parser();
    assert_eq!(
        parser.render("[foo][b]x[/b][/foo]").unwrap(),
        "[foo]<b>x</b>[/foo]"
    );
    assert!(parser.error().is_empty());
}

/// Interleaved closers: the mismatched closer degrades to text and the
/// outer frame is reported open.
#[test]
fn interleaved_tags_default_recovery() {
    let mut parser = html_parser();
    assert_eq!(
        parser.render("[b][i]x[/b][/i]").unwrap(),
        "[b]<i>x[/b]</i>"
    );
    assert_eq!(parser.error(), ["b"]);
}

/// Interleaved closers with synthesized closing: ancestors above the
/// matched frame close, the leftover closer is text.
#[test]
fn interleaved_tags_with_auto_close() {
    let mut parser = Parser::new(
        Options::new()
            .with_tags(defaults::html_tags())
            .with_close_open_tags(true),
    );
    assert_eq!(
        parser.render("[b][i]x[/b][/i]").unwrap(),
        "<b><i>x</i></b>[/i]"
    );
    assert_eq!(parser.error(), ["i"]);
}

/// A url-class tag never gains a url-class descendant; the inner open is
/// left as text.
#[test]
fn url_inside_url_is_refused() {
    let mut parser = html_parser();
    assert_eq!(
        parser.render("[url=/a][url=/b]x[/url][/url]").unwrap(),
        "<a href=\"/a\" rel=\"nofollow\">[url=/b]x</a>[/url]"
    );
    assert_eq!(parser.error(), ["url"]);
}

/// A block tag under an inline ancestor is refused outright by default.
#[test]
fn block_inside_inline_is_refused_by_default() {
    let mut parser = html_parser();
    assert_eq!(
        parser.render("[b][quote]x[/quote][/b]").unwrap(),
        "<b>[quote]x[/quote]</b>"
    );
    assert_eq!(parser.error(), ["quote"]);
}

/// With auto-closing, the inline ancestors are closed and the block opens
/// at the top level.
#[test]
fn block_inside_inline_closes_ancestors_when_enabled() {
    let mut parser = Parser::new(
        Options::new()
            .with_tags(defaults::html_tags())
            .with_close_open_tags(true),
    );
    assert_eq!(
        parser.render("[b]x[quote]y[/quote]").unwrap(),
        "<b>x</b><blockquote>y</blockquote>"
    );
    assert_eq!(parser.error(), ["b"]);
}

/// A verbatim tag with no closer anywhere keeps its raw delimiters.
#[test]
fn verbatim_without_closer_renders_raw() {
    let mut parser = html_parser();
    assert_eq!(parser.render("[code]a [b]").unwrap(), "[code]a [b]");
    assert_eq!(parser.error(), ["code"]);
}

/// Inside a verbatim tag a nested closer ends it immediately; the leftover
/// closer is prose.
#[test]
fn verbatim_nested_closer_cuts_short() {
    assert_eq!(
        render("[noparse]a[noparse]b[/noparse]c[/noparse]").unwrap(),
        "<pre>a[noparse]b</pre>c[/noparse]"
    );
}

/// Unterminated openers at end of input degrade to text.
#[test]
fn unterminated_opener_is_literal() {
    let mut parser = html_parser();
    assert_eq!(parser.render("a[b").unwrap(), "a[b");
    assert_eq!(parser.render("[size=7").unwrap(), "[size=7");
}

/// Empty bracket pairs never form tags.
#[test]
fn empty_brackets_are_literal() {
    assert_eq!(render("[]x[]").unwrap(), "[]x[]");
    assert_eq!(render("[/]").unwrap(), "[/]");
}

/// The error list resets on every parse.
#[test]
fn error_list_resets_between_parses() {
    let mut parser = html_parser();
    parser.render("[b]open").unwrap();
    assert_eq!(parser.error(), ["b"]);
    parser.render("[b]closed[/b]").unwrap();
    assert!(parser.error().is_empty());
}

/// Each offending name is reported once.
#[test]
fn error_names_are_deduplicated() {
    let mut parser = html_parser();
    parser.render("[b]a [b]b").unwrap();
    assert_eq!(parser.error(), ["b"]);
}

/// Every recovery path preserves the source text in the tree.
#[test]
fn raw_text_round_trips_through_recovery() {
    let inputs = [
        "",
        "plain",
        "[b]hello[/b]",
        "[b]open",
        "x[/b]y",
        "[b][i]x[/b][/i]",
        "[url=/a][url=/b]x[/url][/url]",
        "[b][quote]x[/quote][/b]",
        "[foo]bar[/foo]",
        "[size=bar far boo]x[/size]",
        "[code]a [b]",
        "[code]a[code]b[/code]c[/code]",
        "[quote]\nstripped\n[/quote]",
        "[list]\n[*]one\n[*]two\n[/list]",
        "[url://example.com|Example]",
        "[",
        "a[b",
        "[]",
        "[/]",
        "[b ]x[/b]",
        "[b=\"unterminated",
    ];
    for input in inputs {
        let mut parser = html_parser();
        assert_eq!(parser.parse(input).raw_text(), input, "input: {input:?}");
    }
}

/// Rendering is total: none of these panic or error.
#[test]
fn rendering_malformed_input_always_yields_a_string() {
    let inputs = [
        "[/[/[/",
        "[[[b]]]",
        "[b=]x[/b]",
        "[b =]x",
        "[url=][/url]",
        "[noparse][noparse][/noparse]",
        "[list][*][*][/list]",
        "]]][[[",
    ];
    for input in inputs {
        let mut parser = html_parser();
        let out = parser.render(input);
        assert!(out.is_ok(), "input: {input:?}");
    }
}
