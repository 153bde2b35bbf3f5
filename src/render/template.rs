// Format-string template interpretation.
//
// Directives: `%s` (content), `%a` (fallback attribute), `%A` (fallback
// attribute, or raw content when the fallback is empty), each optionally
// qualified as `%{name}s` where `name` is `parse`, `noescape`, or a
// registered escape. `%%` is a literal percent sign; anything else after
// `%` is copied through verbatim.

use crate::error::RenderError;
use crate::tree::Tag;
use crate::TagDef;

use super::escape::escape_html;
use super::Walker;

enum Directive {
    /// `%s`
    Content,
    /// `%a`
    Attr,
    /// `%A`
    AttrOrContent,
}

/// Parse one directive following a `%`. Returns the qualifier, the kind,
/// and the number of bytes consumed after the `%`.
fn directive(rest: &str) -> Option<(Option<&str>, Directive, usize)> {
    if let Some(braced) = rest.strip_prefix('{') {
        let close = braced.find('}')?;
        let kind = kind(*braced.as_bytes().get(close + 1)?)?;
        Some((Some(&braced[..close]), kind, close + 3))
    } else {
        let kind = kind(*rest.as_bytes().first()?)?;
        Some((None, kind, 1))
    }
}

fn kind(byte: u8) -> Option<Directive> {
    match byte {
        b's' => Some(Directive::Content),
        b'a' => Some(Directive::Attr),
        b'A' => Some(Directive::AttrOrContent),
        _ => None,
    }
}

/// Interpret a tag's template. `content` is the pre-rendered children when
/// the definition parses them, the raw content otherwise; it is bound
/// before any directive is substituted.
pub(crate) fn interpret<'a>(
    walker: &mut Walker<'a>,
    template: &str,
    tag: &'a Tag,
    def: &TagDef,
    content: &str,
) -> Result<String, RenderError> {
    let parser = walker.parser;
    let mut out = String::with_capacity(template.len() + content.len());
    let mut rest = template;

    while let Some(at) = rest.find('%') {
        out.push_str(&rest[..at]);
        rest = &rest[at + 1..];
        if let Some(tail) = rest.strip_prefix('%') {
            out.push('%');
            rest = tail;
            continue;
        }
        let Some((qualifier, kind, used)) = directive(rest) else {
            out.push('%');
            continue;
        };
        let value = match kind {
            Directive::Content => match qualifier {
                None => {
                    if def.parse {
                        content.to_string()
                    } else {
                        escape_html(&tag.content())
                    }
                }
                Some("parse") => {
                    if def.parse {
                        content.to_string()
                    } else {
                        walker.render_nodes(&tag.children)?
                    }
                }
                Some("noescape") => tag.content(),
                Some(name) => parser.escapes().apply(name, &tag.content()),
            },
            Directive::Attr => parser
                .escapes()
                .apply(qualifier.unwrap_or("html"), tag.attr()),
            Directive::AttrOrContent => {
                let subject = if tag.attr().is_empty() {
                    tag.content()
                } else {
                    tag.attr().to_string()
                };
                parser
                    .escapes()
                    .apply(qualifier.unwrap_or("html"), &subject)
            }
        };
        out.push_str(&value);
        rest = &rest[used..];
    }
    out.push_str(rest);
    Ok(out)
}
