// Attribute sub-grammar.
//
// Runs immediately after `[name` and consumes up to the matching `]`. Two
// dialects: direct (the tag name itself may carry `=value`) and indirect
// (named `key=value` pairs only). A non-conforming sequence makes the whole
// region fall through: the parser skips to the next `]` (or end of input)
// and reports `valid = false` with the skipped text preserved verbatim.

use std::sync::Arc;

use crate::tree::Attributes;

/// Which quote characters delimit quoted attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeQuote {
    /// `"` only, the default.
    #[default]
    Double,
    /// `'` only.
    Single,
    /// Either `"` or `'`.
    Both,
}

impl AttributeQuote {
    fn opens(self, byte: u8) -> bool {
        match self {
            AttributeQuote::Double => byte == b'"',
            AttributeQuote::Single => byte == b'\'',
            AttributeQuote::Both => byte == b'"' || byte == b'\'',
        }
    }
}

/// Outcome of an attribute-region parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAttributes {
    /// Whether the region conformed to the grammar.
    pub valid: bool,
    pub attributes: Attributes,
    /// Bytes consumed from the cursor, closing `]` included when present.
    pub consumed: usize,
    /// Whether a closing `]` was found before end of input.
    pub closed: bool,
}

/// Replaceable attribute-parser entry point.
///
/// Receives the text immediately following `[name` and the tag name, and
/// returns the region outcome. Installing one through
/// `Options::with_attribute_parser` swaps out the built-in grammar, e.g. to
/// accept an ad-hoc dialect for a particular tag.
pub type AttributeParserFn = Arc<dyn Fn(&str, &str) -> ParsedAttributes + Send + Sync>;

/// Dialect and quoting configuration for the built-in parser.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AttrConfig {
    pub direct: bool,
    pub quote: AttributeQuote,
}

/// The built-in attribute parser.
pub(crate) fn parse_attributes(cfg: AttrConfig, rest: &str, _tag_name: &str) -> ParsedAttributes {
    match try_parse(cfg, rest) {
        Some(parsed) => parsed,
        None => fall_through(rest),
    }
}

fn try_parse(cfg: AttrConfig, rest: &str) -> Option<ParsedAttributes> {
    let bytes = rest.as_bytes();
    let mut pos = 0;
    let mut attrs = Attributes::default();

    // Direct dialect: an immediate `=value` binds to the empty-key fallback.
    if cfg.direct && bytes.first() == Some(&b'=') {
        let (value, next) = scan_value(cfg, rest, 1)?;
        attrs.fallback = value;
        pos = next;
    }

    loop {
        let ws_start = pos;
        while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
            pos += 1;
        }
        match bytes.get(pos) {
            None => return None,
            Some(b']') => {
                attrs.raw = rest[..pos].to_string();
                return Some(ParsedAttributes {
                    valid: true,
                    attributes: attrs,
                    consumed: pos + 1,
                    closed: true,
                });
            }
            Some(&first) => {
                // A named pair must be separated from what precedes it.
                if pos == ws_start {
                    return None;
                }
                if !first.is_ascii_alphabetic() && first != b'_' {
                    return None;
                }
                let key_start = pos;
                pos += 1;
                while bytes
                    .get(pos)
                    .is_some_and(|&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-'))
                {
                    pos += 1;
                }
                if bytes.get(pos) != Some(&b'=') {
                    return None;
                }
                let key = rest[key_start..pos].to_string();
                let (value, next) = scan_value(cfg, rest, pos + 1)?;
                attrs.named.push((key, value));
                pos = next;
            }
        }
    }
}

/// Scan a quoted or unquoted value starting at `pos`. Quoted values may
/// contain spaces and the opposite quote character; there is no escape
/// mechanism, so a literal closing quote is unrepresentable.
fn scan_value(cfg: AttrConfig, rest: &str, pos: usize) -> Option<(String, usize)> {
    let bytes = rest.as_bytes();
    match bytes.get(pos) {
        Some(&q) if cfg.quote.opens(q) => {
            let start = pos + 1;
            let end = start + memchr::memchr(q, &bytes[start..])?;
            Some((rest[start..end].to_string(), end + 1))
        }
        Some(_) => {
            let start = pos;
            let mut end = pos;
            while bytes
                .get(end)
                .is_some_and(|b| !b.is_ascii_whitespace() && *b != b']')
            {
                end += 1;
            }
            if end == start {
                return None;
            }
            Some((rest[start..end].to_string(), end))
        }
        None => None,
    }
}

/// Skip to the next `]` (or end of input) and surrender the region.
fn fall_through(rest: &str) -> ParsedAttributes {
    let (raw_len, closed) = match memchr::memchr(b']', rest.as_bytes()) {
        Some(at) => (at, true),
        None => (rest.len(), false),
    };
    ParsedAttributes {
        valid: false,
        attributes: Attributes {
            raw: rest[..raw_len].to_string(),
            ..Attributes::default()
        },
        consumed: raw_len + usize::from(closed),
        closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct() -> AttrConfig {
        AttrConfig {
            direct: true,
            quote: AttributeQuote::Double,
        }
    }

    fn indirect() -> AttrConfig {
        AttrConfig {
            direct: false,
            quote: AttributeQuote::Double,
        }
    }

    #[test]
    fn empty_region() {
        let parsed = parse_attributes(direct(), "]rest", "b");
        assert!(parsed.valid);
        assert_eq!(parsed.consumed, 1);
        assert_eq!(parsed.attributes.fallback, "");
        assert_eq!(parsed.attributes.raw, "");
    }

    #[test]
    fn direct_fallback_value() {
        let parsed = parse_attributes(direct(), "=/foo.html]link", "url");
        assert!(parsed.valid);
        assert_eq!(parsed.attributes.fallback, "/foo.html");
        assert_eq!(parsed.attributes.raw, "=/foo.html");
        assert_eq!(parsed.consumed, "=/foo.html]".len());
    }

    #[test]
    fn fallback_plus_named_pairs() {
        let parsed = parse_attributes(direct(), "=u.png width=100 height=40]", "img");
        assert!(parsed.valid);
        assert_eq!(parsed.attributes.fallback, "u.png");
        assert_eq!(
            parsed.attributes.named,
            vec![
                ("width".to_string(), "100".to_string()),
                ("height".to_string(), "40".to_string()),
            ]
        );
    }

    #[test]
    fn quoted_value_keeps_spaces_and_opposite_quote() {
        let parsed = parse_attributes(direct(), "=\"John Doe's\"]", "quote");
        assert!(parsed.valid);
        assert_eq!(parsed.attributes.fallback, "John Doe's");
    }

    #[test]
    fn single_quote_config() {
        let cfg = AttrConfig {
            direct: true,
            quote: AttributeQuote::Single,
        };
        let parsed = parse_attributes(cfg, "='a \"b\"']", "quote");
        assert!(parsed.valid);
        assert_eq!(parsed.attributes.fallback, "a \"b\"");
    }

    #[test]
    fn indirect_refuses_direct_value() {
        let parsed = parse_attributes(indirect(), "=red]", "color");
        assert!(!parsed.valid);
        assert_eq!(parsed.attributes.raw, "=red");
        assert!(parsed.closed);
    }

    #[test]
    fn indirect_named_pairs() {
        let parsed = parse_attributes(indirect(), " name=John cite=x]", "quote");
        assert!(parsed.valid);
        assert_eq!(parsed.attributes.fallback, "");
        assert_eq!(parsed.attributes.get("name"), Some("John"));
        assert_eq!(parsed.attributes.get("cite"), Some("x"));
    }

    #[test]
    fn bare_word_falls_through() {
        let parsed = parse_attributes(direct(), "=bar far boo]x", "foo");
        assert!(!parsed.valid);
        assert_eq!(parsed.attributes.raw, "=bar far boo");
        assert!(parsed.closed);
        assert_eq!(parsed.consumed, "=bar far boo]".len());
        assert_eq!(parsed.attributes.to_pairs(), vec![(String::new(), String::new())]);
    }

    #[test]
    fn unterminated_region_reports_no_close() {
        let parsed = parse_attributes(direct(), "=x far", "b");
        assert!(!parsed.valid);
        assert!(!parsed.closed);
        assert_eq!(parsed.attributes.raw, "=x far");
        assert_eq!(parsed.consumed, "=x far".len());
    }

    #[test]
    fn unterminated_quote_falls_through() {
        let parsed = parse_attributes(direct(), "=\"no end]", "quote");
        assert!(!parsed.valid);
        assert_eq!(parsed.attributes.raw, "=\"no end");
        assert!(parsed.closed);
    }

    #[test]
    fn value_glued_to_bracket() {
        let parsed = parse_attributes(direct(), "=7]big", "size");
        assert!(parsed.valid);
        assert_eq!(parsed.attributes.fallback, "7");
        assert_eq!(parsed.consumed, 3);
    }
}
