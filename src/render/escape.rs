// Named escapes applied to attribute values and raw content.
//
// Every escape is a pure string-to-string filter. The registry is scoped to
// a parser instance; user escapes merge over these defaults. The default
// escape, which is also the fallback for unknown names, is `html`.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

/// A named escape: a pure string filter.
pub type EscapeFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// HTML entity-escape `< > & " '`.
///
/// Deliberately not idempotent: escaping twice double-escapes, because the
/// filter has no way to know whether an ampersand already begins an entity.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Bytes kept verbatim by the `uri` escape: the RFC 3986 unreserved set.
/// Space is excluded here and rewritten to `+` afterwards.
const URI_KEEP: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b' ');

fn escape_uri(input: &str) -> String {
    let encoded = utf8_percent_encode(input, URI_KEEP).to_string();
    escape_html(&encoded.replace(' ', "+"))
}

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:/|[A-Za-z][A-Za-z0-9+.\-]*://)").unwrap());

/// Accept absolute paths and `scheme://` references; anything else is
/// dropped rather than emitted into an href.
fn escape_link(input: &str) -> String {
    if LINK_RE.is_match(input) {
        escape_html(input)
    } else {
        String::new()
    }
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
});

fn escape_email(input: &str) -> String {
    if EMAIL_RE.is_match(input) {
        escape_html(input)
    } else {
        String::new()
    }
}

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap());

static COLOR_NAMES: phf::Set<&'static str> = phf::phf_set! {
    "aqua", "black", "blue", "fuchsia", "gray", "green", "lime", "maroon",
    "navy", "olive", "orange", "purple", "red", "silver", "teal", "white",
    "yellow",
};

fn escape_htmlcolor(input: &str) -> String {
    if HEX_COLOR_RE.is_match(input) || COLOR_NAMES.contains(input.to_ascii_lowercase().as_str()) {
        escape_html(input)
    } else {
        String::new()
    }
}

static NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+(?:\.\d+)?$").unwrap());

fn escape_num(input: &str) -> String {
    if NUM_RE.is_match(input) {
        input.to_string()
    } else {
        String::new()
    }
}

/// The per-parser escape table.
pub(crate) struct EscapeRegistry {
    map: HashMap<String, EscapeFn>,
}

impl EscapeRegistry {
    pub(crate) fn with_defaults(user: HashMap<String, EscapeFn>) -> Self {
        let mut map: HashMap<String, EscapeFn> = HashMap::new();
        map.insert("html".to_string(), Arc::new(escape_html));
        map.insert("uri".to_string(), Arc::new(escape_uri));
        map.insert("link".to_string(), Arc::new(escape_link));
        map.insert("email".to_string(), Arc::new(escape_email));
        map.insert("htmlcolor".to_string(), Arc::new(escape_htmlcolor));
        map.insert("num".to_string(), Arc::new(escape_num));
        map.insert("noescape".to_string(), Arc::new(|s: &str| s.to_string()));
        map.extend(user);
        Self { map }
    }

    /// Apply the named escape; unknown names fall back to `html`.
    pub(crate) fn apply(&self, name: &str, input: &str) -> String {
        match self.map.get(name) {
            Some(escape) => escape.as_ref()(input),
            None => escape_html(input),
        }
    }
}
