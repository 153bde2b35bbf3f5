// Free-text processing pipeline.
//
// Eligible text runs pass through, in order: smiley substitution, URL
// detection, HTML escaping (or the user's text processor in its place), and
// line-break conversion. Stage output is held in finished segments so later
// stages never touch markup produced by earlier ones.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::RenderError;
use crate::tree::{Attributes, Tag, TagClass};
use crate::{Output, Parser, Smileys, UrlFinder};

use super::escape::escape_html;
use super::{CallbackContext, RenderInfo};

/// Stand-in tag handed to a text-handler callback; the empty name is
/// reserved for it.
static TEXT_TAG: LazyLock<Tag> = LazyLock::new(|| Tag {
    name: String::new(),
    attributes: Attributes::default(),
    start_delim: String::new(),
    end_delim: String::new(),
    children: Vec::new(),
    closed: true,
    single: false,
    short: false,
    class: TagClass::Inline,
    num: 0,
});

enum Segment {
    /// Still subject to later stages.
    Plain(String),
    /// Finished markup; spliced back in untouched.
    Done(String),
}

/// Run the pipeline over one text run.
pub(crate) fn process(
    parser: &Parser,
    info: &RenderInfo<'_>,
    input: &str,
) -> Result<String, RenderError> {
    // A callback registered under the empty-name pseudo-tag replaces the
    // whole pipeline.
    if let Some(def) = parser.tag_def("") {
        if let Output::Callback(callback) = &def.output {
            let ctx = CallbackContext {
                parser,
                attr: "",
                content: input,
                tag: &TEXT_TAG,
                info,
            };
            return callback.as_ref()(&ctx).map_err(|source| RenderError::Callback {
                tag: String::new(),
                source,
            });
        }
    }

    let mut segments = vec![Segment::Plain(input.to_string())];

    if let (Some(smileys), Some(re)) = (&parser.options.smileys, &parser.smiley_re) {
        segments = smiley_pass(smileys, re, segments);
    }
    if let Some(finder) = &parser.options.url_finder {
        if info.classes.url == 0 {
            segments = url_pass(finder, segments);
        }
    }
    for segment in &mut segments {
        if let Segment::Plain(text) = segment {
            *text = match &parser.options.text_processor {
                Some(processor) => processor.as_ref()(text),
                None => escape_html(text),
            };
        }
    }
    if parser.options.linebreaks {
        for segment in &mut segments {
            if let Segment::Plain(text) = segment {
                *text = text
                    .replace("\r\n", "\n")
                    .replace('\r', "\n")
                    .replace('\n', "<br>\n");
            }
        }
    }

    let mut out = String::with_capacity(input.len());
    for segment in segments {
        match segment {
            Segment::Plain(text) | Segment::Done(text) => out.push_str(&text),
        }
    }
    Ok(out)
}

/// Compile the smiley alternation, longest key first so longer smileys win
/// at a shared prefix. Returns None when no icons are configured.
pub(crate) fn build_smiley_regex(smileys: &Smileys) -> Option<Regex> {
    if smileys.icons.is_empty() {
        return None;
    }
    let mut keys: Vec<&str> = smileys.icons.keys().map(String::as_str).collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let pattern = keys
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Some(Regex::new(&pattern).unwrap())
}

/// Left-to-right, non-overlapping smiley replacement. A smiley only matches
/// when flanked by whitespace or the ends of the run.
fn smiley_pass(smileys: &Smileys, re: &Regex, segments: Vec<Segment>) -> Vec<Segment> {
    map_plain(segments, |text| {
        let mut out = Vec::new();
        let mut last = 0;
        for m in re.find_iter(text) {
            let before_ok = text[..m.start()]
                .chars()
                .next_back()
                .map_or(true, char::is_whitespace);
            let after_ok = text[m.end()..]
                .chars()
                .next()
                .map_or(true, char::is_whitespace);
            if !before_ok || !after_ok {
                continue;
            }
            let Some(icon) = smileys.icons.get(m.as_str()) else {
                continue;
            };
            push_plain(&mut out, &text[last..m.start()]);
            let src = format!("{}{}", smileys.base_url, icon);
            out.push(Segment::Done(fill(
                &smileys.format,
                [&escape_html(&src), &escape_html(m.as_str())],
            )));
            last = m.end();
        }
        push_plain(&mut out, &text[last..]);
        out
    })
}

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:[a-z][a-z0-9+.-]*://|www\.)[^\s<>"\[\]]+"#).unwrap()
});

/// Detect bare URLs in unescaped text and replace them with rendered links.
fn url_pass(finder: &UrlFinder, segments: Vec<Segment>) -> Vec<Segment> {
    map_plain(segments, |text| {
        let mut out = Vec::new();
        let mut last = 0;
        for m in URL_RE.find_iter(text) {
            // Sentence punctuation after a URL is prose, not address.
            let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
            if url.is_empty() {
                continue;
            }
            let end = m.start() + url.len();
            push_plain(&mut out, &text[last..m.start()]);
            let href = if url.len() >= 4 && url[..4].eq_ignore_ascii_case("www.") {
                format!("http://{url}")
            } else {
                url.to_string()
            };
            let mut title = url.to_string();
            if finder.max_length > 0 && title.chars().count() > finder.max_length {
                title = title.chars().take(finder.max_length).collect();
                title.push_str("...");
            }
            out.push(Segment::Done(fill(
                &finder.format,
                [&escape_html(&href), &escape_html(&title)],
            )));
            last = end;
        }
        push_plain(&mut out, &text[last..]);
        out
    })
}

fn map_plain(segments: Vec<Segment>, f: impl Fn(&str) -> Vec<Segment>) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Plain(text) => out.extend(f(&text)),
            done => out.push(done),
        }
    }
    out
}

fn push_plain(out: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        out.push(Segment::Plain(text.to_string()));
    }
}

/// Substitute the `%s` slots of a format string in order.
fn fill(format: &str, values: [&str; 2]) -> String {
    let mut out = String::with_capacity(format.len() + values[0].len() + values[1].len());
    let mut rest = format;
    let mut slot = 0;
    while let Some(at) = rest.find("%s") {
        out.push_str(&rest[..at]);
        out.push_str(values.get(slot).copied().unwrap_or(""));
        slot += 1;
        rest = &rest[at + 2..];
    }
    out.push_str(rest);
    out
}
