// BBCode scanner + tree builder.
//
// A single pass over a byte cursor. Text accumulates until the next `[`;
// bracketed tokens are recognized as classic opens, closers, or short tags,
// and anything malformed degrades to literal text one character at a time.
// An explicit open-tag stack carries partially built tags, enforces the
// nesting-class policy, and drives the `close_open_tags` recovery strategy.

pub(crate) mod attributes;

use std::collections::HashMap;

use crate::tree::{Attributes, Node, Tag, TagClass, Tree};
use crate::{Parser, TagDef};

/// Parse `input` against the parser's definitions. Returns the tree and the
/// names flagged unparsed or auto-closed.
pub(crate) fn scan(parser: &Parser, input: &str) -> (Tree, Vec<String>) {
    let mut scanner = Scanner {
        parser,
        input,
        pos: 0,
        text: String::new(),
        stack: Vec::new(),
        root: Vec::new(),
        nums: HashMap::new(),
        errors: Vec::new(),
    };
    scanner.run();
    (
        Tree {
            children: scanner.root,
        },
        scanner.errors,
    )
}

struct Scanner<'a> {
    parser: &'a Parser,
    input: &'a str,
    pos: usize,
    /// Pending text run; flushed into the current parent at tag events.
    text: String,
    stack: Vec<Tag>,
    root: Vec<Node>,
    nums: HashMap<String, usize>,
    errors: Vec<String>,
}

/// Length of a tag-name prefix: ASCII alphanumerics plus `*`, `_`, `-`.
fn name_len(s: &str) -> usize {
    s.bytes()
        .take_while(|&b| b.is_ascii_alphanumeric() || matches!(b, b'*' | b'_' | b'-'))
        .count()
}

impl<'a> Scanner<'a> {
    fn run(&mut self) {
        let input = self.input;
        while self.pos < input.len() {
            match memchr::memchr(b'[', &input.as_bytes()[self.pos..]) {
                None => {
                    self.text.push_str(&input[self.pos..]);
                    self.pos = input.len();
                }
                Some(offset) => {
                    self.text.push_str(&input[self.pos..self.pos + offset]);
                    self.pos += offset;
                    self.bracket();
                }
            }
        }
        self.finish();
    }

    /// Handle the `[` at the cursor. Unrecognizable tokens emit the bracket
    /// as literal text and rescan from the next character, so unknown tags
    /// survive verbatim while their contents still parse.
    fn bracket(&mut self) {
        let input = self.input;
        let consumed = if input[self.pos..].starts_with("[/") {
            self.close_tag()
        } else {
            self.open_tag()
        };
        if !consumed {
            self.text.push('[');
            self.pos += 1;
        }
    }

    fn open_tag(&mut self) -> bool {
        let parser = self.parser;
        let input = self.input;
        let rest = &input[self.pos..];
        let len = name_len(&rest[1..]);
        if len == 0 {
            return false;
        }
        let name = &rest[1..1 + len];
        let after = &rest[1 + len..];

        let Some(def) = parser.tag_def(name) else {
            return false;
        };

        if after.starts_with("://") {
            return def.short && self.short_tag(name, def, 1 + len + 3);
        }
        if !def.classic {
            return false;
        }
        // A classic tag start requires `=`, `]`, or whitespace after the name.
        match after.bytes().next() {
            Some(b'=') | Some(b']') => {}
            Some(b) if b.is_ascii_whitespace() => {}
            _ => return false,
        }
        self.classic_tag(name, def, after)
    }

    fn classic_tag(&mut self, name: &'a str, def: &TagDef, after: &'a str) -> bool {
        let parser = self.parser;
        let outcome = match &parser.options.attribute_parser {
            Some(custom) => custom.as_ref()(after, name),
            None => attributes::parse_attributes(parser.attr_config(), after, name),
        };

        let open_len = 1 + name.len() + outcome.consumed;
        let raw_open = &self.input[self.pos..self.pos + open_len];

        if !outcome.valid && parser.options.strict_attributes {
            // The whole tag is rejected; its consumed token text is literal.
            self.text.push_str(raw_open);
            self.pos += open_len;
            self.record_error(name);
            return true;
        }

        // A definition that never emits a closer is closed implicitly by a
        // same-name sibling.
        if !def.close && self.stack.last().is_some_and(|t| t.name == name) {
            self.flush_text();
            self.pop_frame();
        }

        if !self.class_policy(name, def, raw_open, open_len) {
            return true;
        }

        self.flush_text();
        self.pos += open_len;

        let mut start_delim = raw_open.to_string();
        if !def.single && self.strips(def) {
            // A block tag swallows one newline straight after its opener.
            if self.input[self.pos..].starts_with("\r\n") {
                start_delim.push_str("\r\n");
                self.pos += 2;
            } else if self.input[self.pos..].starts_with('\n') {
                start_delim.push('\n');
                self.pos += 1;
            }
        }

        let tag = Tag {
            name: name.to_string(),
            attributes: outcome.attributes,
            start_delim,
            end_delim: String::new(),
            children: Vec::new(),
            closed: false,
            single: def.single,
            short: false,
            class: def.class,
            num: self.next_num(name),
        };

        if def.single {
            let mut tag = tag;
            tag.closed = true;
            self.append(Node::Tag(tag));
            return true;
        }
        if !def.parse {
            self.verbatim(tag, name, def);
            return true;
        }
        self.stack.push(tag);
        true
    }

    /// Copy input verbatim up to the first `[/name]`. A nested same-name
    /// opener is literal; a nested closer ends the tag immediately.
    fn verbatim(&mut self, mut tag: Tag, name: &str, def: &TagDef) {
        let closer = format!("[/{name}]");
        let rest = &self.input[self.pos..];
        match memchr::memmem::find(rest.as_bytes(), closer.as_bytes()) {
            Some(at) => {
                let mut content = &rest[..at];
                let mut end_delim = String::new();
                if self.strips(def) {
                    if let Some(stripped) = content.strip_suffix('\n') {
                        let (stripped, eol) = match stripped.strip_suffix('\r') {
                            Some(s) => (s, "\r\n"),
                            None => (stripped, "\n"),
                        };
                        content = stripped;
                        end_delim.push_str(eol);
                    }
                }
                if !content.is_empty() {
                    tag.children.push(Node::Text(content.to_string()));
                }
                end_delim.push_str(&closer);
                tag.end_delim = end_delim;
                tag.closed = true;
                self.pos += at + closer.len();
                self.append(Node::Tag(tag));
            }
            None => {
                // No closer anywhere: the rest of the input is raw content
                // and the frame stays open.
                if !rest.is_empty() {
                    tag.children.push(Node::Text(rest.to_string()));
                }
                self.pos = self.input.len();
                self.record_error(name);
                self.append(Node::Tag(tag));
            }
        }
    }

    fn short_tag(&mut self, name: &'a str, def: &TagDef, body_off: usize) -> bool {
        let rest = &self.input[self.pos..];
        let after = &rest[body_off..];
        let bytes = after.as_bytes();

        let mut body_end = 0;
        while bytes
            .get(body_end)
            .is_some_and(|&b| !matches!(b, b'|' | b']'))
        {
            body_end += 1;
        }
        if body_end == 0 || body_end == bytes.len() {
            return false;
        }
        let body = &after[..body_end];
        let (title, token_end) = if bytes[body_end] == b'|' {
            let title_start = body_end + 1;
            let title_len = memchr::memchr(b']', &bytes[title_start..]);
            match title_len {
                Some(len) => (&after[title_start..title_start + len], title_start + len + 1),
                None => return false,
            }
        } else {
            ("", body_end + 1)
        };

        let open_len = body_off + token_end;
        let raw = &rest[..open_len];
        if !self.class_policy(name, def, raw, open_len) {
            return true;
        }

        self.flush_text();
        // The body reconstructs with the name as its scheme, so link-style
        // escapes accept it (`[https://example.com|Example]`).
        let fallback = format!("{name}://{body}");
        let text = if title.is_empty() {
            fallback.clone()
        } else {
            title.to_string()
        };
        let tag = Tag {
            name: name.to_string(),
            attributes: Attributes {
                fallback,
                named: Vec::new(),
                raw: String::new(),
            },
            start_delim: raw.to_string(),
            end_delim: String::new(),
            children: vec![Node::Text(text)],
            closed: true,
            single: false,
            short: true,
            class: def.class,
            num: self.next_num(name),
        };
        self.pos += open_len;
        self.append(Node::Tag(tag));
        true
    }

    fn close_tag(&mut self) -> bool {
        let parser = self.parser;
        let input = self.input;
        let rest = &input[self.pos..];
        let len = name_len(&rest[2..]);
        if len == 0 {
            return false;
        }
        let name_end = 2 + len;
        if rest.as_bytes().get(name_end) != Some(&b']') {
            return false;
        }
        let name = &rest[2..name_end];
        let raw = &rest[..name_end + 1];

        let Some(target) = self.stack.iter().rposition(|t| t.name == name) else {
            // Unbalanced close: literal text.
            return false;
        };

        // Frames above the target close silently when their definitions
        // never emit a closer; otherwise auto-closing them is a recovery
        // strategy that must be opted into.
        let silent_above = self.stack[target + 1..]
            .iter()
            .all(|t| parser.tag_def(&t.name).is_some_and(|d| !d.close));
        if !silent_above && !parser.options.close_open_tags {
            return false;
        }

        let mut end_delim = String::new();
        if self
            .parser
            .tag_def(name)
            .is_some_and(|d| self.strips(d))
        {
            // Give one trailing newline back to the closer.
            if self.text.ends_with('\n') {
                self.text.pop();
                if self.text.ends_with('\r') {
                    self.text.pop();
                    end_delim.push('\r');
                }
                end_delim.push('\n');
            }
        }
        end_delim.push_str(raw);

        self.flush_text();
        while self.stack.len() > target + 1 {
            self.pop_frame();
        }
        if let Some(mut tag) = self.stack.pop() {
            tag.closed = true;
            tag.end_delim = end_delim;
            self.append(Node::Tag(tag));
        }
        self.pos += raw.len();
        true
    }

    /// Apply the nesting-class policy to an open attempt. Returns false when
    /// the token was refused (and consumed as literal text).
    fn class_policy(&mut self, name: &str, def: &TagDef, raw: &str, open_len: usize) -> bool {
        let parser = self.parser;
        if def.class == TagClass::Url && self.stack.iter().any(|t| t.class == TagClass::Url) {
            self.text.push_str(raw);
            self.pos += open_len;
            self.record_error(name);
            return false;
        }
        if def.class == TagClass::Block {
            let barrier = self
                .stack
                .iter()
                .rposition(|t| t.class == TagClass::Block)
                .map_or(0, |at| at + 1);
            if self.stack[barrier..]
                .iter()
                .any(|t| t.class == TagClass::Inline)
            {
                if parser.options.close_open_tags {
                    self.flush_text();
                    while self.stack.len() > barrier {
                        self.pop_frame();
                    }
                } else {
                    self.text.push_str(raw);
                    self.pos += open_len;
                    self.record_error(name);
                    return false;
                }
            }
        }
        true
    }

    /// Pop the top frame with a synthesized closer: silently for
    /// no-closer definitions, as a recorded recovery otherwise.
    fn pop_frame(&mut self) {
        let parser = self.parser;
        if let Some(mut tag) = self.stack.pop() {
            if parser.tag_def(&tag.name).is_some_and(|d| !d.close) {
                tag.closed = true;
            } else if parser.options.close_open_tags {
                tag.closed = true;
                self.record_error(&tag.name);
            } else {
                self.record_error(&tag.name);
            }
            self.append(Node::Tag(tag));
        }
    }

    fn finish(&mut self) {
        self.flush_text();
        while !self.stack.is_empty() {
            self.pop_frame();
        }
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.append(Node::Text(text));
        }
    }

    fn append(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn strips(&self, def: &TagDef) -> bool {
        self.parser.options.strip_linebreaks && def.class == TagClass::Block
    }

    fn next_num(&mut self, name: &str) -> usize {
        let counter = self.nums.entry(name.to_string()).or_insert(0);
        let num = *counter;
        *counter += 1;
        num
    }

    fn record_error(&mut self, name: &str) {
        if !self.errors.iter().any(|n| n == name) {
            self.errors.push(name.to_string());
        }
    }
}
