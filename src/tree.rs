// BBCode tree node types.
//
// A parse produces a `Tree` of `Node`s: runs of plain text interleaved with
// `Tag` nodes. Parent tags own their children; there are no parent pointers.
// Every node keeps enough verbatim source text that the in-order
// reconstruction (`raw_text`) reproduces the original input byte for byte.

/// Nesting class of a tag; constrains legal ancestry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagClass {
    /// Phrasing-level content, the default.
    #[default]
    Inline,
    /// Block-level content. Never rendered as a descendant of an inline tag.
    Block,
    /// Link-like content. Never nests inside another url-class tag.
    Url,
}

/// Parsed attribute region of a tag.
///
/// The value following `=` on the tag name itself is the `fallback`; named
/// `key=value` pairs follow in source order. `raw` preserves the verbatim
/// attribute text so a refused tag can be reconstructed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attributes {
    /// The value bound directly to the tag name (`[tag=fallback]`), or
    /// empty.
    pub fallback: String,
    /// Named pairs in source order.
    pub named: Vec<(String, String)>,
    /// Verbatim attribute-region text, closing bracket excluded.
    pub raw: String,
}

impl Attributes {
    /// Ordered pair-list view: `("", fallback)` first, then the named pairs
    /// in source order.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.named.len() + 1);
        pairs.push((String::new(), self.fallback.clone()));
        pairs.extend(self.named.iter().cloned());
        pairs
    }

    /// Look up a named attribute by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.named
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A tag node.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    /// Tag name as written in the source. Matched case-sensitively against
    /// the definition table. The empty name is reserved for the text
    /// handler pseudo-tag and never appears in a parsed tree.
    pub name: String,
    pub attributes: Attributes,
    /// Verbatim opening token text, brackets included. Short tags store the
    /// whole token here. A newline swallowed by linebreak stripping is
    /// appended so reconstruction stays exact.
    pub start_delim: String,
    /// Verbatim closing token text, or empty while unclosed.
    pub end_delim: String,
    pub children: Vec<Node>,
    /// Whether a matching closer was observed (or synthesized).
    pub closed: bool,
    /// Declared void: no content, no closer.
    pub single: bool,
    /// Parsed from the `[name://body|title]` form.
    pub short: bool,
    pub class: TagClass,
    /// Per-name occurrence counter assigned at parse time; the first
    /// occurrence is 0.
    pub num: usize,
}

impl Tag {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num(&self) -> usize {
        self.num
    }

    /// The fallback attribute value.
    pub fn attr(&self) -> &str {
        &self.attributes.fallback
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Concatenated verbatim source of the children.
    pub fn content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_raw(&mut out);
        }
        out
    }

    /// Reconstruct the verbatim source of this tag, delimiters included.
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        self.write_raw(&mut out);
        out
    }

    pub(crate) fn write_raw(&self, out: &mut String) {
        // A short tag's children are synthetic (the title text); the token
        // itself lives in start_delim.
        if self.short {
            out.push_str(&self.start_delim);
            return;
        }
        out.push_str(&self.start_delim);
        for child in &self.children {
            child.write_raw(out);
        }
        out.push_str(&self.end_delim);
    }
}

/// A node: a run of plain text or a tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Tag(Tag),
}

impl Node {
    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Node::Tag(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(t),
            Node::Tag(_) => None,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Node::Tag(tag) => Some(tag),
            Node::Text(_) => None,
        }
    }

    /// Reconstruct the verbatim source of this node.
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        self.write_raw(&mut out);
        out
    }

    pub(crate) fn write_raw(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Tag(tag) => tag.write_raw(out),
        }
    }
}

/// The root of a parsed document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tree {
    pub children: Vec<Node>,
}

impl Tree {
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Reconstruct the original input.
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_raw(&mut out);
        }
        out
    }
}
