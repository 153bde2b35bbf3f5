// Tree walk and output assembly.
//
// A depth-first walk with an explicit ancestor stack: a tag's children are
// rendered and bound first, then the tag's own output (template or
// callback) is evaluated with that content. Callback `info` records are
// snapshots of the stack at the point of evaluation.

pub(crate) mod escape;
pub(crate) mod template;
pub(crate) mod text;

use std::any::Any;
use std::collections::HashMap;

use crate::error::RenderError;
use crate::tree::{Node, Tag, TagClass, Tree};
use crate::{Output, Parser};

/// Ancestor counts per nesting class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassCounts {
    pub inline: usize,
    pub block: usize,
    pub url: usize,
}

impl ClassCounts {
    pub fn get(&self, class: TagClass) -> usize {
        match class {
            TagClass::Inline => self.inline,
            TagClass::Block => self.block,
            TagClass::Url => self.url,
        }
    }

    fn slot(&mut self, class: TagClass) -> &mut usize {
        match class {
            TagClass::Inline => &mut self.inline,
            TagClass::Block => &mut self.block,
            TagClass::Url => &mut self.url,
        }
    }
}

/// Ancestry snapshot handed to tag callbacks and text handlers.
#[derive(Clone)]
pub struct RenderInfo<'a> {
    /// Open ancestor tag name to occurrence count.
    pub tags: HashMap<String, usize>,
    /// Ancestor tag names, outermost first.
    pub stack: Vec<String>,
    /// Ancestor counts per nesting class.
    pub classes: ClassCounts,
    /// Opaque user context from `render_with_context`.
    pub user: Option<&'a dyn Any>,
}

/// Context record passed to tag callbacks.
pub struct CallbackContext<'a> {
    pub parser: &'a Parser,
    /// The fallback attribute value.
    pub attr: &'a str,
    /// Rendered content when the definition parses its children, raw
    /// content otherwise.
    pub content: &'a str,
    /// The tag under evaluation.
    pub tag: &'a Tag,
    pub info: &'a RenderInfo<'a>,
}

/// Render a tree against the parser's definitions.
pub(crate) fn render_tree<'a>(
    parser: &'a Parser,
    tree: &'a Tree,
    user: Option<&'a dyn Any>,
) -> Result<String, RenderError> {
    let mut walker = Walker {
        parser,
        stack: Vec::new(),
        tag_counts: HashMap::new(),
        classes: ClassCounts::default(),
        user,
    };
    walker.render_nodes(&tree.children)
}

pub(crate) struct Walker<'a> {
    pub(crate) parser: &'a Parser,
    stack: Vec<(&'a str, TagClass)>,
    tag_counts: HashMap<&'a str, usize>,
    classes: ClassCounts,
    user: Option<&'a dyn Any>,
}

impl<'a> Walker<'a> {
    pub(crate) fn render_nodes(&mut self, nodes: &'a [Node]) -> Result<String, RenderError> {
        let parser = self.parser;
        let mut out = String::new();
        for node in nodes {
            match node {
                Node::Text(run) => {
                    let info = self.info();
                    out.push_str(&text::process(parser, &info, run)?);
                }
                Node::Tag(tag) => out.push_str(&self.render_tag(tag)?),
            }
        }
        Ok(out)
    }

    fn render_tag(&mut self, tag: &'a Tag) -> Result<String, RenderError> {
        let parser = self.parser;
        let Some(def) = parser.tag_def(&tag.name) else {
            // Forbidden after parsing: only the delimiters survive.
            return self.render_raw(tag);
        };
        if !tag.closed {
            // Unbalanced frame: transparent, delimiters plus rendered
            // children. It contributes nothing to the ancestor stack.
            return self.render_raw(tag);
        }

        self.push(tag);
        let result = self.render_output(tag, def);
        self.pop(tag);
        result
    }

    fn render_output(
        &mut self,
        tag: &'a Tag,
        def: &'a crate::TagDef,
    ) -> Result<String, RenderError> {
        let parser = self.parser;
        // Children first; their concatenation is what `%s` and callback
        // content observe.
        let content = if def.parse {
            self.render_nodes(&tag.children)?
        } else {
            tag.content()
        };
        match &def.output {
            Output::Callback(callback) => {
                let info = self.info();
                let ctx = CallbackContext {
                    parser,
                    attr: tag.attr(),
                    content: &content,
                    tag,
                    info: &info,
                };
                callback.as_ref()(&ctx).map_err(|source| RenderError::Callback {
                    tag: tag.name.clone(),
                    source,
                })
            }
            Output::Template(tpl) => template::interpret(self, tpl, tag, def, &content),
        }
    }

    fn render_raw(&mut self, tag: &'a Tag) -> Result<String, RenderError> {
        if tag.short {
            return Ok(tag.raw_text());
        }
        let mut out = String::from(&tag.start_delim);
        out.push_str(&self.render_nodes(&tag.children)?);
        out.push_str(&tag.end_delim);
        Ok(out)
    }

    fn push(&mut self, tag: &'a Tag) {
        self.stack.push((tag.name.as_str(), tag.class));
        *self.tag_counts.entry(tag.name.as_str()).or_insert(0) += 1;
        *self.classes.slot(tag.class) += 1;
    }

    fn pop(&mut self, tag: &'a Tag) {
        self.stack.pop();
        if let Some(count) = self.tag_counts.get_mut(tag.name.as_str()) {
            *count -= 1;
            if *count == 0 {
                self.tag_counts.remove(tag.name.as_str());
            }
        }
        let slot = self.classes.slot(tag.class);
        *slot = slot.saturating_sub(1);
    }

    fn info(&self) -> RenderInfo<'a> {
        RenderInfo {
            tags: self
                .tag_counts
                .iter()
                .map(|(name, count)| ((*name).to_string(), *count))
                .collect(),
            stack: self.stack.iter().map(|(name, _)| (*name).to_string()).collect(),
            classes: self.classes,
            user: self.user,
        }
    }
}
