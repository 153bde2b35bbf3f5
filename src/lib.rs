// bbcode2html - forgiving BBCode parser and HTML renderer.
//
// Architecture:
//   BBCode string -> scanner (parse) -> tag tree (tree::Tree) -> render walk
//   (render) -> output string
//
// The scanner never rejects input: malformed markup degrades to literal
// text, and recovery outcomes are reported through `Parser::error`. What
// each tag renders to is entirely caller-defined, either as a format-string
// template or as a callback.

pub mod defaults;
mod error;
mod parse;
mod render;
pub mod tree;

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use regex::Regex;

pub use error::{CallbackError, RenderError};
pub use parse::attributes::{AttributeParserFn, AttributeQuote, ParsedAttributes};
pub use render::escape::{escape_html, EscapeFn};
pub use render::{CallbackContext, ClassCounts, RenderInfo};
pub use tree::{Attributes, Node, Tag, TagClass, Tree};

use parse::attributes::AttrConfig;
use render::escape::EscapeRegistry;

/// A tag callback: receives the evaluation context, returns the final
/// markup for the node. An error aborts the render.
pub type TagCallback =
    Arc<dyn Fn(&CallbackContext) -> Result<String, CallbackError> + Send + Sync>;

/// A replacement for the HTML-escape stage of the text pipeline.
pub type TextProcessorFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// How a tag renders: a format-string template or a callback.
#[derive(Clone)]
pub enum Output {
    Template(String),
    Callback(TagCallback),
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Output::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// A tag definition.
///
/// Built with `TagDef::template` or `TagDef::callback` and refined through
/// the chaining methods.
#[derive(Debug, Clone)]
pub struct TagDef {
    pub(crate) output: Output,
    /// Whether the content is parsed recursively. Defaults to true for
    /// templates and false for callbacks.
    pub(crate) parse: bool,
    pub(crate) class: TagClass,
    pub(crate) single: bool,
    pub(crate) short: bool,
    pub(crate) classic: bool,
    pub(crate) close: bool,
}

impl TagDef {
    /// Define a tag by format-string template. A `url:` or `block:` prefix
    /// on the template assigns the nesting class.
    pub fn template(template: impl Into<String>) -> Self {
        let mut template: String = template.into();
        let mut class = TagClass::Inline;
        if let Some(rest) = template.strip_prefix("url:") {
            class = TagClass::Url;
            template = rest.to_string();
        } else if let Some(rest) = template.strip_prefix("block:") {
            class = TagClass::Block;
            template = rest.to_string();
        }
        Self {
            output: Output::Template(template),
            parse: true,
            class,
            single: false,
            short: false,
            classic: true,
            close: true,
        }
    }

    /// Define a tag by callback. Content is handed over raw unless
    /// `.parsed(true)` is set.
    pub fn callback(
        callback: impl Fn(&CallbackContext) -> Result<String, CallbackError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            output: Output::Callback(Arc::new(callback)),
            parse: false,
            class: TagClass::Inline,
            single: false,
            short: false,
            classic: true,
            close: true,
        }
    }

    /// Whether the content is parsed recursively.
    pub fn parsed(mut self, parse: bool) -> Self {
        self.parse = parse;
        self
    }

    pub fn class(mut self, class: TagClass) -> Self {
        self.class = class;
        self
    }

    /// Declare the tag void: no content, no closer.
    pub fn single(mut self, single: bool) -> Self {
        self.single = single;
        self
    }

    /// Accept the `[name://body|title]` short form.
    pub fn short(mut self, short: bool) -> Self {
        self.short = short;
        self
    }

    /// Accept the classic `[name]..[/name]` form (on by default).
    pub fn classic(mut self, classic: bool) -> Self {
        self.classic = classic;
        self
    }

    /// Whether the tag emits a closer. Definitions with `close(false)` are
    /// closed implicitly by a same-name sibling, an enclosing closer, or
    /// end of input, without being reported as an error.
    pub fn close(mut self, close: bool) -> Self {
        self.close = close;
        self
    }
}

/// URL auto-detection configuration for the text pipeline.
#[derive(Debug, Clone)]
pub struct UrlFinder {
    /// Longest link title emitted before truncation appends `...`.
    /// Zero disables truncation.
    pub max_length: usize,
    /// Link markup with two `%s` slots: href, then title.
    pub format: String,
}

impl Default for UrlFinder {
    fn default() -> Self {
        Self {
            max_length: 50,
            format: r#"<a href="%s" rel="nofollow">%s</a>"#.to_string(),
        }
    }
}

/// Smiley substitution configuration for the text pipeline.
#[derive(Debug, Clone)]
pub struct Smileys {
    /// Prefix for every icon path.
    pub base_url: String,
    /// Smiley text to icon file.
    pub icons: HashMap<String, String>,
    /// Image markup with two `%s` slots: icon URL, then the escaped
    /// original text.
    pub format: String,
}

impl Smileys {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            icons: HashMap::new(),
            format: r#"<img src="%s" alt="%s">"#.to_string(),
        }
    }

    pub fn icon(mut self, text: impl Into<String>, file: impl Into<String>) -> Self {
        self.icons.insert(text.into(), file.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

/// Parser configuration.
#[derive(Clone)]
pub struct Options {
    /// Tag name to definition. The empty name registers a text-handler
    /// callback that replaces the whole text pipeline.
    pub tags: HashMap<String, TagDef>,
    /// Named escapes merged over the built-in defaults.
    pub escapes: HashMap<String, EscapeFn>,
    /// Synthesize closers for open frames instead of refusing recovery.
    pub close_open_tags: bool,
    /// Reject a whole tag when its attribute region is malformed.
    pub strict_attributes: bool,
    /// Allow `[tag=value]`; otherwise only named pairs are accepted.
    pub direct_attributes: bool,
    pub attribute_quote: AttributeQuote,
    /// Replacement for the built-in attribute grammar.
    pub attribute_parser: Option<AttributeParserFn>,
    pub url_finder: Option<UrlFinder>,
    pub smileys: Option<Smileys>,
    /// Convert line endings in processed text to `<br>`.
    pub linebreaks: bool,
    /// Replacement for the HTML-escape stage of the text pipeline.
    pub text_processor: Option<TextProcessorFn>,
    /// Trim one newline after a block opener and before its closer.
    pub strip_linebreaks: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tags: HashMap::new(),
            escapes: HashMap::new(),
            close_open_tags: false,
            strict_attributes: true,
            direct_attributes: true,
            attribute_quote: AttributeQuote::Double,
            attribute_parser: None,
            url_finder: None,
            smileys: None,
            linebreaks: true,
            text_processor: None,
            strip_linebreaks: true,
        }
    }
}

impl Options {
    /// Create a new Options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one tag definition.
    pub fn with_tag(mut self, name: impl Into<String>, def: TagDef) -> Self {
        self.tags.insert(name.into(), def);
        self
    }

    /// Register a whole definition table at once.
    pub fn with_tags(mut self, tags: HashMap<String, TagDef>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Register a named escape (overrides a default of the same name).
    pub fn with_escape(
        mut self,
        name: impl Into<String>,
        escape: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.escapes.insert(name.into(), Arc::new(escape));
        self
    }

    pub fn with_close_open_tags(mut self, close_open_tags: bool) -> Self {
        self.close_open_tags = close_open_tags;
        self
    }

    pub fn with_strict_attributes(mut self, strict_attributes: bool) -> Self {
        self.strict_attributes = strict_attributes;
        self
    }

    pub fn with_direct_attributes(mut self, direct_attributes: bool) -> Self {
        self.direct_attributes = direct_attributes;
        self
    }

    pub fn with_attribute_quote(mut self, quote: AttributeQuote) -> Self {
        self.attribute_quote = quote;
        self
    }

    /// Install a replacement attribute parser.
    pub fn with_attribute_parser(
        mut self,
        parser: impl Fn(&str, &str) -> ParsedAttributes + Send + Sync + 'static,
    ) -> Self {
        self.attribute_parser = Some(Arc::new(parser));
        self
    }

    pub fn with_url_finder(mut self, finder: UrlFinder) -> Self {
        self.url_finder = Some(finder);
        self
    }

    pub fn with_smileys(mut self, smileys: Smileys) -> Self {
        self.smileys = Some(smileys);
        self
    }

    pub fn with_linebreaks(mut self, linebreaks: bool) -> Self {
        self.linebreaks = linebreaks;
        self
    }

    /// Install a text processor that runs in place of the HTML-escape
    /// stage. It is responsible for its own escaping.
    pub fn with_text_processor(
        mut self,
        processor: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.text_processor = Some(Arc::new(processor));
        self
    }

    pub fn with_strip_linebreaks(mut self, strip_linebreaks: bool) -> Self {
        self.strip_linebreaks = strip_linebreaks;
        self
    }
}

/// A configured BBCode parser and renderer.
///
/// Parsing and rendering run to completion on the calling thread and hold
/// only transient state; the definition table is read-only during a render.
/// For concurrent use, construct one parser per thread from shared
/// `Options`.
pub struct Parser {
    pub(crate) options: Options,
    escapes: EscapeRegistry,
    pub(crate) smiley_re: Option<Regex>,
    forbidden: HashSet<String>,
    last_tree: Option<Tree>,
    errors: Vec<String>,
}

impl Parser {
    pub fn new(options: Options) -> Self {
        let escapes = EscapeRegistry::with_defaults(options.escapes.clone());
        let smiley_re = options
            .smileys
            .as_ref()
            .and_then(render::text::build_smiley_regex);
        Self {
            options,
            escapes,
            smiley_re,
            forbidden: HashSet::new(),
            last_tree: None,
            errors: Vec::new(),
        }
    }

    /// A parser preloaded with the default HTML tag set.
    pub fn with_html_defaults() -> Self {
        Self::new(Options::new().with_tags(defaults::html_tags()))
    }

    /// Parse input into a tag tree. Never fails; recovery outcomes are
    /// available through [`Parser::error`] afterwards.
    pub fn parse(&mut self, input: &str) -> &Tree {
        #[cfg(feature = "tracing")]
        tracing::trace!(len = input.len(), "parsing bbcode input");
        let (tree, errors) = parse::scan(self, input);
        self.errors = errors;
        self.last_tree.insert(tree)
    }

    /// Parse and render in one step.
    pub fn render(&mut self, input: &str) -> Result<String, RenderError> {
        self.render_internal(input, None)
    }

    /// Like [`Parser::render`], with an opaque context surfaced to
    /// callbacks through `info.user`.
    pub fn render_with_context(
        &mut self,
        input: &str,
        user: &dyn Any,
    ) -> Result<String, RenderError> {
        self.render_internal(input, Some(user))
    }

    fn render_internal(
        &mut self,
        input: &str,
        user: Option<&dyn Any>,
    ) -> Result<String, RenderError> {
        self.parse(input);
        let Some(tree) = self.last_tree.take() else {
            return Ok(String::new());
        };
        let result = render::render_tree(self, &tree, user);
        self.last_tree = Some(tree);
        result
    }

    /// Render a previously produced tree.
    pub fn render_tree(&self, tree: &Tree) -> Result<String, RenderError> {
        #[cfg(feature = "tracing")]
        tracing::trace!("rendering tree");
        render::render_tree(self, tree, None)
    }

    /// Like [`Parser::render_tree`], with an opaque callback context.
    pub fn render_tree_with_context(
        &self,
        tree: &Tree,
        user: &dyn Any,
    ) -> Result<String, RenderError> {
        render::render_tree(self, tree, Some(user))
    }

    /// Disable tag names. Forbidden names behave as if undefined.
    pub fn forbid<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forbidden.extend(names.into_iter().map(Into::into));
    }

    /// Re-enable previously forbidden tag names.
    pub fn permit<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.forbidden.remove(&name.into());
        }
    }

    /// Tag names flagged unparsed or auto-closed by the last parse.
    pub fn error(&self) -> &[String] {
        &self.errors
    }

    /// The last produced tree.
    pub fn get_tree(&self) -> Option<&Tree> {
        self.last_tree.as_ref()
    }

    pub(crate) fn tag_def(&self, name: &str) -> Option<&TagDef> {
        if self.forbidden.contains(name) {
            return None;
        }
        self.options.tags.get(name)
    }

    pub(crate) fn escapes(&self) -> &EscapeRegistry {
        &self.escapes
    }

    pub(crate) fn attr_config(&self) -> AttrConfig {
        AttrConfig {
            direct: self.options.direct_attributes,
            quote: self.options.attribute_quote,
        }
    }
}

/// Render BBCode with the default HTML tag set.
///
/// # Examples
///
/// ```
/// let html = bbcode2html::render("[b]hello[/b]").unwrap();
/// assert_eq!(html, "<b>hello</b>");
/// ```
pub fn render(input: &str) -> Result<String, RenderError> {
    Parser::with_html_defaults().render(input)
}

/// Render BBCode with custom options.
///
/// # Examples
///
/// ```
/// use bbcode2html::{render_with, Options, TagDef};
///
/// let options = Options::new().with_tag("em", TagDef::template("<em>%s</em>"));
/// let html = render_with("[em]x[/em]", options).unwrap();
/// assert_eq!(html, "<em>x</em>");
/// ```
pub fn render_with(input: &str, options: Options) -> Result<String, RenderError> {
    Parser::new(options).render(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty() {
        assert_eq!(render("").unwrap(), "");
    }

    #[test]
    fn test_render_plain_text() {
        assert_eq!(render("Hello, world!").unwrap(), "Hello, world!");
    }

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert!(!options.close_open_tags);
        assert!(options.strict_attributes);
        assert!(options.direct_attributes);
        assert_eq!(options.attribute_quote, AttributeQuote::Double);
        assert!(options.linebreaks);
        assert!(options.strip_linebreaks);
        assert!(options.url_finder.is_none());
        assert!(options.smileys.is_none());
    }

    #[test]
    fn test_options_builder() {
        let options = Options::new()
            .with_tag("b", TagDef::template("<b>%s</b>"))
            .with_close_open_tags(true)
            .with_strict_attributes(false)
            .with_attribute_quote(AttributeQuote::Both)
            .with_linebreaks(false);
        assert!(options.tags.contains_key("b"));
        assert!(options.close_open_tags);
        assert!(!options.strict_attributes);
        assert_eq!(options.attribute_quote, AttributeQuote::Both);
        assert!(!options.linebreaks);
    }

    #[test]
    fn test_template_class_prefixes() {
        let url = TagDef::template("url:<a>%s</a>");
        assert_eq!(url.class, TagClass::Url);
        assert!(matches!(url.output, Output::Template(ref t) if t == "<a>%s</a>"));

        let block = TagDef::template("block:<div>%s</div>");
        assert_eq!(block.class, TagClass::Block);

        let plain = TagDef::template("<b>%s</b>");
        assert_eq!(plain.class, TagClass::Inline);
    }

    #[test]
    fn test_callback_defaults_to_raw_content() {
        let def = TagDef::callback(|ctx| Ok(ctx.content.to_string()));
        assert!(!def.parse);
        let def = def.parsed(true);
        assert!(def.parse);
    }

    #[test]
    fn test_forbid_and_permit() {
        let mut parser = Parser::with_html_defaults();
        assert_eq!(parser.render("[b]x[/b]").unwrap(), "<b>x</b>");
        parser.forbid(["b"]);
        assert_eq!(parser.render("[b]x[/b]").unwrap(), "[b]x[/b]");
        parser.permit(["b"]);
        assert_eq!(parser.render("[b]x[/b]").unwrap(), "<b>x</b>");
    }
}
