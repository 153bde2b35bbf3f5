// Default HTML tag set.
//
// Enough of the classic forum vocabulary to render common markup out of the
// box. Callers extend or replace these through `Options::with_tags`.

use std::collections::HashMap;

use crate::TagDef;

/// The default HTML tag definitions.
pub fn html_tags() -> HashMap<String, TagDef> {
    let mut tags = HashMap::new();
    tags.insert("b".to_string(), TagDef::template("<b>%s</b>"));
    tags.insert("i".to_string(), TagDef::template("<i>%s</i>"));
    tags.insert("u".to_string(), TagDef::template("<u>%s</u>"));
    tags.insert(
        "url".to_string(),
        TagDef::template(r#"url:<a href="%{link}A" rel="nofollow">%s</a>"#).short(true),
    );
    tags.insert(
        "email".to_string(),
        TagDef::template(r#"url:<a href="mailto:%{email}A">%s</a>"#),
    );
    tags.insert(
        "img".to_string(),
        TagDef::template(r#"<img src="%{link}A" alt="%{html}s">"#).parsed(false),
    );
    tags.insert(
        "size".to_string(),
        TagDef::template(r#"<font size="%{num}a">%s</font>"#),
    );
    tags.insert(
        "color".to_string(),
        TagDef::template(r#"<font color="%{htmlcolor}a">%s</font>"#),
    );
    tags.insert(
        "quote".to_string(),
        TagDef::template("block:<blockquote>%s</blockquote>"),
    );
    tags.insert(
        "code".to_string(),
        TagDef::template("block:<pre><code>%{html}s</code></pre>").parsed(false),
    );
    tags.insert(
        "noparse".to_string(),
        TagDef::template("<pre>%{html}s</pre>").parsed(false),
    );
    tags.insert("list".to_string(), TagDef::template("block:<ul>%s</ul>"));
    tags.insert(
        "*".to_string(),
        TagDef::template("<li>%s</li>").close(false),
    );
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TagClass;

    #[test]
    fn url_definition_carries_the_url_class() {
        let tags = html_tags();
        assert_eq!(tags["url"].class, TagClass::Url);
        assert_eq!(tags["email"].class, TagClass::Url);
    }

    #[test]
    fn block_prefix_assigns_block_class() {
        let tags = html_tags();
        assert_eq!(tags["quote"].class, TagClass::Block);
        assert_eq!(tags["list"].class, TagClass::Block);
        assert_eq!(tags["b"].class, TagClass::Inline);
    }

    #[test]
    fn verbatim_definitions_do_not_parse() {
        let tags = html_tags();
        assert!(!tags["code"].parse);
        assert!(!tags["noparse"].parse);
        assert!(tags["quote"].parse);
    }
}
