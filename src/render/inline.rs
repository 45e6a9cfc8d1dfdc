//! Inline token engine.
//!
//! Transforms inline text (paragraphs, list items, table cells) into
//! format-specific markup in a fixed stage order: images, custom bracket
//! tokens, ordinary links, inline code. Each stage operates on the previous
//! stage's output; the order matters because later stages must not re-match
//! markup already emitted by earlier ones.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::escape::escape_html;
use super::tokens::{TokenMatch, TokenRegistry, TokenScope};
use super::{Format, RenderContext};

/// Markdown image syntax: `![alt](src "caption")`.
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[(?P<alt>[^\]]*)\]\((?P<src>[^\s\)]+)(?:\s+"(?P<caption>[^"]*)")?\)"#)
        .expect("valid regex")
});

/// Markdown link syntax: `[label](href)`.
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?P<label>[^\]]+)\]\((?P<href>[^\)]+)\)").expect("valid regex"));

/// Custom token syntax: `[!TOKEN] [label](href)`, label/href pair optional
/// so bare tokens like `[!TIP]` match too.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[!(?P<token>[A-Z0-9_-]+)\](?:\s*\[(?P<label>[^\]]+)\]\((?P<href>[^\)]+)\))?")
        .expect("valid regex")
});

/// Inline code: `` `code` ``.
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+://").expect("valid regex"));

/// Render inline markup to HTML fragments.
pub fn render_inline_html(text: &str, ctx: &RenderContext, tokens: &TokenRegistry) -> String {
    let text = IMAGE_RE.replace_all(text, |caps: &Captures| {
        image_figure(
            caps.name("alt").map_or("", |m| m.as_str()),
            &caps["src"],
            caps.name("caption").map_or("", |m| m.as_str()),
        )
    });

    let text = replace_tokens(&text, Format::Html, ctx, tokens);

    let text = LINK_RE.replace_all(&text, |caps: &Captures| {
        link_anchor(&caps["label"], &caps["href"])
    });

    let text = CODE_RE.replace_all(&text, |caps: &Captures| {
        format!("<code class=\"content-code\">{}</code>", escape_html(&caps[1]))
    });

    text.into_owned()
}

/// Reduced inline rendering for the text formats: image syntax degrades to
/// plain link syntax (so the renderer emits a link line to the image
/// resource) and custom tokens resolve to format-appropriate shapes.
/// Ordinary links are left in place for the renderer to extract, and nothing
/// is escaped.
pub fn render_inline_text(
    text: &str,
    format: Format,
    ctx: &RenderContext,
    tokens: &TokenRegistry,
) -> String {
    let text = IMAGE_RE.replace_all(text, |caps: &Captures| {
        format!(
            "[{}]({})",
            caps.name("alt").map_or("", |m| m.as_str()),
            &caps["src"]
        )
    });
    replace_tokens(&text, format, ctx, tokens)
}

/// Strip `[label](href)` markup down to the labels, returning the stripped
/// text and the extracted `(label, href)` pairs with `.md` hrefs remapped to
/// the format's extension.
pub fn extract_links(text: &str, format: Format) -> (String, Vec<(String, String)>) {
    let mut links = Vec::new();
    let stripped = LINK_RE.replace_all(text, |caps: &Captures| {
        let label = caps["label"].to_string();
        links.push((label.clone(), remap_extension(&caps["href"], format)));
        label
    });
    (stripped.into_owned(), links)
}

/// Rewrite a relative href's trailing `.md`/`.MD` to the format's extension.
/// Absolute URLs, anchors and mailto links pass through unmodified.
pub(crate) fn remap_extension(href: &str, format: Format) -> String {
    if SCHEME_RE.is_match(href) || href.starts_with('#') || href.starts_with("mailto:") {
        return href.to_string();
    }
    if href.to_ascii_lowercase().ends_with(".md") {
        format!("{}{}", &href[..href.len() - 3], format.extension())
    } else {
        href.to_string()
    }
}

fn replace_tokens(
    text: &str,
    format: Format,
    ctx: &RenderContext,
    tokens: &TokenRegistry,
) -> String {
    let scope = TokenScope {
        format,
        site: ctx.site,
        page: ctx.page,
    };
    TOKEN_RE
        .replace_all(text, |caps: &Captures| {
            let whole = caps.get(0).expect("match").as_str();
            let token = TokenMatch {
                name: &caps["token"],
                label: caps.name("label").map(|m| m.as_str()),
                href: caps.name("href").map(|m| m.as_str()),
                whole,
            };
            tokens.dispatch(&token, &scope).unwrap_or_else(|| whole.to_string())
        })
        .into_owned()
}

fn image_figure(alt: &str, src: &str, caption: &str) -> String {
    let alt = escape_html(alt);
    let src = escape_html(src);
    let caption = escape_html(caption.trim().trim_matches('"'));

    let mut figure = format!(
        "<figure class=\"content-figure\"><img src=\"{src}\" alt=\"{alt}\" class=\"content-image\"/>"
    );
    if !caption.is_empty() {
        figure.push_str(&format!("<figcaption class=\"caption\">{caption}</figcaption>"));
    }
    figure.push_str("</figure>");
    figure
}

fn link_anchor(label: &str, href: &str) -> String {
    let href = remap_extension(href, Format::Html);
    format!(
        "<a href=\"{}\" class=\"content-link\">{}</a>",
        escape_html(&href),
        escape_html(label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(text: &str) -> String {
        let ctx = RenderContext::new();
        let tokens = TokenRegistry::with_builtins();
        render_inline_html(text, &ctx, &tokens)
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(html("just words"), "just words");
    }

    #[test]
    fn test_image_with_caption() {
        assert_eq!(
            html("![Alt text](http://example.com/img.png \"Caption here\")"),
            "<figure class=\"content-figure\"><img src=\"http://example.com/img.png\" \
             alt=\"Alt text\" class=\"content-image\"/>\
             <figcaption class=\"caption\">Caption here</figcaption></figure>"
        );
    }

    #[test]
    fn test_image_without_caption_has_no_figcaption() {
        let out = html("![alt](img.png)");
        assert!(out.contains("<figure"));
        assert!(!out.contains("figcaption"));
    }

    #[test]
    fn test_ordinary_link_md_rewrite() {
        assert_eq!(
            html("[My Post](posts/post1.md)"),
            "<a href=\"posts/post1.html\" class=\"content-link\">My Post</a>"
        );
    }

    #[test]
    fn test_absolute_anchor_mailto_untouched() {
        assert_eq!(
            html("[x](https://example.com/page.md)"),
            "<a href=\"https://example.com/page.md\" class=\"content-link\">x</a>"
        );
        assert_eq!(
            html("[x](#section.md)"),
            "<a href=\"#section.md\" class=\"content-link\">x</a>"
        );
        assert_eq!(
            html("[x](mailto:a@b.md)"),
            "<a href=\"mailto:a@b.md\" class=\"content-link\">x</a>"
        );
    }

    #[test]
    fn test_unknown_token_preserved_link_rendered() {
        assert_eq!(
            html("[!UNKNOWN] [Label](href)"),
            "[!UNKNOWN] <a href=\"href\" class=\"content-link\">Label</a>"
        );
    }

    #[test]
    fn test_md_page_token_without_context() {
        assert_eq!(
            html("[!MD-PAGE] [Post](posts/post1.md)"),
            "<a href=\"posts/post1.html\" class=\"content-md_page\">Post</a>"
        );
    }

    #[test]
    fn test_mixed_tokens_and_links() {
        assert_eq!(
            html("Check out [!MD-PAGE] [Post 1](p1.md) and [Post 2](p2.md)"),
            "Check out <a href=\"p1.html\" class=\"content-md_page\">Post 1</a> \
             and <a href=\"p2.html\" class=\"content-link\">Post 2</a>"
        );
    }

    #[test]
    fn test_runtime_token_registration() {
        let ctx = RenderContext::new();
        let mut tokens = TokenRegistry::with_builtins();
        tokens.register("TEST-BUTTON", |m, _| {
            Some(format!(
                "<button onclick=\"location.href='{}'\">{}</button>",
                m.href?,
                m.label?
            ))
        });
        assert_eq!(
            render_inline_html("[!TEST-BUTTON] [Click Me](page.html)", &ctx, &tokens),
            "<button onclick=\"location.href='page.html'\">Click Me</button>"
        );
    }

    #[test]
    fn test_inline_code_escaped() {
        assert_eq!(
            html("This is `a < b`."),
            "This is <code class=\"content-code\">a &lt; b</code>."
        );
    }

    #[test]
    fn test_inline_code_spacing() {
        assert_eq!(
            html("`code1` and `code2`"),
            "<code class=\"content-code\">code1</code> and <code class=\"content-code\">code2</code>"
        );
    }

    #[test]
    fn test_extract_links_gemini() {
        let (text, links) = extract_links("See [Home](../index.md) now.", Format::Gemini);
        assert_eq!(text, "See Home now.");
        assert_eq!(
            links,
            vec![("Home".to_string(), "../index.gmi".to_string())]
        );
    }

    #[test]
    fn test_extract_links_leaves_absolute() {
        let (_, links) = extract_links("[x](https://a.b/c.md)", Format::Gemini);
        assert_eq!(links[0].1, "https://a.b/c.md");
    }

    #[test]
    fn test_render_inline_text_only_resolves_tokens() {
        let ctx = RenderContext::new();
        let tokens = TokenRegistry::with_builtins();
        let out = render_inline_text("keep [a](b.md) `code`", Format::Gemini, &ctx, &tokens);
        assert_eq!(out, "keep [a](b.md) `code`");
    }

    #[test]
    fn test_render_inline_text_degrades_images_to_links() {
        let ctx = RenderContext::new();
        let tokens = TokenRegistry::with_builtins();
        let out = render_inline_text("see ![a photo](p.png)", Format::Gemini, &ctx, &tokens);
        assert_eq!(out, "see [a photo](p.png)");
    }
}
