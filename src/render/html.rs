//! HTML rendering of the block IR.

use crate::ir::{Block, List};

use super::escape::escape_html;
use super::inline::render_inline_html;
use super::slugify::slugify;
use super::{Registries, RenderContext};

/// Render a block sequence to an HTML fragment (one line per block).
///
/// The result is the `{{content}}` payload for a page template; document
/// chrome (`<html>`, `<head>`) belongs to the template, not the renderer.
pub fn render_document(blocks: &[Block], ctx: &RenderContext, registries: &Registries) -> String {
    blocks
        .iter()
        .map(|block| render_block(block, ctx, registries))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a single block to its HTML fragment.
pub fn render_block(block: &Block, ctx: &RenderContext, registries: &Registries) -> String {
    let vars = &registries.vars;
    match block {
        Block::Heading { level, text } => {
            let text = vars.apply(text, ctx);
            format!(
                "<h{level} id='{}' class='content-h{level}'>{}</h{level}>",
                slugify(&text),
                escape_html(&text)
            )
        }
        Block::Paragraph(text) => {
            let content = render_inline_html(&vars.apply(text, ctx), ctx, &registries.tokens);
            format!("<p class='content-paragraph'>{content}</p>")
        }
        Block::Callout { kind, text } => {
            let content = render_inline_html(&vars.apply(text, ctx), ctx, &registries.tokens);
            format!(
                "<div class=\"content-callout callout callout-{}\"><strong>{}</strong> {content}</div>",
                kind.name(),
                kind.label()
            )
        }
        Block::Blockquote(text) => {
            let content = escape_html(&vars.apply(text, ctx));
            format!("<blockquote class='content-blockquote'><p>{content}</p></blockquote>")
        }
        Block::Image(image) => {
            let src = escape_html(&image.src);
            let alt = escape_html(&vars.apply(&image.alt, ctx));
            let caption = escape_html(&vars.apply(&image.caption, ctx));
            let figcaption = if caption.is_empty() {
                String::new()
            } else {
                format!("<figcaption class='caption'>{caption}</figcaption>")
            };
            format!(
                "<figure class=\"content-figure\"><img src=\"{src}\" alt=\"{alt}\" class=\"content-image\"/>{figcaption}</figure>"
            )
        }
        Block::Code(code) => {
            let text = escape_html(&code.text);
            let lang = if code.lang.is_empty() {
                "plaintext"
            } else {
                &code.lang
            };
            format!(
                "<pre class='content-code'><code class=\"language-{}\">{text}</code></pre>",
                escape_html(lang)
            )
        }
        Block::List(list) => render_list(list, ctx, registries),
        Block::Table(table) => {
            let headers = table
                .headers
                .iter()
                .map(|header| format!("<th>{}</th>", escape_html(&vars.apply(header, ctx))))
                .collect::<String>();
            let mut body = String::new();
            for row in &table.rows {
                body.push_str("<tr>");
                for cell in row {
                    let content =
                        render_inline_html(&vars.apply(cell, ctx), ctx, &registries.tokens);
                    body.push_str(&format!("<td>{content}</td>"));
                }
                body.push_str("</tr>");
            }
            format!(
                "<table class='content-table'><thead><tr>{headers}</tr></thead><tbody>{body}</tbody></table>"
            )
        }
    }
}

/// Recursively render a list; items may carry text, a nested list, or both.
/// An item with neither contributes an empty `<li>`.
fn render_list(list: &List, ctx: &RenderContext, registries: &Registries) -> String {
    let tag = if list.ordered { "ol" } else { "ul" };
    let mut items = String::new();

    for item in &list.items {
        let text = item
            .text
            .as_ref()
            .map(|text| render_inline_html(&registries.vars.apply(text, ctx), ctx, &registries.tokens))
            .unwrap_or_default();
        let nested = item
            .nested
            .as_ref()
            .map(|nested| render_list(nested, ctx, registries))
            .unwrap_or_default();
        items.push_str(&format!("<li>{text}{nested}</li>"));
    }

    format!("<{tag} class='content-{tag}'>{items}</{tag}>")
}
