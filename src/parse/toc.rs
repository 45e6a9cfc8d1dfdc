//! Table-of-contents generation from heading blocks.

use crate::ir::Block;
use crate::render::escape::escape_html;
use crate::render::slugify::slugify;

/// Build a nested `<ul>` table of contents from the document's headings.
///
/// Anchor hrefs use the same slugs the HTML renderer assigns as heading `id`
/// attributes, so TOC links scroll to their headings. Returns an empty string
/// for a document without headings.
pub fn generate_toc(blocks: &[Block]) -> String {
    let headings: Vec<(u8, &str)> = blocks
        .iter()
        .filter_map(|block| match block {
            Block::Heading { level, text } => Some((*level, text.as_str())),
            _ => None,
        })
        .collect();

    if headings.is_empty() {
        return String::new();
    }

    let mut out = String::from("<ul class=\"toc\">");
    let mut stack = vec![headings[0].0];

    for (i, (level, text)) in headings.iter().copied().enumerate() {
        if i > 0 {
            if level > *stack.last().expect("toc stack is never empty") {
                out.push_str("<ul>");
                stack.push(level);
            } else {
                out.push_str("</li>");
                while stack.len() > 1 && level < *stack.last().expect("non-empty") {
                    stack.pop();
                    out.push_str("</ul></li>");
                }
            }
        }
        out.push_str(&format!(
            "<li><a href=\"#{}\" class=\"toc-link\">{}</a>",
            slugify(text),
            escape_html(text)
        ));
    }

    out.push_str("</li>");
    while stack.len() > 1 {
        stack.pop();
        out.push_str("</ul></li>");
    }
    out.push_str("</ul>");

    out
}
