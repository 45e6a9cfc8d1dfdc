//! Gophermap rendering of the block IR.
//!
//! Gophermap lines have the fixed shape
//! `<type><display>\t<selector>\t<host>\t<port>`; everything this renderer
//! produces is an informational line (type `i`, empty selector). The format
//! forbids embedded tabs in display text, so tabs are replaced with spaces.
//! Lines are joined with CRLF and the document ends with a trailing CRLF.

use crate::ir::{Block, List};

use super::inline::render_inline_text;
use super::{Format, Registries, RenderContext};

/// Render a block sequence to a gophermap document.
pub fn render_document(blocks: &[Block], ctx: &RenderContext, registries: &Registries) -> String {
    let vars = &registries.vars;
    let mut lines: Vec<String> = Vec::new();

    if let Some(title) = &ctx.title {
        lines.push(info_line(&vars.apply(title, ctx), ctx));
        if let Some(description) = ctx.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(info_line(&vars.apply(description, ctx), ctx));
        }
        let datetime = vars.resolve("datetime", ctx);
        if !datetime.is_empty() {
            lines.push(info_line(&datetime, ctx));
        }
    }

    for block in blocks {
        match block {
            Block::Paragraph(text) | Block::Callout { text, .. } => {
                let text = vars.apply(text, ctx);
                let text = render_inline_text(&text, Format::Gopher, ctx, &registries.tokens);
                for line in text.split('\n') {
                    lines.push(info_line(line, ctx));
                }
            }
            Block::Heading { level: 1, text } => {
                lines.push(info_line(&format!("# {}", vars.apply(text, ctx)), ctx));
            }
            Block::Heading { text, .. } => {
                lines.push(info_line(&vars.apply(text, ctx), ctx));
            }
            Block::Code(code) => {
                for line in code.text.lines() {
                    lines.push(info_line(line, ctx));
                }
            }
            Block::List(list) => list_lines(list, 0, ctx, registries, &mut lines),
            // No defined gophermap handling for quotes, images or tables.
            Block::Blockquote(_) | Block::Image(_) | Block::Table(_) => {}
        }
    }

    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

fn info_line(text: &str, ctx: &RenderContext) -> String {
    format!(
        "i{}\t\t{}\t{}",
        text.replace('\t', " "),
        ctx.gopher_host,
        ctx.gopher_port
    )
}

fn list_lines(
    list: &List,
    indent: usize,
    ctx: &RenderContext,
    registries: &Registries,
    out: &mut Vec<String>,
) {
    let prefix = " ".repeat(indent);
    for (index, item) in list.items.iter().enumerate() {
        if let Some(text) = &item.text {
            let text = registries.vars.apply(text, ctx);
            let display = if list.ordered {
                format!("{prefix}{}. {text}", index + 1)
            } else {
                format!("{prefix}- {text}")
            };
            out.push(info_line(&display, ctx));
        }
        if let Some(nested) = &item.nested {
            list_lines(nested, indent + 2, ctx, registries, out);
        }
    }
}
