//! Gemtext (Gemini) rendering of the block IR.
//!
//! Gemtext is line-oriented and has no inline link syntax, so paragraph text
//! is stripped down to the link labels and the destinations are emitted as
//! separate `=> href label` lines following the paragraph. Output is raw
//! text; nothing is HTML-escaped.

use crate::ir::{Block, List};

use super::inline::{extract_links, render_inline_text};
use super::{Format, Registries, RenderContext};

/// Render a block sequence to a complete gemtext document.
///
/// When a title is supplied, a `# title` line (plus description and
/// creation date/time, when present) precedes the content.
pub fn render_document(blocks: &[Block], ctx: &RenderContext, registries: &Registries) -> String {
    let vars = &registries.vars;
    let mut sections: Vec<String> = Vec::new();

    if let Some(title) = &ctx.title {
        sections.push(format!("# {}", vars.apply(title, ctx)));
        if let Some(description) = ctx.description.as_deref().filter(|d| !d.is_empty()) {
            sections.push(vars.apply(description, ctx));
        }
        let datetime = vars.resolve("datetime", ctx);
        if !datetime.is_empty() {
            sections.push(datetime);
        }
    }

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                sections.push(format!(
                    "{} {}",
                    "#".repeat(*level as usize),
                    vars.apply(text, ctx)
                ));
            }
            // Callouts are not distinguished from paragraphs here; the format
            // has no emphasis primitives.
            Block::Paragraph(text) | Block::Callout { text, .. } => {
                sections.push(paragraph(text, ctx, registries));
            }
            Block::Blockquote(text) => {
                sections.push(format!("> {}", vars.apply(text, ctx)));
            }
            Block::Image(image) => {
                sections.push(format!("=> {} {}", image.src, vars.apply(&image.alt, ctx)));
            }
            Block::Code(code) => {
                let text = if code.text.ends_with('\n') {
                    code.text.clone()
                } else {
                    format!("{}\n", code.text)
                };
                sections.push(format!("```\n{text}```"));
            }
            Block::List(list) => {
                let mut lines = Vec::new();
                list_lines(list, 0, ctx, registries, &mut lines);
                sections.push(lines.join("\n"));
            }
            // No tabular primitive in gemtext.
            Block::Table(_) => {}
        }
    }

    sections.join("\n\n")
}

fn paragraph(text: &str, ctx: &RenderContext, registries: &Registries) -> String {
    let text = registries.vars.apply(text, ctx);
    let text = render_inline_text(&text, Format::Gemini, ctx, &registries.tokens);
    let (stripped, links) = extract_links(&text, Format::Gemini);

    let mut lines = vec![stripped];
    for (label, href) in links {
        lines.push(format!("=> {href} {label}"));
    }
    lines.join("\n")
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
            if list.ordered {
                out.push(format!("{prefix}{}. {text}", index + 1));
            } else {
                out.push(format!("{prefix}* {text}"));
            }
        }
        if let Some(nested) = &item.nested {
            list_lines(nested, indent + 2, ctx, registries, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CodeBlock, ListItem};

    fn render(blocks: &[Block]) -> String {
        render_document(blocks, &RenderContext::new(), &Registries::new())
    }

    #[test]
    fn test_heading_levels() {
        let blocks = vec![
            Block::Heading {
                level: 1,
                text: "Top".to_string(),
            },
            Block::Heading {
                level: 3,
                text: "Deep".to_string(),
            },
        ];
        assert_eq!(render(&blocks), "# Top\n\n### Deep");
    }

    #[test]
    fn test_paragraph_links_become_separate_lines() {
        let blocks = vec![Block::Paragraph(
            "Read [the guide](guide.md) and [more](https://example.com).".to_string(),
        )];
        assert_eq!(
            render(&blocks),
            "Read the guide and more.\n=> guide.gmi the guide\n=> https://example.com more"
        );
    }

    #[test]
    fn test_title_header() {
        let mut ctx = RenderContext::new();
        ctx.title = Some("My Page".to_string());
        ctx.description = Some("About things".to_string());
        ctx.creation_date = Some("01/02/2025".to_string());
        let out = render_document(&[], &ctx, &Registries::new());
        assert_eq!(out, "# My Page\n\nAbout things\n\n01/02/2025");
    }

    #[test]
    fn test_code_fences_tight() {
        let blocks = vec![Block::Code(CodeBlock {
            text: "print(\"hi\")\n".to_string(),
            lang: "python".to_string(),
        })];
        assert_eq!(render(&blocks), "```\nprint(\"hi\")\n```");
    }

    #[test]
    fn test_nested_list_indentation() {
        let blocks = vec![Block::List(List {
            ordered: false,
            items: vec![ListItem {
                text: Some("Parent".to_string()),
                nested: Some(List {
                    ordered: true,
                    items: vec![ListItem::text("First"), ListItem::text("Second")],
                }),
            }],
        })];
        assert_eq!(render(&blocks), "* Parent\n  1. First\n  2. Second");
    }

    #[test]
    fn test_item_with_only_nested_list() {
        let blocks = vec![Block::List(List {
            ordered: false,
            items: vec![ListItem {
                text: None,
                nested: Some(List {
                    ordered: false,
                    items: vec![ListItem::text("leaf")],
                }),
            }],
        })];
        assert_eq!(render(&blocks), "  * leaf");
    }

    #[test]
    fn test_blockquote_and_image() {
        let blocks = vec![
            Block::Blockquote("A quote".to_string()),
            Block::Image(crate::ir::ImageBlock {
                src: "pic.png".to_string(),
                alt: "A picture".to_string(),
                caption: String::new(),
            }),
        ];
        assert_eq!(render(&blocks), "> A quote\n\n=> pic.png A picture");
    }

    #[test]
    fn test_table_emits_nothing() {
        let blocks = vec![Block::Table(crate::ir::TableBlock::default())];
        assert_eq!(render(&blocks), "");
    }
}
