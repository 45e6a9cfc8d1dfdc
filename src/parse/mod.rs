//! Markdown parsing into the block IR.
//!
//! Tokenization is delegated to pulldown-cmark (tables enabled, raw HTML
//! passed through, YAML metadata blocks tolerated); this module reduces the
//! event stream into [`Block`]s in a single left-to-right pass. Inline markup
//! (links, images, custom tokens, inline code) is deliberately *not* resolved
//! here: text payloads carry the raw source slice so the inline token engine
//! can process it per output format at render time.

pub mod toc;

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::ir::{Block, CalloutKind, CodeBlock, ImageBlock, List, ListItem, TableBlock};

pub use toc::generate_toc;

/// Parse Markdown text into an ordered sequence of blocks.
///
/// Frontmatter is expected to be stripped already (see
/// [`crate::frontmatter::extract`]); a stray metadata block is skipped.
/// An empty document yields an empty sequence.
pub fn parse(source: &str) -> Vec<Block> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
    let events: Vec<(Event<'_>, Range<usize>)> =
        Parser::new_ext(source, options).into_offset_iter().collect();

    let mut cursor = Cursor {
        source,
        events: &events,
        pos: 0,
    };
    cursor.parse_blocks()
}

/// Title fallback: the text of the first H1 or H2 block, if any.
pub fn first_heading(blocks: &[Block]) -> Option<&str> {
    blocks.iter().find_map(|block| match block {
        Block::Heading { level, text } if *level <= 2 => Some(text.as_str()),
        _ => None,
    })
}

/// Peekable cursor over the event stream.
///
/// Handlers consume their own close tag and leave the cursor on the next
/// unconsumed event, so the top-level loop never has to track indices.
struct Cursor<'a> {
    source: &'a str,
    events: &'a [(Event<'a>, Range<usize>)],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a (Event<'a>, Range<usize>)> {
        self.events.get(self.pos)
    }

    fn bump(&mut self) -> Option<&'a (Event<'a>, Range<usize>)> {
        let ev = self.events.get(self.pos);
        self.pos += 1;
        ev
    }

    fn parse_blocks(&mut self) -> Vec<Block> {
        let mut blocks = Vec::new();

        while let Some((event, range)) = self.peek() {
            let range = range.clone();
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    let level = heading_level(*level);
                    self.bump();
                    self.skip_until(|end| matches!(end, TagEnd::Heading(_)));
                    blocks.push(Block::Heading {
                        level,
                        text: heading_text(&self.source[range]),
                    });
                }
                Event::Start(Tag::Paragraph) => {
                    self.bump();
                    blocks.push(self.parse_paragraph(range));
                }
                Event::Start(Tag::BlockQuote(_)) => {
                    self.bump();
                    blocks.push(Block::Blockquote(self.parse_blockquote()));
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().unwrap_or("").to_string()
                        }
                        CodeBlockKind::Indented => String::new(),
                    };
                    self.bump();
                    let text = self.collect_text(|end| matches!(end, TagEnd::CodeBlock));
                    blocks.push(Block::Code(CodeBlock { text, lang }));
                }
                Event::Start(Tag::List(start)) => {
                    let ordered = start.is_some();
                    self.bump();
                    blocks.push(Block::List(self.parse_list(ordered)));
                }
                Event::Start(Tag::Table(_)) => {
                    self.bump();
                    blocks.push(Block::Table(self.parse_table()));
                }
                Event::Start(Tag::HtmlBlock) => {
                    self.bump();
                    self.skip_until(|end| matches!(end, TagEnd::HtmlBlock));
                }
                Event::Start(Tag::MetadataBlock(_)) => {
                    self.bump();
                    self.skip_until(|end| matches!(end, TagEnd::MetadataBlock(_)));
                }
                // Rules, footnotes, stray HTML and anything else unhandled:
                // advance one position.
                _ => {
                    self.bump();
                }
            }
        }

        blocks
    }

    /// Skip events until the predicate matches an `End` tag (consumed).
    fn skip_until(&mut self, is_end: impl Fn(&TagEnd) -> bool) {
        while let Some((event, _)) = self.bump() {
            if let Event::End(end) = event
                && is_end(end)
            {
                break;
            }
        }
    }

    /// Concatenate `Text`/`Code` event content until the matching close tag.
    fn collect_text(&mut self, is_end: impl Fn(&TagEnd) -> bool) -> String {
        let mut out = String::new();
        while let Some((event, _)) = self.bump() {
            match event {
                Event::End(end) if is_end(end) => break,
                Event::Text(t) | Event::Code(t) => out.push_str(t),
                Event::SoftBreak | Event::HardBreak => out.push('\n'),
                _ => {}
            }
        }
        out
    }

    /// A paragraph whose sole inline content is one image becomes an
    /// [`Block::Image`]; anything else keeps its raw source text (callout
    /// markers checked first).
    fn parse_paragraph(&mut self, range: Range<usize>) -> Block {
        if let Some(image) = self.try_parse_sole_image() {
            return Block::Image(image);
        }

        self.skip_until(|end| matches!(end, TagEnd::Paragraph));
        let text = clean_lines(self.source[range].trim());

        match detect_callout(&text) {
            Some((kind, rest)) => Block::Callout { kind, text: rest },
            None => Block::Paragraph(text),
        }
    }

    /// Lookahead from inside a paragraph: if the content is exactly one image
    /// (plus surrounding whitespace), consume through the paragraph close and
    /// return it. Leaves the cursor untouched otherwise.
    fn try_parse_sole_image(&mut self) -> Option<ImageBlock> {
        let mut i = self.pos;
        let mut image: Option<ImageBlock> = None;

        // Leading whitespace-only text.
        while let Some((Event::Text(t), _)) = self.events.get(i) {
            if !t.trim().is_empty() {
                return None;
            }
            i += 1;
        }

        if let Some((Event::Start(Tag::Image { dest_url, title, .. }), _)) = self.events.get(i) {
            let src = dest_url.to_string();
            let caption = title.to_string();
            let mut alt = String::new();
            i += 1;
            loop {
                match self.events.get(i) {
                    Some((Event::End(TagEnd::Image), _)) => {
                        i += 1;
                        break;
                    }
                    Some((Event::Text(t) | Event::Code(t), _)) => {
                        alt.push_str(t);
                        i += 1;
                    }
                    Some(_) => i += 1,
                    None => return None,
                }
            }
            image = Some(ImageBlock { src, alt, caption });
        } else {
            return None;
        }

        // Trailing whitespace-only text, then the paragraph close.
        loop {
            match self.events.get(i) {
                Some((Event::Text(t), _)) if t.trim().is_empty() => i += 1,
                Some((Event::End(TagEnd::Paragraph), _)) => {
                    self.pos = i + 1;
                    return image;
                }
                _ => return None,
            }
        }
    }

    /// Concatenate the raw text of every paragraph inside the quote until the
    /// matching close marker (nested quotes are flattened into the same text).
    fn parse_blockquote(&mut self) -> String {
        let mut depth = 1usize;
        let mut text = String::new();

        while let Some((event, range)) = self.bump() {
            match event {
                Event::Start(Tag::BlockQuote(_)) => depth += 1,
                Event::End(TagEnd::BlockQuote(_)) => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Event::Start(Tag::Paragraph) => {
                    let range = range.clone();
                    self.skip_until(|end| matches!(end, TagEnd::Paragraph));
                    text.push_str(&strip_quote_markers(self.source[range].trim()));
                }
                // Text from other structures inside the quote (list items,
                // headings) still counts as quote content.
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
        }

        text
    }

    /// Called after `Start(List)` has been consumed; returns past `End(List)`.
    fn parse_list(&mut self, ordered: bool) -> List {
        let mut items = Vec::new();

        while let Some((event, _)) = self.bump() {
            match event {
                Event::Start(Tag::Item) => items.push(self.parse_item()),
                Event::End(TagEnd::List(_)) => break,
                _ => {}
            }
        }

        List { ordered, items }
    }

    /// One list item: own text (tight or wrapped in a paragraph), an optional
    /// nested sub-list, or both. An item opening directly with a nested list
    /// produces `text: None`.
    fn parse_item(&mut self) -> ListItem {
        let mut item = ListItem::default();

        loop {
            let Some((event, range)) = self.peek() else {
                break;
            };
            let range = range.clone();
            match event {
                Event::End(TagEnd::Item) => {
                    self.bump();
                    break;
                }
                Event::Start(Tag::List(start)) => {
                    let ordered = start.is_some();
                    self.bump();
                    let list = self.parse_list(ordered);
                    // A second sub-list under the same item folds into the
                    // first; the IR models one nested list per item.
                    match item.nested.as_mut() {
                        Some(nested) => nested.items.extend(list.items),
                        None => item.nested = Some(list),
                    }
                }
                Event::Start(Tag::Paragraph) => {
                    self.bump();
                    self.skip_until(|end| matches!(end, TagEnd::Paragraph));
                    push_item_text(&mut item, clean_lines(self.source[range].trim()));
                }
                // Tight items carry their inline content directly: accumulate
                // the raw span of consecutive inline-level events.
                _ => {
                    let start = range.start;
                    let mut end = range.end;
                    self.bump();
                    while let Some((event, range)) = self.peek() {
                        match event {
                            Event::End(TagEnd::Item)
                            | Event::Start(Tag::List(_))
                            | Event::Start(Tag::Paragraph) => break,
                            _ => {
                                end = end.max(range.end);
                                self.bump();
                            }
                        }
                    }
                    push_item_text(&mut item, clean_lines(self.source[start..end].trim()));
                }
            }
        }

        item
    }

    /// Called after `Start(Table)` has been consumed; returns past `End(Table)`.
    fn parse_table(&mut self) -> TableBlock {
        let mut table = TableBlock::default();

        while let Some((event, _)) = self.bump() {
            match event {
                Event::Start(Tag::TableHead) => {
                    while let Some((event, _)) = self.peek() {
                        match event {
                            Event::Start(Tag::TableCell) => {
                                self.bump();
                                table.headers.push(self.parse_cell());
                            }
                            Event::End(TagEnd::TableHead) => {
                                self.bump();
                                break;
                            }
                            _ => {
                                self.bump();
                            }
                        }
                    }
                }
                Event::Start(Tag::TableRow) => {
                    let mut row = Vec::new();
                    while let Some((event, _)) = self.peek() {
                        match event {
                            Event::Start(Tag::TableCell) => {
                                self.bump();
                                row.push(self.parse_cell());
                            }
                            Event::End(TagEnd::TableRow) => {
                                self.bump();
                                break;
                            }
                            _ => {
                                self.bump();
                            }
                        }
                    }
                    table.rows.push(row);
                }
                Event::End(TagEnd::Table) => break,
                _ => {}
            }
        }

        table
    }

    /// Raw source span of a cell's inline events (excludes the `|` delimiters).
    fn parse_cell(&mut self) -> String {
        let mut start = None;
        let mut end = 0usize;

        while let Some((event, range)) = self.bump() {
            match event {
                Event::End(TagEnd::TableCell) => break,
                _ => {
                    start.get_or_insert(range.start);
                    end = end.max(range.end);
                }
            }
        }

        match start {
            Some(start) => self.source[start..end].trim().to_string(),
            None => String::new(),
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Literal heading text from the raw source span: ATX markers stripped,
/// closing hash sequence removed only when space-separated, setext underline
/// dropped. Emphasis and link syntax stay as written.
fn heading_text(raw: &str) -> String {
    let raw = raw.trim();
    let text = raw.trim_start_matches('#').trim_start();

    // Setext headings span two lines; the underline is not content.
    let text = text.lines().next().unwrap_or("").trim_end();

    let without_closing = text.trim_end_matches('#');
    if without_closing.len() != text.len()
        && without_closing.ends_with(|c: char| c.is_whitespace())
    {
        without_closing.trim_end().to_string()
    } else {
        text.to_string()
    }
}

/// Strip per-line leading whitespace from a multi-line raw slice (lazy
/// continuation indents are not content).
fn clean_lines(raw: &str) -> String {
    if !raw.contains('\n') {
        return raw.to_string();
    }
    raw.lines()
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Like [`clean_lines`], additionally dropping `>` continuation markers.
fn strip_quote_markers(raw: &str) -> String {
    if !raw.contains('\n') {
        return raw.to_string();
    }
    raw.lines()
        .map(|line| line.trim_start().trim_start_matches('>').trim_start())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_item_text(item: &mut ListItem, text: String) {
    if text.is_empty() {
        return;
    }
    match item.text.as_mut() {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(&text);
        }
        None => item.text = Some(text),
    }
}

/// Case-insensitive `[!KIND]` prefix check against the recognized callout
/// kinds. Returns the kind and the remaining text.
fn detect_callout(text: &str) -> Option<(CalloutKind, String)> {
    for kind in CalloutKind::ALL {
        let marker_len = kind.name().len() + 3;
        if text.len() >= marker_len
            && text.is_char_boundary(marker_len)
            && text[..marker_len].eq_ignore_ascii_case(&format!("[!{}]", kind.name()))
        {
            return Some((kind, text[marker_len..].trim_start().to_string()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let blocks = parse("# Title\n\nSome text.\n\n## Section\n");
        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 1,
                text: "Title".to_string()
            }
        );
        assert_eq!(blocks[1], Block::Paragraph("Some text.".to_string()));
        assert_eq!(
            blocks[2],
            Block::Heading {
                level: 2,
                text: "Section".to_string()
            }
        );
    }

    #[test]
    fn test_heading_keeps_raw_inline_markup() {
        let blocks = parse("## **Bold** Section\n");
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 2,
                text: "**Bold** Section".to_string()
            }
        );
    }

    #[test]
    fn test_paragraph_keeps_link_syntax() {
        let blocks = parse("See [docs](guide.md) for more.\n");
        assert_eq!(
            blocks[0],
            Block::Paragraph("See [docs](guide.md) for more.".to_string())
        );
    }

    #[test]
    fn test_callout_detection() {
        let blocks = parse("[!NOTE] Remember this.\n");
        assert_eq!(
            blocks[0],
            Block::Callout {
                kind: CalloutKind::Note,
                text: "Remember this.".to_string()
            }
        );
    }

    #[test]
    fn test_callout_case_insensitive() {
        let blocks = parse("[!warning] Careful.\n");
        assert_eq!(
            blocks[0],
            Block::Callout {
                kind: CalloutKind::Warning,
                text: "Careful.".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_marker_stays_paragraph() {
        let blocks = parse("[!BOGUS] Not a callout.\n");
        assert_eq!(
            blocks[0],
            Block::Paragraph("[!BOGUS] Not a callout.".to_string())
        );
    }

    #[test]
    fn test_blockquote() {
        let blocks = parse("> A quote\n");
        assert_eq!(blocks[0], Block::Blockquote("A quote".to_string()));
    }

    #[test]
    fn test_multiline_blockquote_strips_markers() {
        let blocks = parse("> line one\n> line two\n");
        assert_eq!(
            blocks[0],
            Block::Blockquote("line one\nline two".to_string())
        );
    }

    #[test]
    fn test_fenced_code() {
        let blocks = parse("```python\nprint(\"hi\")\n```\n");
        assert_eq!(
            blocks[0],
            Block::Code(CodeBlock {
                text: "print(\"hi\")\n".to_string(),
                lang: "python".to_string()
            })
        );
    }

    #[test]
    fn test_code_without_language() {
        let blocks = parse("```\nraw\n```\n");
        let Block::Code(code) = &blocks[0] else {
            panic!("expected code block");
        };
        assert_eq!(code.lang, "");
    }

    #[test]
    fn test_standalone_image() {
        let blocks = parse("![Alt text](http://example.com/img.png \"Caption here\")\n");
        assert_eq!(
            blocks[0],
            Block::Image(ImageBlock {
                src: "http://example.com/img.png".to_string(),
                alt: "Alt text".to_string(),
                caption: "Caption here".to_string(),
            })
        );
    }

    #[test]
    fn test_image_with_text_stays_paragraph() {
        let blocks = parse("Before ![alt](img.png) after\n");
        assert_eq!(
            blocks[0],
            Block::Paragraph("Before ![alt](img.png) after".to_string())
        );
    }

    #[test]
    fn test_flat_list() {
        let blocks = parse("- one\n- two\n");
        assert_eq!(
            blocks[0],
            Block::List(List {
                ordered: false,
                items: vec![ListItem::text("one"), ListItem::text("two")],
            })
        );
    }

    #[test]
    fn test_ordered_list() {
        let blocks = parse("1. first\n2. second\n");
        let Block::List(list) = &blocks[0] else {
            panic!("expected list");
        };
        assert!(list.ordered);
        assert_eq!(list.items.len(), 2);
    }

    #[test]
    fn test_nested_list_structure() {
        let blocks = parse("- A\n  - B\n  - C\n");
        let Block::List(list) = &blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(list.items.len(), 1);
        let item = &list.items[0];
        assert_eq!(item.text.as_deref(), Some("A"));
        let nested = item.nested.as_ref().expect("nested list");
        assert!(!nested.ordered);
        assert_eq!(
            nested.items,
            vec![ListItem::text("B"), ListItem::text("C")]
        );
    }

    #[test]
    fn test_deeply_nested_mixed_lists() {
        let md = "- Parent A\n  - Child A1\n  - Child A2\n- Parent B\n  1. Sub B1\n     - Subsub B1a\n";
        let blocks = parse(md);
        let Block::List(list) = &blocks[0] else {
            panic!("expected list");
        };
        assert_eq!(list.items.len(), 2);

        let a = &list.items[0];
        assert_eq!(a.text.as_deref(), Some("Parent A"));
        let a_nested = a.nested.as_ref().unwrap();
        assert_eq!(
            a_nested.items,
            vec![ListItem::text("Child A1"), ListItem::text("Child A2")]
        );

        let b = &list.items[1];
        assert_eq!(b.text.as_deref(), Some("Parent B"));
        let b_nested = b.nested.as_ref().unwrap();
        assert!(b_nested.ordered);
        let sub = &b_nested.items[0];
        assert_eq!(sub.text.as_deref(), Some("Sub B1"));
        let subsub = sub.nested.as_ref().unwrap();
        assert_eq!(subsub.items, vec![ListItem::text("Subsub B1a")]);
    }

    #[test]
    fn test_table() {
        let md = "| Name | Age |\n|------|-----|\n| Ada  | 36  |\n| Bob  | 42  |\n";
        let blocks = parse(md);
        assert_eq!(
            blocks[0],
            Block::Table(TableBlock {
                headers: vec!["Name".to_string(), "Age".to_string()],
                rows: vec![
                    vec!["Ada".to_string(), "36".to_string()],
                    vec!["Bob".to_string(), "42".to_string()],
                ],
            })
        );
    }

    #[test]
    fn test_html_block_skipped() {
        let blocks = parse("<div>raw</div>\n\nafter\n");
        assert_eq!(blocks, vec![Block::Paragraph("after".to_string())]);
    }

    #[test]
    fn test_first_heading() {
        let blocks = parse("intro\n\n## Subtitle\n");
        assert_eq!(first_heading(&blocks), Some("Subtitle"));
        assert_eq!(first_heading(&[]), None);
    }
}
