//! Renderer integration tests: the same parsed document through all three
//! formats.

use shale::parse::parse;
use shale::render::{Format, Registries, RenderContext, render_blocks};

const KITCHEN_SINK: &str = "\
# Sample Title

A paragraph with `inline` code and [a link](other.md).

- item one
- item two

> A quote

```python
print(\"hi\")
```
";

fn render(md: &str, format: Format) -> String {
    let blocks = parse(md);
    render_blocks(&blocks, format, &RenderContext::new(), &Registries::new())
}

#[test]
fn test_html_heading_round_trip() {
    assert_eq!(
        render("# Hello World", Format::Html),
        "<h1 id='hello-world' class='content-h1'>Hello World</h1>"
    );
}

#[test]
fn test_html_heading_escapes() {
    assert_eq!(
        render("# Tips & <Tricks>", Format::Html),
        "<h1 id='tips-tricks' class='content-h1'>Tips &amp; &lt;Tricks&gt;</h1>"
    );
}

#[test]
fn test_html_kitchen_sink() {
    let html = render(KITCHEN_SINK, Format::Html);
    assert!(html.contains("<h1 id='sample-title' class='content-h1'>Sample Title</h1>"));
    assert!(html.contains("<code class=\"content-code\">inline</code>"));
    assert!(html.contains("<a href=\"other.html\" class=\"content-link\">a link</a>"));
    assert!(html.contains("<ul class='content-ul'><li>item one</li><li>item two</li></ul>"));
    assert!(html.contains("<blockquote class='content-blockquote'><p>A quote</p></blockquote>"));
    assert!(html.contains("<pre class='content-code'><code class=\"language-python\">print(&quot;hi&quot;)\n</code></pre>"));
}

#[test]
fn test_gemtext_kitchen_sink() {
    let gmi = render(KITCHEN_SINK, Format::Gemini);
    assert!(gmi.contains("# Sample Title"));
    // Paragraph link stripped to its label, destination on its own line.
    assert!(gmi.contains("A paragraph with `inline` code and a link."));
    assert!(gmi.contains("=> other.gmi a link"));
    assert!(gmi.contains("* item one"));
    assert!(gmi.contains("> A quote"));
    assert!(gmi.contains("```\nprint(\"hi\")\n```"));
}

#[test]
fn test_gopher_kitchen_sink_line_discipline() {
    let txt = render(KITCHEN_SINK, Format::Gopher);

    // Every line has the fixed shape and the document ends with CRLF.
    assert!(txt.ends_with("\r\n"));
    let body = txt.strip_suffix("\r\n").unwrap();
    for line in body.split("\r\n") {
        assert!(line.starts_with('i'), "unexpected line: {line:?}");
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), 4, "unexpected field count: {line:?}");
        assert_eq!(fields[1], "");
        assert_eq!(fields[2], "localhost");
        assert_eq!(fields[3], "70");
    }

    assert!(txt.contains("i# Sample Title\t"));
    assert!(txt.contains("iprint(\"hi\")\t"));
    assert!(txt.contains("i- item one\t"));
}

#[test]
fn test_gopher_final_two_bytes_are_crlf() {
    let txt = render("just a line", Format::Gopher);
    assert_eq!(&txt.as_bytes()[txt.len() - 2..], b"\r\n");
}

#[test]
fn test_callout_across_formats() {
    let md = "[!WARNING] Mind the gap.";
    let html = render(md, Format::Html);
    assert!(html.contains("callout-warning"));
    assert!(html.contains("<strong>Warning</strong> Mind the gap."));

    // The minimal formats carry the body as a plain line.
    assert!(render(md, Format::Gemini).contains("Mind the gap."));
    assert!(render(md, Format::Gopher).contains("iMind the gap.\t"));
}

#[test]
fn test_table_only_in_html() {
    let md = "| A | B |\n|---|---|\n| 1 | 2 |";
    assert!(render(md, Format::Html).contains("<table class='content-table'>"));
    assert_eq!(render(md, Format::Gemini), "");
    assert_eq!(render(md, Format::Gopher), "\r\n");
}

#[test]
fn test_variables_expand_before_inline_rendering() {
    let mut registries = Registries::new();
    registries
        .vars
        .register("promo", |_| "[Buy now](shop.md)".to_string());
    let blocks = parse("Deal: {{promo}}");
    let html = render_blocks(
        &blocks,
        Format::Html,
        &RenderContext::new(),
        &registries,
    );
    assert!(html.contains("<a href=\"shop.html\" class=\"content-link\">Buy now</a>"));
}

#[test]
fn test_datetime_placeholders_across_formats() {
    let mut ctx = RenderContext::new();
    ctx.creation_date = Some("05/12/2025".to_string());
    ctx.creation_time = Some("13:14".to_string());
    let registries = Registries::new();
    let blocks = parse("# Title with {{creation_date}}\n\nParagraph with {{creation_time}}.");

    let html = render_blocks(&blocks, Format::Html, &ctx, &registries);
    assert!(html.contains("Title with 05/12/2025"));
    assert!(html.contains("Paragraph with 13:14."));

    let gmi = render_blocks(&blocks, Format::Gemini, &ctx, &registries);
    assert!(gmi.contains("# Title with 05/12/2025"));
    assert!(gmi.contains("Paragraph with 13:14."));

    let txt = render_blocks(&blocks, Format::Gopher, &ctx, &registries);
    assert!(txt.contains("i# Title with 05/12/2025\t"));
    assert!(txt.contains("iParagraph with 13:14.\t"));
}

#[test]
fn test_gemtext_document_header() {
    let mut ctx = RenderContext::new();
    ctx.title = Some("My Capsule".to_string());
    ctx.description = Some("Logs and notes".to_string());
    ctx.creation_date = Some("01/01/2025".to_string());
    let out = render_blocks(&parse("Hello."), Format::Gemini, &ctx, &Registries::new());
    assert!(out.starts_with("# My Capsule\n\nLogs and notes\n\n01/01/2025\n\nHello."));
}

#[test]
fn test_unknown_block_content_never_panics() {
    // Thematic breaks and raw HTML are skipped, not rendered.
    let md = "before\n\n---\n\n<div>html</div>\n\nafter";
    let html = render(md, Format::Html);
    assert!(html.contains("before"));
    assert!(html.contains("after"));
    assert!(!html.contains("<div>html</div>"));
}
