//! Parser integration tests: block structure across mixed documents and the
//! whitespace-stability property.

use proptest::prelude::*;

use shale::ir::Block;
use shale::parse::parse;

#[test]
fn test_kitchen_sink_block_sequence() {
    let md = "\
# Sample Title

A paragraph with `inline` code.

- item one
- item two

> A quote

```python
print(\"hi\")
```

| H1 | H2 |
|----|----|
| a  | b  |

[!NOTE] Remember.
";
    let blocks = parse(md);

    assert!(matches!(blocks[0], Block::Heading { level: 1, .. }));
    assert!(matches!(blocks[1], Block::Paragraph(_)));
    assert!(matches!(blocks[2], Block::List(_)));
    assert!(matches!(blocks[3], Block::Blockquote(_)));
    assert!(matches!(blocks[4], Block::Code(_)));
    assert!(matches!(blocks[5], Block::Table(_)));
    assert!(matches!(blocks[6], Block::Callout { .. }));
    assert_eq!(blocks.len(), 7);
}

#[test]
fn test_nested_list_invariant() {
    let blocks = parse("- A\n  - B\n  - C");
    let Block::List(list) = &blocks[0] else {
        panic!("expected a list block");
    };
    assert_eq!(list.items.len(), 1);
    let item = &list.items[0];
    assert_eq!(item.text.as_deref(), Some("A"));
    let nested = item.nested.as_ref().expect("nested list present");
    let texts: Vec<_> = nested
        .items
        .iter()
        .map(|i| i.text.as_deref().unwrap())
        .collect();
    assert_eq!(texts, vec!["B", "C"]);
}

#[test]
fn test_item_with_nested_list_and_no_text() {
    // A sub-list directly under an item must not be misread as sibling
    // content of the parent item.
    let blocks = parse("- parent\n  - child\n- next");
    let Block::List(list) = &blocks[0] else {
        panic!("expected a list block");
    };
    assert_eq!(list.items.len(), 2);
    assert_eq!(list.items[1].text.as_deref(), Some("next"));
    assert!(list.items[1].nested.is_none());
}

#[test]
fn test_empty_and_whitespace_documents() {
    assert!(parse("").is_empty());
    assert!(parse("\n\n\n").is_empty());
    assert!(parse("   \n").is_empty());
}

fn sample_block() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("# Heading".to_string()),
        Just("## Another heading".to_string()),
        Just("plain paragraph text".to_string()),
        Just("a paragraph with [a link](page.md) inside".to_string()),
        Just("- one\n- two".to_string()),
        Just("1. first\n2. second".to_string()),
        Just("> quoted".to_string()),
        Just("```\ncode here\n```".to_string()),
        Just("[!NOTE] heads up".to_string()),
        Just("![alt](img.png)".to_string()),
    ]
}

proptest! {
    /// Block count is stable under trailing-newline normalization.
    #[test]
    fn prop_block_count_stable_under_trailing_newlines(
        blocks in proptest::collection::vec(sample_block(), 1..6),
        trailing in 0usize..4,
    ) {
        let doc = blocks.join("\n\n");
        let padded = format!("{doc}{}", "\n".repeat(trailing));
        prop_assert_eq!(parse(&doc).len(), parse(&padded).len());
    }

    /// Parsing twice yields identical IR (no hidden state).
    #[test]
    fn prop_parse_is_pure(blocks in proptest::collection::vec(sample_block(), 0..5)) {
        let doc = blocks.join("\n\n");
        prop_assert_eq!(parse(&doc), parse(&doc));
    }
}
