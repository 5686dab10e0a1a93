//! Packing a rendered day document into Notion paragraph blocks.
//!
//! The Notion API rejects pages with too many children or rich-text runs
//! longer than 2000 characters, so documents are packed conservatively:
//! short documents become one block per non-blank line, long documents a
//! single (possibly truncated) block. Packing is lossy.

use serde::Serialize;

pub const MAX_BLOCKS: usize = 50;
/// Per-block text cap in UTF-16 code units, the unit Notion measures its
/// 2000 limit in. The rest is headroom.
pub const MAX_BLOCK_CHARS: usize = 1800;
/// Documents with more non-blank lines than this are packed into one block.
pub const LONG_DOCUMENT_LINES: usize = 20;

pub const DOCUMENT_TRUNCATION_MARKER: &str = "...\n\n(truncated: content too long to show in full)";
pub const LINE_TRUNCATION_MARKER: &str = "...";
pub const EMPTY_DAY_TEXT: &str = "No messages this day.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphBlock {
    pub text: String,
}

impl ParagraphBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn to_notion(&self) -> NotionBlock<'_> {
        NotionBlock {
            object: "block",
            kind: "paragraph",
            paragraph: Paragraph {
                rich_text: [RichText {
                    kind: "text",
                    text: TextContent {
                        content: &self.text,
                    },
                }],
            },
        }
    }
}

/// Wire shape of a paragraph block in the Notion API.
#[derive(Debug, Serialize)]
pub struct NotionBlock<'a> {
    object: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    paragraph: Paragraph<'a>,
}

#[derive(Debug, Serialize)]
struct Paragraph<'a> {
    rich_text: [RichText<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RichText<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextContent<'a>,
}

#[derive(Debug, Serialize)]
struct TextContent<'a> {
    content: &'a str,
}

pub fn pack_blocks(document: &str) -> Vec<ParagraphBlock> {
    let lines: Vec<&str> = document
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    let mut blocks: Vec<ParagraphBlock> = if lines.len() > LONG_DOCUMENT_LINES {
        let joined = lines.join("\n");
        vec![ParagraphBlock::new(truncate_with_marker(
            &joined,
            DOCUMENT_TRUNCATION_MARKER,
        ))]
    } else {
        lines
            .iter()
            .take(LONG_DOCUMENT_LINES)
            .map(|line| ParagraphBlock::new(truncate_with_marker(line, LINE_TRUNCATION_MARKER)))
            .collect()
    };

    blocks.truncate(MAX_BLOCKS);

    if blocks.is_empty() {
        blocks.push(ParagraphBlock::new(EMPTY_DAY_TEXT));
    }

    blocks
}

/// Cuts `text` at the last char boundary that keeps it within
/// [`MAX_BLOCK_CHARS`] UTF-16 code units, then appends `marker`.
fn truncate_with_marker(text: &str, marker: &str) -> String {
    let mut units = 0;
    for (idx, c) in text.char_indices() {
        units += c.len_utf16();
        if units > MAX_BLOCK_CHARS {
            return format!("{}{marker}", &text[..idx]);
        }
    }
    text.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_lines(n: usize) -> String {
        (0..n)
            .map(|i| format!("10:{i:02} A: line {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn empty_document_yields_placeholder() {
        assert_eq!(pack_blocks(""), vec![ParagraphBlock::new(EMPTY_DAY_TEXT)]);
        assert_eq!(
            pack_blocks("\n   \n\t\n"),
            vec![ParagraphBlock::new(EMPTY_DAY_TEXT)]
        );
    }

    #[test]
    fn short_document_is_one_block_per_line() {
        let blocks = pack_blocks(&doc_with_lines(10));
        assert_eq!(blocks.len(), 10);
        assert_eq!(blocks[3].text, "10:03 A: line 3");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let blocks = pack_blocks("# 2025-01-01\n\n**A** (10:00)\nhi\n\n");
        let texts: Vec<_> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["# 2025-01-01", "**A** (10:00)", "hi"]);
    }

    #[test]
    fn twenty_lines_stay_separate_but_twenty_one_merge() {
        assert_eq!(pack_blocks(&doc_with_lines(20)).len(), 20);
        assert_eq!(pack_blocks(&doc_with_lines(21)).len(), 1);
    }

    #[test]
    fn long_document_is_a_single_block() {
        let doc = doc_with_lines(25);
        let blocks = pack_blocks(&doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, doc);
    }

    #[test]
    fn long_document_over_cap_is_truncated_with_marker() {
        let doc = (0..100)
            .map(|i| format!("{i:03} {}", "가".repeat(40)))
            .collect::<Vec<_>>()
            .join("\n");
        let blocks = pack_blocks(&doc);
        assert_eq!(blocks.len(), 1);
        let text = &blocks[0].text;
        assert!(text.ends_with(DOCUMENT_TRUNCATION_MARKER));
        assert_eq!(
            text.chars().count(),
            MAX_BLOCK_CHARS + DOCUMENT_TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn overlong_line_is_truncated_with_ellipsis() {
        let line = "x".repeat(MAX_BLOCK_CHARS + 50);
        let blocks = pack_blocks(&format!("{line}\nshort"));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text.len(), MAX_BLOCK_CHARS + LINE_TRUNCATION_MARKER.len());
        assert!(blocks[0].text.ends_with(LINE_TRUNCATION_MARKER));
        assert_eq!(blocks[1].text, "short");
    }

    #[test]
    fn line_exactly_at_cap_is_untouched() {
        let line = "y".repeat(MAX_BLOCK_CHARS);
        assert_eq!(pack_blocks(&line)[0].text, line);
    }

    #[test]
    fn block_invariants_hold_across_sizes() {
        for n in [0, 1, 5, 20, 21, 60, 500] {
            let doc = (0..n)
                .map(|i| format!("{i} {}", "z".repeat(i * 13 % 2500)))
                .collect::<Vec<_>>()
                .join("\n");
            let blocks = pack_blocks(&doc);
            assert!(!blocks.is_empty());
            assert!(blocks.len() <= MAX_BLOCKS);
            for block in &blocks {
                assert!(
                    block.text.chars().count()
                        <= MAX_BLOCK_CHARS + DOCUMENT_TRUNCATION_MARKER.chars().count()
                );
            }
            assert_eq!(blocks, pack_blocks(&doc));
        }
    }

    fn utf16_len(text: &str) -> usize {
        text.encode_utf16().count()
    }

    #[test]
    fn emoji_line_is_capped_in_utf16_units() {
        let blocks = pack_blocks(&"😀".repeat(1900));
        assert_eq!(blocks.len(), 1);
        let text = &blocks[0].text;
        assert!(text.ends_with(LINE_TRUNCATION_MARKER));
        assert!(utf16_len(text) <= MAX_BLOCK_CHARS + utf16_len(LINE_TRUNCATION_MARKER));
        assert_eq!(text.chars().filter(|c| *c == '😀').count(), MAX_BLOCK_CHARS / 2);
    }

    #[test]
    fn emoji_long_document_is_capped_in_utf16_units() {
        let doc = (0..25)
            .map(|_| "😀".repeat(74))
            .collect::<Vec<_>>()
            .join("\n");
        let blocks = pack_blocks(&doc);
        assert_eq!(blocks.len(), 1);
        let text = &blocks[0].text;
        assert!(text.ends_with(DOCUMENT_TRUNCATION_MARKER));
        assert!(utf16_len(text) <= MAX_BLOCK_CHARS + utf16_len(DOCUMENT_TRUNCATION_MARKER));
    }

    #[test]
    fn odd_cap_never_splits_a_surrogate_pair() {
        let line = format!("a{}", "😀".repeat(1000));
        let text = &pack_blocks(&line)[0].text;
        let kept = text.strip_suffix(LINE_TRUNCATION_MARKER).unwrap();
        assert_eq!(utf16_len(kept), MAX_BLOCK_CHARS - 1);
    }

    #[test]
    fn serializes_to_notion_paragraph_shape() {
        let block = ParagraphBlock::new("hi");
        let value = serde_json::to_value(block.to_notion()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": {
                    "rich_text": [{ "type": "text", "text": { "content": "hi" } }]
                }
            })
        );
    }
}
