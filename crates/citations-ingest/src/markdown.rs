//! Markdown to plain text rendering.

use pulldown_cmark::{Event, Parser, Tag};

/// Render Markdown as plain text for chunking.
///
/// Headings and paragraphs end with a blank line so paragraph boundaries
/// survive. Code blocks are kept verbatim, list items get a `- ` marker.
pub fn to_plain_text(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut text = String::new();

    for event in parser {
        match event {
            Event::End(Tag::Heading(_, _, _)) | Event::End(Tag::Paragraph) => {
                text.push_str("\n\n");
            }
            Event::End(Tag::CodeBlock(_)) => {
                text.push('\n');
            }
            Event::End(Tag::List(_)) => {
                text.push('\n');
            }
            Event::Start(Tag::Item) => {
                text.push_str("- ");
            }
            Event::End(Tag::Item) => {
                if !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            Event::Text(t) | Event::Code(t) => {
                text.push_str(&t);
            }
            Event::SoftBreak | Event::HardBreak => {
                text.push('\n');
            }
            _ => {}
        }
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_markup() {
        let markdown = r#"# My Document

This is a paragraph with **bold** text and a [link](https://example.com).

## Section One

```rust
fn main() {}
```

- Item one
- Item `two`
"#;

        let text = to_plain_text(markdown);

        assert!(text.starts_with("My Document\n\nThis is a paragraph with bold text and a link."));
        assert!(text.contains("Section One\n\n"));
        assert!(text.contains("fn main() {}"));
        assert!(text.contains("- Item one\n- Item two"));
        assert!(!text.contains('#'));
        assert!(!text.contains("https://example.com"));
    }

    #[test]
    fn test_paragraph_breaks_survive() {
        let text = to_plain_text("First paragraph.\n\nSecond paragraph.");
        assert_eq!(text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(to_plain_text(""), "");
        assert_eq!(to_plain_text("   \n\n"), "");
    }
}
