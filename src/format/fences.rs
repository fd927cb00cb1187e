//! Fenced code-block extraction.
//!
//! Model responses arrive as plain text with Markdown-style triple-backtick
//! fences. Each fence is lifted out into a [`CodeBlock`] and replaced by a
//! positional `[CODE_BLOCK_<n>]` placeholder, so the surrounding prose can be
//! rendered separately from the code.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::message::CodeBlock;

/// Language recorded for fences without a tag.
pub const PLAINTEXT: &str = "plaintext";

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"```([A-Za-z0-9_+#.\-]+)?[ \t]*\n((?s:.*?))```").expect("valid fence regex")
    })
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\[CODE_BLOCK_(\d+)\]").expect("valid placeholder regex"))
}

pub fn placeholder(index: usize) -> String {
    format!("[CODE_BLOCK_{index}]")
}

/// De-fenced text together with the blocks its placeholders refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub code_blocks: Vec<CodeBlock>,
}

/// One renderable piece of a de-fenced message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Code(&'a CodeBlock),
}

/// Replace every well-formed fence with a placeholder, left to right.
pub fn extract_code_blocks(text: &str) -> Extracted {
    let mut code_blocks = Vec::new();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in fence_regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);

        let language = caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| PLAINTEXT.to_string());
        let code = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

        out.push_str(&placeholder(code_blocks.len()));
        code_blocks.push(CodeBlock::new(language, code));
        last = whole.end();
    }

    if code_blocks.is_empty() {
        return Extracted {
            text: text.to_string(),
            code_blocks,
        };
    }

    out.push_str(&text[last..]);
    Extracted {
        text: out,
        code_blocks,
    }
}

/// Text between placeholders. Always one more segment than placeholders.
pub fn split_segments(text: &str) -> Vec<&str> {
    placeholder_regex().split(text).collect()
}

/// Zip text segments with blocks by position.
///
/// Segment `i` is followed by block `i` when one exists; surplus
/// placeholders without a block render as nothing.
pub fn interleave<'a>(text: &'a str, blocks: &'a [CodeBlock]) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    for (index, part) in split_segments(text).into_iter().enumerate() {
        if !part.is_empty() {
            segments.push(Segment::Text(part));
        }
        if let Some(block) = blocks.get(index) {
            segments.push(Segment::Code(block));
        }
    }
    segments
}

/// Put each block's code back where its placeholder sits.
pub fn restore(text: &str, blocks: &[CodeBlock]) -> String {
    placeholder_regex()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| blocks.get(index))
                .map(|block| block.code.clone())
                .unwrap_or_default()
        })
        .into_owned()
}

/// Rebuild fenced Markdown from de-fenced text, for sending a stored reply
/// back to the model. Plaintext blocks get an untagged fence.
pub fn refence(text: &str, blocks: &[CodeBlock]) -> String {
    placeholder_regex()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let Some(block) = caps[1].parse::<usize>().ok().and_then(|i| blocks.get(i)) else {
                return String::new();
            };
            let tag = if block.language == PLAINTEXT {
                ""
            } else {
                block.language.as_str()
            };
            format!("```{tag}\n{}\n```", block.code)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder_indices(text: &str) -> Vec<usize> {
        placeholder_regex()
            .captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
            .collect()
    }

    #[test]
    fn text_without_fences_is_returned_unchanged() {
        let input = "Just some prose with `inline` code and no fences.";
        let extracted = extract_code_blocks(input);
        assert_eq!(extracted.text, input);
        assert!(extracted.code_blocks.is_empty());

        let again = extract_code_blocks(&extracted.text);
        assert_eq!(again, extracted);
    }

    #[test]
    fn single_tagged_fence_becomes_placeholder() {
        let extracted = extract_code_blocks("Here:\n```python\nprint(1)\n```\nDone");
        assert_eq!(extracted.text, "Here:\n[CODE_BLOCK_0]\nDone");
        assert_eq!(extracted.code_blocks.len(), 1);
        assert_eq!(extracted.code_blocks[0].language, "python");
        assert_eq!(extracted.code_blocks[0].code, "print(1)");
        assert!(extracted.code_blocks[0].explanation.is_empty());
    }

    #[test]
    fn untagged_fence_is_plaintext() {
        let extracted = extract_code_blocks("```\nls -la\n```");
        assert_eq!(extracted.text, "[CODE_BLOCK_0]");
        assert_eq!(extracted.code_blocks[0].language, PLAINTEXT);
        assert_eq!(extracted.code_blocks[0].code, "ls -la");
    }

    #[test]
    fn multiple_fences_are_numbered_left_to_right() {
        let input = "a\n```rust\nfn a() {}\n```\nb\n```js\nlet b;\n```\nc\n```\nplain\n```";
        let extracted = extract_code_blocks(input);
        assert_eq!(extracted.code_blocks.len(), 3);
        assert_eq!(placeholder_indices(&extracted.text), vec![0, 1, 2]);
        let languages: Vec<&str> = extracted
            .code_blocks
            .iter()
            .map(|b| b.language.as_str())
            .collect();
        assert_eq!(languages, vec!["rust", "js", PLAINTEXT]);
    }

    #[test]
    fn identical_fences_get_distinct_placeholders() {
        let fence = "```sh\necho hi\n```";
        let input = format!("{fence}\nand again\n{fence}");
        let extracted = extract_code_blocks(&input);
        assert_eq!(extracted.text, "[CODE_BLOCK_0]\nand again\n[CODE_BLOCK_1]");
        assert_eq!(extracted.code_blocks[0], extracted.code_blocks[1]);
    }

    #[test]
    fn code_body_is_trimmed() {
        let extracted = extract_code_blocks("```go\n\n   x := 1\n\n```");
        assert_eq!(extracted.code_blocks[0].code, "x := 1");
    }

    #[test]
    fn tags_with_symbols_and_trailing_space_are_accepted() {
        let extracted = extract_code_blocks("```c++  \nint main() {}\n```");
        assert_eq!(extracted.code_blocks[0].language, "c++");
    }

    #[test]
    fn unterminated_fence_is_left_alone() {
        let input = "```python\nprint(1)\n";
        let extracted = extract_code_blocks(input);
        assert_eq!(extracted.text, input);
        assert!(extracted.code_blocks.is_empty());
    }

    #[test]
    fn segments_and_blocks_interleave_by_index() {
        let extracted = extract_code_blocks("Intro\n```py\nx = 1\n```\nmiddle\n```py\ny = 2\n```");
        let segments = interleave(&extracted.text, &extracted.code_blocks);
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], Segment::Text("Intro\n"));
        assert_eq!(segments[1], Segment::Code(&extracted.code_blocks[0]));
        assert_eq!(segments[2], Segment::Text("\nmiddle\n"));
        assert_eq!(segments[3], Segment::Code(&extracted.code_blocks[1]));
    }

    #[test]
    fn split_segments_counts_placeholders_plus_one() {
        assert_eq!(split_segments("a[CODE_BLOCK_0]b[CODE_BLOCK_1]").len(), 3);
        assert_eq!(split_segments("no placeholders").len(), 1);
    }

    #[test]
    fn restore_reconstructs_text_without_fence_markers() {
        let input = "Here:\n```python\nprint(1)\n```\nthen\n```\nplain\n```\nDone";
        let extracted = extract_code_blocks(input);
        let restored = restore(&extracted.text, &extracted.code_blocks);
        assert_eq!(restored, "Here:\nprint(1)\nthen\nplain\nDone");
    }

    #[test]
    fn refence_restores_original_fences() {
        let input = "Here:\n```python\nprint(1)\n```\nthen\n```\nplain\n```\nDone";
        let extracted = extract_code_blocks(input);
        assert_eq!(refence(&extracted.text, &extracted.code_blocks), input);
    }
}
