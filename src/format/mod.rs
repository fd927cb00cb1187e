//! Response formatting pipeline: fence extraction, inline code, and the
//! rich-text markup used for code explanations.

pub mod fences;
pub mod inline;
pub mod rich_text;

pub use fences::{extract_code_blocks, interleave, Extracted, Segment, PLAINTEXT};
pub use inline::{render_inline_code, InlineFragment};
pub use rich_text::{format_rich_text, parse_markup, RichSpan, RichStyle};
