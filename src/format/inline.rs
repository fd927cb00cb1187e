use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineFragment {
    Text(String),
    Code(String),
}

fn span_regex() -> &'static Regex {
    static SPAN: OnceLock<Regex> = OnceLock::new();
    SPAN.get_or_init(|| Regex::new(r"`[^`\n]*`").expect("valid inline code regex"))
}

/// Split a text segment into plain and inline-code fragments.
///
/// Spans whose interior is blank are dropped, backticks included.
pub fn render_inline_code(text: &str) -> Vec<InlineFragment> {
    let mut fragments = Vec::new();
    let mut last = 0;

    for span in span_regex().find_iter(text) {
        if span.start() > last {
            fragments.push(InlineFragment::Text(text[last..span.start()].to_string()));
        }
        let interior = &span.as_str()[1..span.as_str().len() - 1];
        if !interior.trim().is_empty() {
            fragments.push(InlineFragment::Code(interior.to_string()));
        }
        last = span.end();
    }

    if last < text.len() {
        fragments.push(InlineFragment::Text(text[last..].to_string()));
    }

    fragments
}
