//! Markup for explanation lines.
//!
//! Explanations come back from the model with light Markdown emphasis. The
//! formatter rewrites that into a tiny tag vocabulary which is stored with
//! the code block; [`parse_markup`] reads the same vocabulary back into typed
//! spans for the terminal renderer.

use std::sync::OnceLock;

use regex::Regex;

const STRONG_OPEN: &str = "<strong>";
const STRONG_CLOSE: &str = "</strong>";
const EM_OPEN: &str = "<em>";
const EM_CLOSE: &str = "</em>";
const CODE_OPEN: &str = "<code class=\"inline-code\">";
const CODE_CLOSE: &str = "</code>";

struct FormatRule {
    regex: Regex,
    replacement: String,
}

fn format_rules() -> &'static [FormatRule] {
    static RULES: OnceLock<Vec<FormatRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"\*\*(.*?)\*\*", STRONG_OPEN, STRONG_CLOSE),
            (r"\*(.*?)\*", EM_OPEN, EM_CLOSE),
            (r"`(.*?)`", CODE_OPEN, CODE_CLOSE),
        ]
        .into_iter()
        .map(|(pattern, open, close)| FormatRule {
            regex: Regex::new(pattern).expect("valid rich text regex"),
            replacement: format!("{open}${{1}}{close}"),
        })
        .collect()
    })
}

/// Apply strong, emphasis and inline-code substitutions, in that order.
pub fn format_rich_text(line: &str) -> String {
    let mut processed = line.to_string();
    for rule in format_rules() {
        processed = rule
            .regex
            .replace_all(&processed, rule.replacement.as_str())
            .into_owned();
    }
    processed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RichStyle {
    Plain,
    Strong,
    Emphasis,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichSpan {
    pub style: RichStyle,
    pub text: String,
}

impl RichSpan {
    fn new(style: RichStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }
}

/// Read formatter output back into styled spans.
///
/// Only the tags produced by [`format_rich_text`] are recognised; anything
/// else, including an opening tag with no matching close, is plain text.
pub fn parse_markup(markup: &str) -> Vec<RichSpan> {
    let tags = [
        (STRONG_OPEN, STRONG_CLOSE, RichStyle::Strong),
        (EM_OPEN, EM_CLOSE, RichStyle::Emphasis),
        (CODE_OPEN, CODE_CLOSE, RichStyle::Code),
    ];

    let mut spans: Vec<RichSpan> = Vec::new();
    let mut plain = String::new();
    let mut rest = markup;

    'outer: while !rest.is_empty() {
        if rest.starts_with('<') {
            for (open, close, style) in tags {
                if let Some(after_open) = rest.strip_prefix(open) {
                    if let Some(end) = after_open.find(close) {
                        if !plain.is_empty() {
                            spans.push(RichSpan::new(RichStyle::Plain, std::mem::take(&mut plain)));
                        }
                        spans.push(RichSpan::new(style, &after_open[..end]));
                        rest = &after_open[end + close.len()..];
                        continue 'outer;
                    }
                }
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            plain.push(ch);
        }
        rest = chars.as_str();
    }

    if !plain.is_empty() {
        spans.push(RichSpan::new(RichStyle::Plain, plain));
    }
    spans
}
