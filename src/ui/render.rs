//! Message list to styled terminal lines.
//!
//! Bot replies are stored de-fenced, so rendering walks the text segments
//! and code blocks in placeholder order, styles inline code inside prose,
//! and turns explanation markup into styled bullets.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::message::{CodeBlock, Message};
use crate::format::{interleave, parse_markup, render_inline_code, InlineFragment, RichStyle, Segment};
use crate::ui::syntax::highlight_code_block;
use crate::ui::theme::Theme;

pub const WELCOME_TITLE: &str = "Welcome to DeepChat";
pub const WELCOME_TEXT: &str = "Ask anything to start the conversation.";

/// Phrases typed out while a reply is pending.
pub const THINKING_PHRASES: &[&str] = &[
    "Processing your request...",
    "Analyzing information...",
    "Generating response...",
    "Considering options...",
    "Thinking deeply...",
    "Connecting ideas...",
    "Formulating thoughts...",
];

// Ticks a fully typed phrase stays on screen before the next one starts.
const PHRASE_HOLD_TICKS: usize = 12;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub show_explanations: bool,
    /// Animation counter for the loading indicator.
    pub tick: usize,
}

/// The loading text at animation step `tick`: phrases are typed out one
/// character per tick, held briefly, then replaced by the next phrase.
pub fn loading_frame(tick: usize) -> String {
    let mut remaining = tick;
    let mut index = 0;
    loop {
        let phrase = THINKING_PHRASES[index % THINKING_PHRASES.len()];
        let span = phrase.chars().count() + PHRASE_HOLD_TICKS;
        if remaining < span {
            return phrase.chars().take(remaining + 1).collect();
        }
        remaining -= span;
        index += 1;
    }
}

fn message_header(message: &Message, theme: &Theme) -> Line<'static> {
    let (label, style) = if message.is_user() {
        ("You", theme.user_prefix_style)
    } else {
        ("DeepChat", theme.bot_prefix_style)
    };
    Line::from(vec![
        Span::styled(label.to_string(), style),
        Span::raw("  "),
        Span::styled(message.display_time(), theme.timestamp_style),
    ])
}

/// Prose lines with backtick spans styled as inline code.
pub fn prose_lines(text: &str, base: Style, theme: &Theme) -> Vec<Line<'static>> {
    text.split('\n')
        .map(|line| {
            let spans: Vec<Span<'static>> = render_inline_code(line)
                .into_iter()
                .map(|fragment| match fragment {
                    InlineFragment::Text(text) => Span::styled(text, base),
                    InlineFragment::Code(code) => Span::styled(code, theme.inline_code_style),
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// One explanation line as a bullet, honouring its rich-text markup.
pub fn explanation_line(markup: &str, theme: &Theme) -> Line<'static> {
    let base = theme.explanation_text_style;
    let mut spans = vec![Span::styled("  • ".to_string(), base)];
    spans.extend(parse_markup(markup).into_iter().map(|span| {
        let style = match span.style {
            RichStyle::Plain => base,
            RichStyle::Strong => base.add_modifier(Modifier::BOLD),
            RichStyle::Emphasis => base.add_modifier(Modifier::ITALIC),
            RichStyle::Code => theme.inline_code_style,
        };
        Span::styled(span.text, style)
    }));
    Line::from(spans)
}

pub fn code_block_lines(block: &CodeBlock, theme: &Theme, show_explanations: bool) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        format!(" {} ", block.language),
        theme.code_badge_style,
    ))];

    match highlight_code_block(&block.language, &block.code, theme) {
        Some(highlighted) => lines.extend(highlighted),
        None => lines.extend(block.code.lines().map(|line| {
            Line::from(Span::styled(
                line.to_string(),
                Style::default().bg(theme.code_block_bg),
            ))
        })),
    }

    if show_explanations && !block.explanation.is_empty() {
        lines.push(Line::from(Span::styled(
            "Code Explanation".to_string(),
            theme.explanation_title_style,
        )));
        lines.extend(block.explanation.iter().map(|e| explanation_line(e, theme)));
    }
    lines
}

fn body_lines(message: &Message, theme: &Theme, options: &RenderOptions) -> Vec<Line<'static>> {
    if message.is_loading {
        return vec![Line::from(Span::styled(
            loading_frame(options.tick),
            theme.loading_style,
        ))];
    }
    if message.is_error {
        return prose_lines(&message.content, theme.error_text_style, theme);
    }

    let base = if message.is_user() {
        theme.user_text_style
    } else {
        theme.bot_text_style
    };
    if message.code_blocks.is_empty() {
        return prose_lines(&message.content, base, theme);
    }

    let mut lines = Vec::new();
    for segment in interleave(&message.content, &message.code_blocks) {
        match segment {
            Segment::Text(text) => {
                let text = text.trim_matches('\n');
                if !text.is_empty() {
                    lines.extend(prose_lines(text, base, theme));
                }
            }
            Segment::Code(block) => {
                lines.extend(code_block_lines(block, theme, options.show_explanations))
            }
        }
    }
    lines
}

pub fn message_lines(message: &Message, theme: &Theme, options: &RenderOptions) -> Vec<Line<'static>> {
    let mut lines = vec![message_header(message, theme)];
    lines.extend(body_lines(message, theme, options));
    if !message.files.is_empty() {
        let names = message
            .files
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(Line::from(Span::styled(
            format!("📎 {names}"),
            theme.attachment_style,
        )));
    }
    lines
}

pub fn welcome_lines(theme: &Theme) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            WELCOME_TITLE.to_string(),
            theme.welcome_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(WELCOME_TEXT.to_string(), theme.welcome_style)),
    ]
}

/// The whole transcript, messages separated by a blank line.
pub fn transcript_lines(messages: &[Message], theme: &Theme, options: &RenderOptions) -> Vec<Line<'static>> {
    if messages.is_empty() {
        return welcome_lines(theme);
    }
    let mut lines = Vec::new();
    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.extend(message_lines(message, theme, options));
    }
    lines
}
