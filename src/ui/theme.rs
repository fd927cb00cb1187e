use ratatui::style::{Color, Modifier, Style};

use crate::core::store::ThemeMode;

#[derive(Debug, Clone)]
pub struct Theme {
    pub mode: ThemeMode,
    // Overall background color to paint the full frame
    pub background_color: Color,

    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub bot_prefix_style: Style,
    pub bot_text_style: Style,
    pub error_text_style: Style,
    pub timestamp_style: Style,
    pub loading_style: Style,
    pub welcome_style: Style,

    // Code blocks
    pub code_block_bg: Color,
    pub code_badge_style: Style,
    pub inline_code_style: Style,
    pub explanation_title_style: Style,
    pub explanation_text_style: Style,

    // Chrome
    pub title_style: Style,
    pub border_style: Style,
    pub focused_border_style: Style,
    pub sidebar_selected_style: Style,
    pub sidebar_active_style: Style,
    pub attachment_style: Style,
    pub status_style: Style,

    // Input area
    pub input_text_style: Style,
    pub input_cursor_style: Style,
}

impl Theme {
    pub fn dark() -> Self {
        Theme {
            mode: ThemeMode::Dark,
            background_color: Color::Rgb(0x1e, 0x1e, 0x24),
            user_prefix_style: Style::default()
                .fg(Color::Rgb(0x7a, 0xa2, 0xf7))
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Rgb(0xc0, 0xca, 0xf5)),
            bot_prefix_style: Style::default()
                .fg(Color::Rgb(0x9e, 0xce, 0x6a))
                .add_modifier(Modifier::BOLD),
            bot_text_style: Style::default().fg(Color::Rgb(0xe6, 0xe6, 0xe6)),
            error_text_style: Style::default().fg(Color::Rgb(0xf7, 0x76, 0x8e)),
            timestamp_style: Style::default().fg(Color::DarkGray),
            loading_style: Style::default()
                .fg(Color::Rgb(0xe0, 0xaf, 0x68))
                .add_modifier(Modifier::ITALIC),
            welcome_style: Style::default().fg(Color::Gray),

            code_block_bg: Color::Rgb(0x2b, 0x30, 0x3b),
            code_badge_style: Style::default()
                .fg(Color::Rgb(0x1e, 0x1e, 0x24))
                .bg(Color::Rgb(0x7d, 0xcf, 0xff))
                .add_modifier(Modifier::BOLD),
            inline_code_style: Style::default()
                .fg(Color::Rgb(0xff, 0x9e, 0x64))
                .bg(Color::Rgb(0x2b, 0x30, 0x3b)),
            explanation_title_style: Style::default()
                .fg(Color::Rgb(0xbb, 0x9a, 0xf7))
                .add_modifier(Modifier::BOLD),
            explanation_text_style: Style::default().fg(Color::Rgb(0xa9, 0xb1, 0xd6)),

            title_style: Style::default().fg(Color::Gray),
            border_style: Style::default().fg(Color::DarkGray),
            focused_border_style: Style::default().fg(Color::Rgb(0x7a, 0xa2, 0xf7)),
            sidebar_selected_style: Style::default().add_modifier(Modifier::REVERSED),
            sidebar_active_style: Style::default()
                .fg(Color::Rgb(0x9e, 0xce, 0x6a))
                .add_modifier(Modifier::BOLD),
            attachment_style: Style::default().fg(Color::Rgb(0xe0, 0xaf, 0x68)),
            status_style: Style::default().fg(Color::Gray),

            input_text_style: Style::default().fg(Color::White),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    pub fn light() -> Self {
        Theme {
            mode: ThemeMode::Light,
            background_color: Color::Rgb(0xfa, 0xfa, 0xfa),
            user_prefix_style: Style::default()
                .fg(Color::Rgb(0x1f, 0x5f, 0xbf))
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Rgb(0x1a, 0x3a, 0x6b)),
            bot_prefix_style: Style::default()
                .fg(Color::Rgb(0x2e, 0x7d, 0x32))
                .add_modifier(Modifier::BOLD),
            bot_text_style: Style::default().fg(Color::Rgb(0x21, 0x21, 0x21)),
            error_text_style: Style::default().fg(Color::Rgb(0xc6, 0x28, 0x28)),
            timestamp_style: Style::default().fg(Color::Gray),
            loading_style: Style::default()
                .fg(Color::Rgb(0xb2, 0x6a, 0x00))
                .add_modifier(Modifier::ITALIC),
            welcome_style: Style::default().fg(Color::DarkGray),

            code_block_bg: Color::Rgb(0xee, 0xf0, 0xf4),
            code_badge_style: Style::default()
                .fg(Color::White)
                .bg(Color::Rgb(0x1f, 0x5f, 0xbf))
                .add_modifier(Modifier::BOLD),
            inline_code_style: Style::default()
                .fg(Color::Rgb(0xb0, 0x30, 0x60))
                .bg(Color::Rgb(0xee, 0xf0, 0xf4)),
            explanation_title_style: Style::default()
                .fg(Color::Rgb(0x6a, 0x1b, 0x9a))
                .add_modifier(Modifier::BOLD),
            explanation_text_style: Style::default().fg(Color::Rgb(0x42, 0x42, 0x42)),

            title_style: Style::default().fg(Color::DarkGray),
            border_style: Style::default().fg(Color::Gray),
            focused_border_style: Style::default().fg(Color::Rgb(0x1f, 0x5f, 0xbf)),
            sidebar_selected_style: Style::default().add_modifier(Modifier::REVERSED),
            sidebar_active_style: Style::default()
                .fg(Color::Rgb(0x2e, 0x7d, 0x32))
                .add_modifier(Modifier::BOLD),
            attachment_style: Style::default().fg(Color::Rgb(0xb2, 0x6a, 0x00)),
            status_style: Style::default().fg(Color::DarkGray),

            input_text_style: Style::default().fg(Color::Black),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    pub fn is_dark(&self) -> bool {
        self.mode == ThemeMode::Dark
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_selects_palette() {
        assert!(Theme::for_mode(ThemeMode::Dark).is_dark());
        let light = Theme::for_mode(ThemeMode::Light);
        assert!(!light.is_dark());
        assert_eq!(light.background_color, Color::Rgb(0xfa, 0xfa, 0xfa));
    }

    #[test]
    fn error_text_differs_from_bot_text() {
        for theme in [Theme::dark(), Theme::light()] {
            assert_ne!(theme.error_text_style, theme.bot_text_style);
        }
    }
}
