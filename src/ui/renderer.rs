use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::ui::chat_loop::keybindings::Focus;
use crate::ui::chat_loop::state::ChatApp;
use crate::ui::render::{transcript_lines, RenderOptions};

const SIDEBAR_WIDTH: u16 = 30;
const INPUT_HEIGHT: u16 = 5;

/// Rows `lines` occupy once wrapped to `width` columns.
pub fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| {
            let w: usize = line.spans.iter().map(|s| s.content.width()).sum();
            w.div_ceil(width).max(1)
        })
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Top scroll offset that keeps the view `from_bottom` rows above the end.
pub fn scroll_offset(total_rows: u16, view_height: u16, from_bottom: u16) -> u16 {
    total_rows
        .saturating_sub(view_height)
        .saturating_sub(from_bottom)
}

fn render_sidebar(f: &mut Frame, app: &ChatApp, area: Rect) {
    let theme = &app.theme;
    let active = app.controller.current_conversation_id();
    let items: Vec<ListItem> = app
        .controller
        .history()
        .iter()
        .map(|conversation| {
            let style = if Some(conversation.id) == active {
                theme.sidebar_active_style
            } else {
                theme.title_style
            };
            ListItem::new(Line::from(Span::styled(conversation.title.clone(), style)))
        })
        .collect();

    let border_style = if app.focus == Focus::Sidebar {
        theme.focused_border_style
    } else {
        theme.border_style
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled("History", theme.title_style)),
        )
        .highlight_style(theme.sidebar_selected_style);

    let mut state = ListState::default();
    if !app.controller.history().is_empty() {
        state.select(Some(app.sidebar_index));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_transcript(f: &mut Frame, app: &ChatApp, area: Rect) {
    let theme = &app.theme;
    let lines = transcript_lines(
        app.controller.messages(),
        theme,
        &RenderOptions {
            show_explanations: app.show_explanations,
            tick: app.tick,
        },
    );

    let title = format!(
        "DeepChat v{} - {} ({})",
        env!("CARGO_PKG_VERSION"),
        app.provider.display_name(),
        app.provider.descriptor.model
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style)
        .title(Span::styled(title, theme.title_style));
    let inner = block.inner(area);

    let total = wrapped_height(&lines, inner.width);
    let offset = scroll_offset(total, inner.height, app.scroll_from_bottom);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    f.render_widget(paragraph, area);
}

fn render_attachments(f: &mut Frame, app: &ChatApp, area: Rect) {
    let names = app
        .attachments
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let line = Line::from(Span::styled(
        format!("📎 {names}  (Ctrl+X to clear)"),
        app.theme.attachment_style,
    ));
    f.render_widget(Paragraph::new(line), area);
}

fn render_input(f: &mut Frame, app: &mut ChatApp, area: Rect) {
    let theme = app.theme.clone();
    let border_style = if app.focus == Focus::Input {
        theme.focused_border_style
    } else {
        theme.border_style
    };
    let title = if app.controller.is_awaiting_response() {
        "Waiting for reply... (Alt+Enter new line, Ctrl+O attach path, Esc quit)"
    } else {
        "Message (Enter send, Alt+Enter new line, Ctrl+O attach path, Esc quit)"
    };
    app.textarea.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(title, theme.title_style)),
    );
    app.textarea.set_style(theme.input_text_style);
    app.textarea.set_cursor_style(theme.input_cursor_style);
    app.textarea.set_cursor_line_style(Style::default());
    f.render_widget(&app.textarea, area);
}

fn render_status(f: &mut Frame, app: &ChatApp, area: Rect) {
    let text = app.status.clone().unwrap_or_else(|| {
        "Ctrl+N new  Ctrl+T theme  Ctrl+B history  Ctrl+P provider  Ctrl+E explanations  Ctrl+Y copy code  Tab focus".to_string()
    });
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(text, app.theme.status_style))),
        area,
    );
}

pub fn ui(f: &mut Frame, app: &mut ChatApp) {
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(app.theme.background_color)),
        area,
    );

    let main = if app.show_sidebar {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
            .split(area);
        render_sidebar(f, app, columns[0]);
        columns[1]
    } else {
        area
    };

    let attachment_rows = if app.attachments.is_empty() { 0 } else { 1 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(attachment_rows),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(1),
        ])
        .split(main);

    render_transcript(f, app, rows[0]);
    if attachment_rows > 0 {
        render_attachments(f, app, rows[1]);
    }
    render_input(f, app, rows[2]);
    render_status(f, app, rows[3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_height_counts_wrapped_rows() {
        let lines = vec![
            Line::from("short"),
            Line::from("x".repeat(25)),
            Line::default(),
        ];
        assert_eq!(wrapped_height(&lines, 10), 1 + 3 + 1);
    }

    #[test]
    fn scroll_offset_pins_to_bottom() {
        assert_eq!(scroll_offset(100, 20, 0), 80);
        assert_eq!(scroll_offset(100, 20, 30), 50);
        assert_eq!(scroll_offset(10, 20, 0), 0);
        assert_eq!(scroll_offset(100, 20, 500), 0);
    }
}
