//! Key to action mapping for the chat screen.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Sidebar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Send,
    InsertNewline,
    NewConversation,
    ToggleTheme,
    ToggleSidebar,
    CycleProvider,
    AttachFromInput,
    ClearAttachments,
    ToggleExplanations,
    CopyLastCodeBlock,
    ToggleFocus,
    ScrollUp,
    ScrollDown,
    SidebarUp,
    SidebarDown,
    SidebarLoad,
    SidebarDelete,
    /// Hand the key to the text area.
    Edit,
    Ignore,
}

fn ctrl_action(code: KeyCode) -> Option<KeyAction> {
    let action = match code {
        KeyCode::Char('c') => KeyAction::Quit,
        KeyCode::Char('n') => KeyAction::NewConversation,
        KeyCode::Char('t') => KeyAction::ToggleTheme,
        KeyCode::Char('b') => KeyAction::ToggleSidebar,
        KeyCode::Char('p') => KeyAction::CycleProvider,
        KeyCode::Char('o') => KeyAction::AttachFromInput,
        KeyCode::Char('x') => KeyAction::ClearAttachments,
        KeyCode::Char('e') => KeyAction::ToggleExplanations,
        KeyCode::Char('y') => KeyAction::CopyLastCodeBlock,
        _ => return None,
    };
    Some(action)
}

pub fn resolve_key(key: KeyEvent, focus: Focus) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let Some(action) = ctrl_action(key.code) {
            return action;
        }
    }

    match key.code {
        KeyCode::Esc => return KeyAction::Quit,
        KeyCode::Tab => return KeyAction::ToggleFocus,
        KeyCode::PageUp => return KeyAction::ScrollUp,
        KeyCode::PageDown => return KeyAction::ScrollDown,
        _ => {}
    }

    match focus {
        Focus::Sidebar => match key.code {
            KeyCode::Up => KeyAction::SidebarUp,
            KeyCode::Down => KeyAction::SidebarDown,
            KeyCode::Enter => KeyAction::SidebarLoad,
            KeyCode::Delete => KeyAction::SidebarDelete,
            _ => KeyAction::Ignore,
        },
        Focus::Input => match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => KeyAction::InsertNewline,
            KeyCode::Enter => KeyAction::Send,
            _ => KeyAction::Edit,
        },
    }
}
