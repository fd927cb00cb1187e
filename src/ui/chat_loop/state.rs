//! State behind the chat screen and the actions that change it.
//!
//! Everything here runs on the event loop. Network work leaves as a
//! [`PendingSend`] and comes back as a [`SendOutcome`].

use std::path::PathBuf;

use tracing::warn;
use tui_textarea::TextArea;

use crate::core::controller::{ConversationController, PendingSend};
use crate::core::message::Attachment;
use crate::core::providers::{CredentialSource, ProviderRegistry, ResolvedProvider};
use crate::core::service::AiResponse;
use crate::core::store::PersistentState;
use crate::ui::chat_loop::keybindings::Focus;
use crate::ui::clipboard::copy_to_clipboard;
use crate::ui::theme::Theme;

/// The result of one spawned send, tagged with its id.
#[derive(Debug)]
pub struct SendOutcome {
    pub send_id: u64,
    pub result: Result<AiResponse, String>,
}

pub struct ChatApp {
    pub controller: ConversationController,
    pub state: PersistentState,
    pub registry: ProviderRegistry,
    pub provider: ResolvedProvider,
    pub theme: Theme,
    pub textarea: TextArea<'static>,
    pub attachments: Vec<Attachment>,
    pub focus: Focus,
    pub show_sidebar: bool,
    pub sidebar_index: usize,
    pub show_explanations: bool,
    /// Rows scrolled up from the bottom of the transcript.
    pub scroll_from_bottom: u16,
    pub tick: usize,
    pub status: Option<String>,
    pub exit_requested: bool,
}

impl ChatApp {
    pub fn new(
        controller: ConversationController,
        state: PersistentState,
        registry: ProviderRegistry,
        provider: ResolvedProvider,
        show_explanations: bool,
    ) -> Self {
        let theme = Theme::for_mode(controller.theme());
        Self {
            controller,
            state,
            registry,
            provider,
            theme,
            textarea: TextArea::default(),
            attachments: Vec::new(),
            focus: Focus::Input,
            show_sidebar: true,
            sidebar_index: 0,
            show_explanations,
            scroll_from_bottom: 0,
            tick: 0,
            status: None,
            exit_requested: false,
        }
    }

    pub fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    fn clear_input(&mut self) {
        self.textarea = TextArea::default();
    }

    fn persist_history(&mut self) {
        if let Err(err) = self.controller.save_history(&self.state) {
            warn!(error = %err, "failed to save chat history");
            self.status = Some(format!("Could not save history: {err}"));
        }
    }

    fn after_history_change(&mut self, changed: bool) {
        if changed {
            self.persist_history();
        }
        let len = self.controller.history().len();
        if self.sidebar_index >= len {
            self.sidebar_index = len.saturating_sub(1);
        }
    }

    /// Start a send from the input box and pending attachments.
    pub fn submit(&mut self) -> Option<PendingSend> {
        let input = self.input_text();
        let attachments = std::mem::take(&mut self.attachments);
        match self.controller.begin_send(&input, attachments.clone()) {
            Some(pending) => {
                self.clear_input();
                self.scroll_from_bottom = 0;
                self.status = None;
                Some(pending)
            }
            None => {
                self.attachments = attachments;
                None
            }
        }
    }

    pub fn apply_outcome(&mut self, outcome: SendOutcome) {
        let changed = match outcome.result {
            Ok(response) => self.controller.complete_send(outcome.send_id, response),
            Err(description) => self.controller.fail_send(outcome.send_id, &description),
        };
        self.after_history_change(changed);
    }

    /// Treat the input text as a file path and queue it as an attachment.
    pub fn attach_from_input(&mut self) {
        let raw = self.input_text();
        let path = PathBuf::from(raw.trim());
        if raw.trim().is_empty() {
            self.status = Some("Type a file path, then press Ctrl+O to attach it".to_string());
            return;
        }
        if !path.is_file() {
            self.status = Some(format!("Not a readable file: {}", path.display()));
            return;
        }
        let attachment = Attachment::from_path(&path);
        self.status = Some(format!("Attached {}", attachment.name));
        self.attachments.push(attachment);
        self.clear_input();
    }

    pub fn clear_attachments(&mut self) {
        self.attachments.clear();
        self.status = Some("Attachments cleared".to_string());
    }

    pub fn new_conversation(&mut self) {
        let changed = self.controller.start_new_conversation();
        self.after_history_change(changed);
        self.scroll_from_bottom = 0;
    }

    pub fn toggle_theme(&mut self) {
        let mode = self.controller.toggle_theme();
        self.theme = Theme::for_mode(mode);
        if let Err(err) = self.state.save_theme(mode) {
            warn!(error = %err, "failed to save theme");
            self.status = Some(format!("Could not save theme: {err}"));
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.show_sidebar = !self.show_sidebar;
        if !self.show_sidebar {
            self.focus = Focus::Input;
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input if self.show_sidebar => Focus::Sidebar,
            _ => Focus::Input,
        };
    }

    pub fn cycle_provider<S: CredentialSource>(&mut self, credentials: &S) {
        let next = self.registry.next_after(self.provider.id()).id.clone();
        self.provider = self.registry.resolve(credentials, Some(&next));
        let note = if self.provider.has_credential() {
            String::new()
        } else {
            format!(" (no key: set {})", self.provider.descriptor.api_key_env)
        };
        self.status = Some(format!("Provider: {}{note}", self.provider.display_name()));
    }

    pub fn toggle_explanations(&mut self) {
        self.show_explanations = !self.show_explanations;
    }

    /// Code of the most recent code block in the visible conversation.
    pub fn last_code_block(&self) -> Option<&str> {
        self.controller
            .messages()
            .iter()
            .rev()
            .find_map(|m| m.code_blocks.last())
            .map(|block| block.code.as_str())
    }

    pub fn copy_last_code_block(&mut self) {
        let Some(code) = self.last_code_block().map(str::to_string) else {
            self.status = Some("No code block to copy".to_string());
            return;
        };
        self.status = Some(match copy_to_clipboard(&code) {
            Ok(()) => "Copied code block to clipboard".to_string(),
            Err(err) => err.to_string(),
        });
    }

    pub fn sidebar_up(&mut self) {
        self.sidebar_index = self.sidebar_index.saturating_sub(1);
    }

    pub fn sidebar_down(&mut self) {
        if self.sidebar_index + 1 < self.controller.history().len() {
            self.sidebar_index += 1;
        }
    }

    fn selected_conversation_id(&self) -> Option<i64> {
        self.controller
            .history()
            .get(self.sidebar_index)
            .map(|c| c.id)
    }

    pub fn load_selected(&mut self) {
        let Some(id) = self.selected_conversation_id() else {
            return;
        };
        let changed = self.controller.load_conversation(id);
        self.after_history_change(changed);
        // Storing the unsaved conversation shifts the list down by one.
        if let Some(pos) = self.controller.history().iter().position(|c| c.id == id) {
            self.sidebar_index = pos;
        }
        self.scroll_from_bottom = 0;
        self.focus = Focus::Input;
    }

    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected_conversation_id() else {
            return;
        };
        let changed = self.controller.delete_conversation(id);
        self.after_history_change(changed);
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(rows);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(rows);
    }

    /// Exit hook: store an unsaved conversation, then stop the loop.
    pub fn quit(&mut self) {
        let changed = self.controller.save_current();
        self.after_history_change(changed);
        self.exit_requested = true;
    }
}
