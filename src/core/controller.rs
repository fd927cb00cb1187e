//! Conversation state and the send cycle.
//!
//! The controller owns the visible message list, the stored history and the
//! theme. It never performs I/O itself: a send hands back a [`PendingSend`]
//! for the caller to run, and every mutation reports whether the history
//! changed so the caller can persist it. A reply always goes to the
//! conversation it was sent from, even after the view has moved on.

use chrono::Utc;
use tracing::{debug, info};

use crate::core::attachments::describe_upload;
use crate::core::conversation::{next_conversation_id, Conversation};
use crate::core::message::{Attachment, Message};
use crate::core::service::AiResponse;
use crate::core::store::{PersistentState, StoreError, ThemeMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    AwaitingResponse { send_id: u64 },
}

/// A conversation snapshot ready to go to the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSend {
    pub send_id: u64,
    pub history: Vec<Message>,
}

/// Where a reply goes once it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplyTarget {
    /// The conversation the send started from is still on screen.
    View,
    /// The view moved on; the reply belongs to this stored entry.
    Stored(i64),
    /// The originating conversation was deleted.
    Discarded,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    send_id: u64,
    loading_id: u64,
    target: ReplyTarget,
}

#[derive(Debug)]
pub struct ConversationController {
    messages: Vec<Message>,
    history: Vec<Conversation>,
    current_id: Option<i64>,
    theme: ThemeMode,
    send_state: SendState,
    in_flight: Vec<InFlight>,
    last_message_id: u64,
    last_send_id: u64,
}

impl ConversationController {
    pub fn new(history: Vec<Conversation>, theme: ThemeMode) -> Self {
        let last_message_id = history
            .iter()
            .flat_map(|c| c.messages.iter().map(|m| m.id))
            .max()
            .unwrap_or(0);
        Self {
            messages: Vec::new(),
            history,
            current_id: None,
            theme,
            send_state: SendState::Idle,
            in_flight: Vec::new(),
            last_message_id,
            last_send_id: 0,
        }
    }

    /// Restore the stored theme and history.
    pub fn load(state: &PersistentState) -> Self {
        let history = state.load_history();
        info!(conversations = history.len(), "loaded chat history");
        Self::new(history, state.load_theme())
    }

    pub fn save_history(&self, state: &PersistentState) -> Result<(), StoreError> {
        state.save_history(&self.history)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Stored conversations, newest first.
    pub fn history(&self) -> &[Conversation] {
        &self.history
    }

    pub fn current_conversation_id(&self) -> Option<i64> {
        self.current_id
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn send_state(&self) -> SendState {
        self.send_state
    }

    pub fn is_awaiting_response(&self) -> bool {
        matches!(self.send_state, SendState::AwaitingResponse { .. })
    }

    /// Message ids follow the wall clock in milliseconds but never repeat.
    fn allocate_message_id(&mut self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        self.last_message_id = now.max(self.last_message_id + 1);
        self.last_message_id
    }

    /// Append the user's message and a loading placeholder. Returns `None`
    /// when there is nothing to send.
    pub fn begin_send(&mut self, input: &str, attachments: Vec<Attachment>) -> Option<PendingSend> {
        if input.trim().is_empty() && attachments.is_empty() {
            return None;
        }

        let content = describe_upload(input, &attachments);
        let user_id = self.allocate_message_id();
        self.messages
            .push(Message::user(user_id, content, attachments));
        let history: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| !m.is_loading)
            .cloned()
            .collect();

        let loading_id = self.allocate_message_id();
        self.messages.push(Message::loading(loading_id));

        self.last_send_id += 1;
        let send_id = self.last_send_id;
        self.in_flight.push(InFlight {
            send_id,
            loading_id,
            target: ReplyTarget::View,
        });
        self.send_state = SendState::AwaitingResponse { send_id };
        debug!(send_id, messages = history.len(), "send started");

        Some(PendingSend { send_id, history })
    }

    /// Drop the placeholder belonging to `send_id`, settle the send state and
    /// report where the result should go.
    fn settle(&mut self, send_id: u64) -> ReplyTarget {
        let mut target = ReplyTarget::View;
        if let Some(pos) = self.in_flight.iter().position(|f| f.send_id == send_id) {
            let flight = self.in_flight.remove(pos);
            self.messages.retain(|m| m.id != flight.loading_id);
            target = flight.target;
        }
        if self.send_state == (SendState::AwaitingResponse { send_id }) {
            self.send_state = match self.in_flight.last() {
                Some(flight) => SendState::AwaitingResponse {
                    send_id: flight.send_id,
                },
                None => SendState::Idle,
            };
        }
        match target {
            ReplyTarget::Stored(id) if self.current_id == Some(id) => ReplyTarget::View,
            other => other,
        }
    }

    /// Apply a successful reply to the conversation it was sent from. Returns
    /// whether history changed: the exchange is stored as a new entry or
    /// written over the originating one.
    pub fn complete_send(&mut self, send_id: u64, response: AiResponse) -> bool {
        let target = self.settle(send_id);
        let bot_id = self.allocate_message_id();
        let reply = Message::bot(bot_id, response.text, response.code_blocks);
        match target {
            ReplyTarget::View => {
                self.messages.push(reply);
                self.persist_current();
                debug!(send_id, "send completed");
                true
            }
            ReplyTarget::Stored(id) => {
                let Some(entry) = self.history.iter_mut().find(|c| c.id == id) else {
                    debug!(send_id, id, "reply dropped, conversation is gone");
                    return false;
                };
                let mut messages = entry.messages.clone();
                messages.push(reply);
                *entry = entry.with_messages(messages);
                debug!(send_id, id, "send completed in background conversation");
                true
            }
            ReplyTarget::Discarded => {
                debug!(send_id, "reply dropped, conversation was deleted");
                false
            }
        }
    }

    /// Replace the placeholder with an error message. History is untouched,
    /// and a conversation that is no longer on screen gets nothing.
    pub fn fail_send(&mut self, send_id: u64, description: &str) -> bool {
        if self.settle(send_id) == ReplyTarget::View {
            let error_id = self.allocate_message_id();
            self.messages.push(Message::error(error_id, description));
        }
        debug!(send_id, error = description, "send failed");
        false
    }

    fn has_pending_in_view(&self) -> bool {
        self.in_flight.iter().any(|f| f.target == ReplyTarget::View)
    }

    /// Point sends still waiting on the visible conversation at its stored
    /// entry, before the view switches away from it.
    fn retarget_in_flight(&mut self) {
        let target = match self.current_id {
            Some(id) => ReplyTarget::Stored(id),
            None => ReplyTarget::Discarded,
        };
        for flight in self
            .in_flight
            .iter_mut()
            .filter(|f| f.target == ReplyTarget::View)
        {
            flight.target = target;
        }
    }

    fn stored_messages(&self) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| !m.is_loading)
            .cloned()
            .collect()
    }

    fn is_stored(&self) -> bool {
        self.current_id
            .is_some_and(|id| self.history.iter().any(|c| c.id == id))
    }

    /// Write the visible conversation into history: in place when it is the
    /// active stored entry, otherwise as a new entry at the front.
    fn persist_current(&mut self) {
        let messages = self.stored_messages();
        if let Some(id) = self.current_id {
            if let Some(entry) = self.history.iter_mut().find(|c| c.id == id) {
                *entry = entry.with_messages(messages);
                return;
            }
        }
        let id = next_conversation_id(&self.history, Utc::now());
        self.history.insert(0, Conversation::new(id, messages));
        self.current_id = Some(id);
        info!(id, "conversation stored");
    }

    fn has_content(&self) -> bool {
        self.messages.iter().any(|m| !m.is_loading)
    }

    pub fn start_new_conversation(&mut self) -> bool {
        let changed = if self.has_content() {
            self.persist_current();
            true
        } else {
            false
        };
        self.retarget_in_flight();
        self.messages.clear();
        self.current_id = None;
        changed
    }

    /// Switch to a stored conversation. An unsaved conversation in view, or
    /// one still waiting on a reply, is stored first. Unknown ids change
    /// nothing.
    pub fn load_conversation(&mut self, id: i64) -> bool {
        if !self.history.iter().any(|c| c.id == id) {
            return false;
        }

        let changed = if self.has_content() && (!self.is_stored() || self.has_pending_in_view()) {
            self.persist_current();
            true
        } else {
            false
        };
        self.retarget_in_flight();

        self.messages = self
            .history
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.messages.clone())
            .unwrap_or_default();
        self.current_id = Some(id);
        changed
    }

    pub fn delete_conversation(&mut self, id: i64) -> bool {
        let before = self.history.len();
        self.history.retain(|c| c.id != id);
        if self.history.len() == before {
            return false;
        }
        let viewing = self.current_id == Some(id);
        for flight in &mut self.in_flight {
            let orphaned = match flight.target {
                ReplyTarget::Stored(target) => target == id,
                ReplyTarget::View => viewing,
                ReplyTarget::Discarded => false,
            };
            if orphaned {
                flight.target = ReplyTarget::Discarded;
            }
        }
        if viewing {
            self.messages.clear();
            self.current_id = None;
        }
        info!(id, "conversation deleted");
        true
    }

    /// Exit hook: store a non-empty conversation that was never saved.
    pub fn save_current(&mut self) -> bool {
        if self.has_content() && !self.is_stored() {
            self.persist_current();
            true
        } else {
            false
        }
    }

    pub fn toggle_theme(&mut self) -> ThemeMode {
        self.theme = self.theme.toggled();
        self.theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{CodeBlock, ERROR_PREFIX};

    fn reply(text: &str) -> AiResponse {
        AiResponse {
            text: text.to_string(),
            code_blocks: Vec::new(),
        }
    }

    fn controller() -> ConversationController {
        ConversationController::new(Vec::new(), ThemeMode::Dark)
    }

    #[test]
    fn empty_input_without_files_is_ignored() {
        let mut controller = controller();
        assert!(controller.begin_send("   ", Vec::new()).is_none());
        assert!(controller.messages().is_empty());
        assert_eq!(controller.send_state(), SendState::Idle);
    }

    #[test]
    fn begin_send_appends_user_and_loading_messages() {
        let mut controller = controller();
        let pending = controller.begin_send("hello", Vec::new()).unwrap();

        assert_eq!(pending.history.len(), 1);
        assert_eq!(pending.history[0].content, "hello");
        assert_eq!(controller.messages().len(), 2);
        assert!(controller.messages()[1].is_loading);
        assert_eq!(
            controller.send_state(),
            SendState::AwaitingResponse {
                send_id: pending.send_id
            }
        );
    }

    #[test]
    fn attachments_alone_can_be_sent() {
        let mut controller = controller();
        let pending = controller
            .begin_send("", vec![Attachment::from_path("/tmp/data.csv")])
            .unwrap();
        assert_eq!(pending.history[0].content, "Files uploaded: data.csv");
        assert_eq!(pending.history[0].files.len(), 1);
    }

    #[test]
    fn first_success_creates_history_entry() {
        let mut controller = controller();
        let pending = controller.begin_send("What is Rust?", Vec::new()).unwrap();
        let mut block = CodeBlock::new("rust", "fn main() {}");
        block.explanation = vec!["Entry point.".to_string()];
        let changed = controller.complete_send(
            pending.send_id,
            AiResponse {
                text: "A language.\n[CODE_BLOCK_0]".to_string(),
                code_blocks: vec![block],
            },
        );

        assert!(changed);
        assert_eq!(controller.send_state(), SendState::Idle);
        assert_eq!(controller.messages().len(), 2);
        assert!(controller.messages().iter().all(|m| !m.is_loading));
        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.history()[0].title, "What is Rust?");
        assert_eq!(controller.history()[0].messages.len(), 2);
        assert_eq!(
            controller.current_conversation_id(),
            Some(controller.history()[0].id)
        );
    }

    #[test]
    fn later_successes_update_the_same_entry() {
        let mut controller = controller();
        let first = controller.begin_send("one", Vec::new()).unwrap();
        controller.complete_send(first.send_id, reply("1"));
        let id = controller.current_conversation_id().unwrap();

        let second = controller.begin_send("two", Vec::new()).unwrap();
        assert_eq!(second.history.len(), 3);
        controller.complete_send(second.send_id, reply("2"));

        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.history()[0].id, id);
        assert_eq!(controller.history()[0].title, "one");
        assert_eq!(controller.history()[0].messages.len(), 4);
    }

    #[test]
    fn failure_shows_error_and_leaves_history_alone() {
        let mut controller = controller();
        let pending = controller.begin_send("hello", Vec::new()).unwrap();
        let changed = controller.fail_send(pending.send_id, "HTTP 500: boom");

        assert!(!changed);
        assert!(controller.history().is_empty());
        let last = controller.messages().last().unwrap();
        assert!(last.is_error);
        assert_eq!(last.content, format!("{ERROR_PREFIX}HTTP 500: boom"));
        assert!(controller.messages().iter().all(|m| !m.is_loading));
        assert_eq!(controller.send_state(), SendState::Idle);
    }

    #[test]
    fn overlapping_sends_each_remove_their_own_placeholder() {
        let mut controller = controller();
        let first = controller.begin_send("a", Vec::new()).unwrap();
        let second = controller.begin_send("b", Vec::new()).unwrap();
        assert_eq!(controller.messages().iter().filter(|m| m.is_loading).count(), 2);

        controller.complete_send(first.send_id, reply("for a"));
        assert_eq!(controller.messages().iter().filter(|m| m.is_loading).count(), 1);
        assert_eq!(
            controller.send_state(),
            SendState::AwaitingResponse {
                send_id: second.send_id
            }
        );
        assert!(controller.history()[0].messages.iter().all(|m| !m.is_loading));

        controller.complete_send(second.send_id, reply("for b"));
        assert_eq!(controller.send_state(), SendState::Idle);
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn loading_a_conversation_stores_the_unsaved_one_first() {
        let stored = Conversation::new(42, vec![Message::user(1, "old question", Vec::new())]);
        let mut controller = ConversationController::new(vec![stored], ThemeMode::Dark);

        let pending = controller.begin_send("draft", Vec::new()).unwrap();
        controller.fail_send(pending.send_id, "offline");
        assert!(controller.history().len() == 1);

        let changed = controller.load_conversation(42);
        assert!(changed);
        assert_eq!(controller.history().len(), 2);
        assert_eq!(controller.history()[0].title, "draft");
        assert_eq!(controller.current_conversation_id(), Some(42));
        assert_eq!(controller.messages()[0].content, "old question");
    }

    #[test]
    fn loading_from_a_stored_conversation_does_not_duplicate_it() {
        let a = Conversation::new(1, vec![Message::user(1, "a", Vec::new())]);
        let b = Conversation::new(2, vec![Message::user(2, "b", Vec::new())]);
        let mut controller = ConversationController::new(vec![b, a], ThemeMode::Dark);

        assert!(!controller.load_conversation(1));
        assert!(!controller.load_conversation(2));
        assert_eq!(controller.history().len(), 2);
        assert!(!controller.load_conversation(99));
    }

    #[test]
    fn new_conversation_persists_then_clears() {
        let mut controller = controller();
        let pending = controller.begin_send("hi", Vec::new()).unwrap();
        controller.complete_send(pending.send_id, reply("hello"));

        assert!(controller.start_new_conversation());
        assert!(controller.messages().is_empty());
        assert_eq!(controller.current_conversation_id(), None);
        assert_eq!(controller.history().len(), 1);

        assert!(!controller.start_new_conversation());
    }

    #[test]
    fn deleting_the_active_conversation_clears_the_view() {
        let mut controller = controller();
        let pending = controller.begin_send("hi", Vec::new()).unwrap();
        controller.complete_send(pending.send_id, reply("hello"));
        let id = controller.current_conversation_id().unwrap();

        assert!(controller.delete_conversation(id));
        assert!(controller.history().is_empty());
        assert!(controller.messages().is_empty());
        assert!(!controller.delete_conversation(id));
    }

    #[test]
    fn exit_hook_saves_unsaved_conversations_once() {
        let mut controller = controller();
        let pending = controller.begin_send("unanswered", Vec::new()).unwrap();
        controller.fail_send(pending.send_id, "timeout");

        assert!(controller.save_current());
        assert_eq!(controller.history().len(), 1);
        assert!(!controller.save_current());
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn history_is_newest_first() {
        let mut controller = controller();
        for text in ["first", "second"] {
            let pending = controller.begin_send(text, Vec::new()).unwrap();
            controller.complete_send(pending.send_id, reply("ok"));
            controller.start_new_conversation();
        }
        let titles: Vec<&str> = controller
            .history()
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn state_round_trips_through_the_store() {
        let state = PersistentState::in_memory();
        let mut controller = controller();
        let pending = controller.begin_send("persist me", Vec::new()).unwrap();
        controller.complete_send(pending.send_id, reply("done"));
        controller.save_history(&state).unwrap();

        let restored = ConversationController::load(&state);
        assert_eq!(restored.history(), controller.history());
        assert!(restored.messages().is_empty());
    }

    fn contents(conversation: &Conversation) -> Vec<&str> {
        conversation.messages.iter().map(|m| m.content.as_str()).collect()
    }

    fn entry(controller: &ConversationController, id: i64) -> &Conversation {
        controller
            .history()
            .iter()
            .find(|c| c.id == id)
            .unwrap()
    }

    #[test]
    fn reply_lands_in_its_own_conversation_after_loading_another() {
        let stored = Conversation::new(42, vec![Message::user(1, "old question", Vec::new())]);
        let mut controller = ConversationController::new(vec![stored.clone()], ThemeMode::Dark);

        let pending = controller.begin_send("new question", Vec::new()).unwrap();
        assert!(controller.load_conversation(42));
        let draft_id = controller.history()[0].id;
        assert_ne!(draft_id, 42);

        assert!(controller.complete_send(pending.send_id, reply("answer to new question")));

        assert_eq!(entry(&controller, 42), &stored);
        assert_eq!(
            contents(entry(&controller, draft_id)),
            vec!["new question", "answer to new question"]
        );
        assert_eq!(entry(&controller, draft_id).title, "new question");
        assert_eq!(controller.current_conversation_id(), Some(42));
        let visible: Vec<&str> = controller.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(visible, vec!["old question"]);
        assert_eq!(controller.send_state(), SendState::Idle);
    }

    #[test]
    fn reply_after_new_conversation_completes_the_stored_entry() {
        let mut controller = controller();
        let pending = controller.begin_send("question", Vec::new()).unwrap();
        assert!(controller.start_new_conversation());

        assert!(controller.complete_send(pending.send_id, reply("reply")));

        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.history()[0].title, "question");
        assert_eq!(contents(&controller.history()[0]), vec!["question", "reply"]);
        assert!(controller.messages().is_empty());
        assert_eq!(controller.current_conversation_id(), None);
    }

    #[test]
    fn pending_question_in_a_stored_conversation_is_kept_when_switching() {
        let other = Conversation::new(7, vec![Message::user(1, "other", Vec::new())]);
        let mut controller = ConversationController::new(vec![other], ThemeMode::Dark);
        let first = controller.begin_send("one", Vec::new()).unwrap();
        controller.complete_send(first.send_id, reply("1"));
        let id = controller.current_conversation_id().unwrap();

        let second = controller.begin_send("two", Vec::new()).unwrap();
        assert!(controller.load_conversation(7));
        controller.complete_send(second.send_id, reply("2"));

        assert_eq!(contents(entry(&controller, id)), vec!["one", "1", "two", "2"]);
        assert_eq!(contents(entry(&controller, 7)), vec!["other"]);
    }

    #[test]
    fn returning_to_the_origin_shows_the_late_reply() {
        let stored = Conversation::new(42, vec![Message::user(1, "old", Vec::new())]);
        let mut controller = ConversationController::new(vec![stored], ThemeMode::Dark);
        let pending = controller.begin_send("draft", Vec::new()).unwrap();
        controller.load_conversation(42);
        let draft_id = controller.history()[0].id;
        controller.load_conversation(draft_id);

        controller.complete_send(pending.send_id, reply("late"));

        let visible: Vec<&str> = controller.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(visible, vec!["draft", "late"]);
        assert_eq!(contents(entry(&controller, draft_id)), vec!["draft", "late"]);
    }

    #[test]
    fn failure_after_switching_touches_neither_conversation() {
        let stored = Conversation::new(42, vec![Message::user(1, "old", Vec::new())]);
        let mut controller = ConversationController::new(vec![stored], ThemeMode::Dark);
        let pending = controller.begin_send("draft", Vec::new()).unwrap();
        controller.load_conversation(42);
        let before = controller.history().to_vec();

        assert!(!controller.fail_send(pending.send_id, "offline"));

        assert_eq!(controller.history(), before.as_slice());
        assert!(controller.messages().iter().all(|m| !m.is_error));
        assert_eq!(controller.send_state(), SendState::Idle);
    }

    #[test]
    fn reply_for_a_deleted_conversation_is_dropped() {
        let mut controller = controller();
        let pending = controller.begin_send("question", Vec::new()).unwrap();
        controller.start_new_conversation();
        let id = controller.history()[0].id;
        assert!(controller.delete_conversation(id));

        assert!(!controller.complete_send(pending.send_id, reply("too late")));
        assert!(controller.history().is_empty());
        assert!(controller.messages().is_empty());
    }

    #[test]
    fn theme_toggles() {
        let mut controller = controller();
        assert_eq!(controller.toggle_theme(), ThemeMode::Light);
        assert_eq!(controller.theme(), ThemeMode::Light);
    }
}
