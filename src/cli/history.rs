use std::error::Error;

use chrono::Local;

use crate::cli::say::format_plain;
use crate::core::controller::ConversationController;
use crate::core::conversation::Conversation;
use crate::core::store::PersistentState;

pub fn history_listing(history: &[Conversation]) -> String {
    if history.is_empty() {
        return "No saved conversations.".to_string();
    }
    let mut out = String::from("Saved conversations (newest first):\n\n");
    for conversation in history {
        out.push_str(&format!(
            "  {}  {}  {} ({} messages)\n",
            conversation.id,
            conversation
                .timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M"),
            conversation.title,
            conversation.messages.len()
        ));
    }
    out.trim_end().to_string()
}

pub fn conversation_transcript(conversation: &Conversation) -> String {
    let mut out = format!("{}\n", conversation.title);
    for message in &conversation.messages {
        let label = if message.is_user() { "You" } else { "DeepChat" };
        out.push_str(&format!("\n[{}] {label}:\n", message.display_time()));
        out.push_str(&format_plain(&message.content, &message.code_blocks));
        out.push('\n');
        if !message.files.is_empty() {
            let names = message
                .files
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("📎 {names}\n"));
        }
    }
    out.trim_end().to_string()
}

pub fn list_history(state: &PersistentState) -> Result<(), Box<dyn Error>> {
    println!("{}", history_listing(&state.load_history()));
    Ok(())
}

pub fn show_conversation(state: &PersistentState, id: i64) -> Result<(), Box<dyn Error>> {
    let history = state.load_history();
    match history.iter().find(|c| c.id == id) {
        Some(conversation) => {
            println!("{}", conversation_transcript(conversation));
            Ok(())
        }
        None => {
            eprintln!("❌ No conversation with id {id}");
            std::process::exit(1);
        }
    }
}

pub fn delete_conversation(state: &PersistentState, id: i64) -> Result<(), Box<dyn Error>> {
    let mut controller = ConversationController::load(state);
    if !controller.delete_conversation(id) {
        eprintln!("❌ No conversation with id {id}");
        std::process::exit(1);
    }
    controller.save_history(state)?;
    println!("✅ Deleted conversation {id}");
    Ok(())
}
