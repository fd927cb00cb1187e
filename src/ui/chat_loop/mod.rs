//! Full-screen chat interface.

pub mod event_loop;
pub mod keybindings;
pub mod lifecycle;
pub mod state;

pub use event_loop::run_chat;
