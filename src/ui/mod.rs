pub mod chat_loop;
pub mod clipboard;
pub mod render;
pub mod renderer;
pub mod syntax;
pub mod theme;
