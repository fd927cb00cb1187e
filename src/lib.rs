//! DeepChat is a terminal chat client for hosted LLM APIs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns conversation state, provider selection, persistence, and
//!   the request pipeline that turns a reply into text plus explained code
//!   blocks.
//! - [`format`] splits replies into prose and fenced code, and renders inline
//!   code and explanation markup.
//! - [`api`] defines the chat completion payloads and the HTTP client.
//! - [`ui`] renders the terminal interface and runs the interactive event loop.
//! - [`logging`] installs the `tracing` subscriber.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions.

pub mod api;
pub mod cli;
pub mod core;
pub mod format;
pub mod logging;
pub mod ui;
