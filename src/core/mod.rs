pub mod attachments;
pub mod builtin_providers;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod explain;
pub mod message;
pub mod providers;
pub mod service;
pub mod store;
