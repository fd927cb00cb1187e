pub mod data;
pub mod io;
pub mod printing;

#[cfg(test)]
pub mod tests;

pub use data::{path_display, Config, DEFAULT_TEMPERATURE};
pub use io::ConfigError;
