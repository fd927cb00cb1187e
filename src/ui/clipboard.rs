//! System clipboard access through the platform's copy command.

use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// None of the candidate commands could be started.
    Unavailable,
    Failed(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Unavailable => {
                write!(f, "No clipboard command found (install wl-copy, xclip, or xsel)")
            }
            ClipboardError::Failed(cmd) => write!(f, "Clipboard command `{cmd}` failed"),
        }
    }
}

impl std::error::Error for ClipboardError {}

#[cfg(target_os = "macos")]
const CANDIDATES: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(target_os = "windows")]
const CANDIDATES: &[(&str, &[&str])] = &[("cmd", &["/C", "clip"])];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CANDIDATES: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Copy `text` using the first copy command that can be started.
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    for (cmd, args) in CANDIDATES {
        let Ok(mut child) = Command::new(cmd)
            .args(*args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        else {
            continue;
        };

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|_| ClipboardError::Failed(cmd.to_string()))?;
        }
        return match child.wait() {
            Ok(status) if status.success() => Ok(()),
            _ => Err(ClipboardError::Failed(cmd.to_string())),
        };
    }
    Err(ClipboardError::Unavailable)
}
