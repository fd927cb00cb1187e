//! Attachment expansion for outgoing messages.

use std::io;
use std::path::Path;

use tracing::warn;

use crate::core::message::Attachment;

/// Read a file fully, decoding lossily so binary content never fails.
pub async fn read_attachment(path: &Path) -> io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// The delimited block appended to a message for one attached file.
pub fn file_block(name: &str, content: &str) -> String {
    format!("\n\n--- File: {name} ---\n{content}\n---")
}

pub fn file_error_block(name: &str) -> String {
    format!("\n\nError reading file: {name}")
}

/// `content` followed by one block per attachment, in order. Unreadable
/// files are noted inline instead of failing the send.
pub async fn expand_with_attachments(content: &str, files: &[Attachment]) -> String {
    let mut expanded = content.to_string();
    for file in files {
        match read_attachment(&file.path).await {
            Ok(text) => expanded.push_str(&file_block(&file.name, &text)),
            Err(err) => {
                warn!(file = %file.path.display(), error = %err, "failed to read attachment");
                expanded.push_str(&file_error_block(&file.name));
            }
        }
    }
    expanded
}

/// User-visible content of a message sent with attachments.
pub fn describe_upload(input: &str, files: &[Attachment]) -> String {
    let input = input.trim();
    if files.is_empty() {
        return input.to_string();
    }
    let names = files
        .iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    if input.is_empty() {
        format!("Files uploaded: {names}")
    } else {
        format!("Files uploaded: {names} - Message: {input}")
    }
}
