use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

pub const LOADING_CONTENT: &str = "Thinking...";
pub const ERROR_PREFIX: &str = "Sorry, I encountered an error: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }

    /// Role name used in provider requests.
    pub fn to_api_role(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "assistant",
        }
    }
}

impl TryFrom<&str> for Sender {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Sender::User),
            "bot" | "assistant" => Ok(Sender::Bot),
            _ => Err(format!("invalid message sender: {value}")),
        }
    }
}

impl TryFrom<String> for Sender {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Sender> for String {
    fn from(value: Sender) -> Self {
        value.as_str().to_string()
    }
}

/// A file attached to a user message. Contents are read at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub path: PathBuf,
}

impl Attachment {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path: path.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
    /// Formatted explanation lines; empty until the explanation phase runs.
    #[serde(default)]
    pub explanation: Vec<String>,
}

impl CodeBlock {
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
            explanation: Vec::new(),
        }
    }

    pub fn is_plaintext(&self) -> bool {
        self.language == crate::format::PLAINTEXT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: u64,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_blocks: Vec<CodeBlock>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    fn new(id: u64, sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            sender,
            timestamp: Utc::now(),
            files: Vec::new(),
            code_blocks: Vec::new(),
            is_loading: false,
            is_error: false,
        }
    }

    pub fn user(id: u64, content: impl Into<String>, files: Vec<Attachment>) -> Self {
        Self {
            files,
            ..Self::new(id, Sender::User, content)
        }
    }

    /// Bot reply. `content` is the de-fenced text when blocks are present.
    pub fn bot(id: u64, content: impl Into<String>, code_blocks: Vec<CodeBlock>) -> Self {
        Self {
            code_blocks,
            ..Self::new(id, Sender::Bot, content)
        }
    }

    pub fn loading(id: u64) -> Self {
        Self {
            is_loading: true,
            ..Self::new(id, Sender::Bot, LOADING_CONTENT)
        }
    }

    pub fn error(id: u64, description: &str) -> Self {
        Self {
            is_error: true,
            ..Self::new(id, Sender::Bot, format!("{ERROR_PREFIX}{description}"))
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// Local wall-clock time for display.
    pub fn display_time(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }
}
