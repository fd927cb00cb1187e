//! One send cycle against a model provider: attachment expansion, the
//! primary request, fence extraction and the explanation phase.

use std::error::Error as StdError;
use std::fmt;

use tracing::{info, warn};

use crate::api::{send_chat_request, ApiError, ChatMessage, ChatRequest};
use crate::core::attachments::expand_with_attachments;
use crate::core::explain::ExplanationFetcher;
use crate::core::message::{CodeBlock, Message};
use crate::core::providers::ResolvedProvider;
use crate::format::fences::{extract_code_blocks, refence};

/// A parsed model reply: de-fenced text plus its code blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiResponse {
    pub text: String,
    pub code_blocks: Vec<CodeBlock>,
}

#[derive(Debug)]
pub enum ChatError {
    /// The conversation had nothing to send.
    NothingToSend,
    Api(ApiError),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::NothingToSend => write!(f, "There is no message to send"),
            ChatError::Api(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for ChatError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ChatError::Api(err) => Some(err),
            ChatError::NothingToSend => None,
        }
    }
}

impl From<ApiError> for ChatError {
    fn from(err: ApiError) -> Self {
        ChatError::Api(err)
    }
}

#[derive(Clone)]
pub struct ChatService {
    client: reqwest::Client,
    temperature: f32,
    explain_code: bool,
}

impl ChatService {
    pub fn new(client: reqwest::Client, temperature: f32, explain_code: bool) -> Self {
        Self {
            client,
            temperature,
            explain_code,
        }
    }

    /// Send the conversation and return the processed reply.
    ///
    /// Without a credential the reply is simulated locally and no request
    /// of any kind is made.
    pub async fn send(
        &self,
        history: &[Message],
        provider: &ResolvedProvider,
    ) -> Result<AiResponse, ChatError> {
        if !provider.has_credential() {
            warn!(
                provider = %provider.id(),
                env = %provider.descriptor.api_key_env,
                "no API key configured, using simulated response"
            );
            return Ok(simulated_response(history, provider));
        }

        let messages = build_api_messages(history).await;
        if messages.is_empty() {
            return Err(ChatError::NothingToSend);
        }

        let request = ChatRequest {
            model: provider.descriptor.model.clone(),
            messages,
            temperature: self.temperature,
        };
        let raw = send_chat_request(&self.client, provider, &request).await?;

        let extracted = extract_code_blocks(&raw);
        info!(
            provider = %provider.id(),
            code_blocks = extracted.code_blocks.len(),
            "received response"
        );

        let code_blocks = if self.explain_code && !extracted.code_blocks.is_empty() {
            ExplanationFetcher::new(self.client.clone(), provider.clone(), self.temperature)
                .explain_all(extracted.code_blocks)
                .await
        } else {
            extracted.code_blocks
        };

        Ok(AiResponse {
            text: extracted.text,
            code_blocks,
        })
    }
}

/// Provider-facing message list. Loading placeholders and error notices
/// stay local; attachments are read and inlined; stored replies get their
/// fences back.
pub async fn build_api_messages(history: &[Message]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len());
    for message in history.iter().filter(|m| !m.is_loading && !m.is_error) {
        let content = if message.code_blocks.is_empty() {
            message.content.clone()
        } else {
            refence(&message.content, &message.code_blocks)
        };
        let content = expand_with_attachments(&content, &message.files).await;
        messages.push(ChatMessage {
            role: message.sender.to_api_role().to_string(),
            content,
        });
    }
    messages
}

/// Local stand-in reply used when the provider has no credential. Its
/// sample block is untagged, so it is never sent for explanation.
pub fn simulated_response(history: &[Message], provider: &ResolvedProvider) -> AiResponse {
    let Some(last_user) = history.iter().rev().find(|m| m.is_user()) else {
        return AiResponse {
            text: "No message received.".to_string(),
            code_blocks: Vec::new(),
        };
    };

    let mut text = format!(
        "No API key is configured for {} (set {}), so this is a simulated response.\n\n",
        provider.display_name(),
        provider.descriptor.api_key_env
    );
    if !last_user.files.is_empty() {
        let names = last_user
            .files
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!("I've detected the following file(s): {names}.\n\n"));
    }
    text.push_str(
        "Here's a sample code block to demonstrate:\n\n\
```\n\
def hello_world():\n    \
print('This is a simulated response')\n\
```\n\n\
In a real scenario with a working API key, I would answer your message directly.",
    );

    let extracted = extract_code_blocks(&text);
    AiResponse {
        text: extracted.text,
        code_blocks: extracted.code_blocks,
    }
}
