//! Per-block code explanations.
//!
//! After a response is split into prose and code blocks, every tagged block
//! gets a follow-up request asking the model to explain it. Failures here
//! degrade to a single placeholder line and never reach the caller.

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::api::{send_chat_request, ChatMessage, ChatRequest};
use crate::core::message::CodeBlock;
use crate::core::providers::ResolvedProvider;
use crate::format::format_rich_text;

pub const MISSING_KEY_EXPLANATION: &str = "Unable to generate explanation due to missing API key.";
pub const FAILED_EXPLANATION: &str = "Unable to generate AI-powered explanation. Please try again.";

pub fn explanation_prompt(code: &str, language: &str) -> String {
    format!(
        "Please provide a detailed, line-by-line explanation of the following {language} code. \
Break down the code's functionality, explain each significant part, and highlight any \
noteworthy programming concepts or techniques used:\n\n{code}"
    )
}

/// Non-blank lines of a raw explanation, each run through the rich-text formatter.
pub fn explanation_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(format_rich_text)
        .collect()
}

#[derive(Clone)]
pub struct ExplanationFetcher {
    client: reqwest::Client,
    provider: ResolvedProvider,
    temperature: f32,
}

impl ExplanationFetcher {
    pub fn new(client: reqwest::Client, provider: ResolvedProvider, temperature: f32) -> Self {
        Self {
            client,
            provider,
            temperature,
        }
    }

    /// Explanation lines for one block. Always returns at least one line.
    pub async fn explain(&self, code: &str, language: &str) -> Vec<String> {
        if !self.provider.has_credential() {
            return vec![MISSING_KEY_EXPLANATION.to_string()];
        }

        let request = ChatRequest {
            model: self.provider.descriptor.model.clone(),
            messages: vec![ChatMessage::user(explanation_prompt(code, language))],
            temperature: self.temperature,
        };

        match send_chat_request(&self.client, &self.provider, &request).await {
            Ok(raw) => {
                let lines = explanation_lines(&raw);
                if lines.is_empty() {
                    vec![FAILED_EXPLANATION.to_string()]
                } else {
                    lines
                }
            }
            Err(err) => {
                warn!(language, error = %err, "code explanation failed");
                vec![FAILED_EXPLANATION.to_string()]
            }
        }
    }

    /// Explain every non-plaintext block concurrently. Results are attached
    /// only once all requests have finished.
    pub async fn explain_all(&self, mut blocks: Vec<CodeBlock>) -> Vec<CodeBlock> {
        let pending = blocks
            .iter()
            .filter(|block| !block.is_plaintext() && block.explanation.is_empty())
            .count();
        debug!(blocks = blocks.len(), pending, "fetching code explanations");

        let explanations = join_all(blocks.iter().map(|block| async move {
            if block.is_plaintext() || !block.explanation.is_empty() {
                None
            } else {
                Some(self.explain(&block.code, &block.language).await)
            }
        }))
        .await;

        for (block, explanation) in blocks.iter_mut().zip(explanations) {
            if let Some(lines) = explanation {
                block.explanation = lines;
            }
        }
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::providers::{ProviderDescriptor, ResponseFormat};
    use serde_json::json;
    use std::collections::BTreeMap;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(endpoint: String, api_key: Option<&str>) -> ExplanationFetcher {
        let provider = ResolvedProvider {
            descriptor: ProviderDescriptor {
                id: "mock".to_string(),
                display_name: "Mock".to_string(),
                endpoint,
                model: "mock-model".to_string(),
                api_key_env: "MOCK_KEY".to_string(),
                response_format: ResponseFormat::ChatCompletions,
                headers: BTreeMap::new(),
            },
            api_key: api_key.map(str::to_string),
        };
        ExplanationFetcher::new(reqwest::Client::new(), provider, 0.7)
    }

    fn reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }))
    }

    #[test]
    fn blank_lines_are_dropped_and_lines_formatted() {
        let lines = explanation_lines("**Line 1**: prints\n\n   \n`x` is *bound*");
        assert_eq!(
            lines,
            vec![
                "<strong>Line 1</strong>: prints".to_string(),
                "<code class=\"inline-code\">x</code> is <em>bound</em>".to_string(),
            ]
        );
    }

    #[test]
    fn prompt_names_the_language() {
        let prompt = explanation_prompt("print(1)", "python");
        assert!(prompt.contains("following python code"));
        assert!(prompt.ends_with("\n\nprint(1)"));
    }

    #[tokio::test]
    async fn missing_key_yields_single_unavailable_line() {
        let fetcher = fetcher("http://127.0.0.1:9/unused".to_string(), None);
        assert_eq!(
            fetcher.explain("x = 1", "python").await,
            vec![MISSING_KEY_EXPLANATION.to_string()]
        );
    }

    #[tokio::test]
    async fn failure_is_isolated_to_its_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("broken_fn"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("working_fn"))
            .respond_with(reply("Defines **working_fn**.\n\nReturns nothing."))
            .mount(&server)
            .await;

        let fetcher = fetcher(server.uri(), Some("sk-test"));
        let blocks = fetcher
            .explain_all(vec![
                CodeBlock::new("python", "def broken_fn(): pass"),
                CodeBlock::new("python", "def working_fn(): pass"),
            ])
            .await;

        assert_eq!(blocks[0].explanation, vec![FAILED_EXPLANATION.to_string()]);
        assert_eq!(
            blocks[1].explanation,
            vec![
                "Defines <strong>working_fn</strong>.".to_string(),
                "Returns nothing.".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn plaintext_blocks_are_not_requested() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply("explained"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher(server.uri(), Some("sk-test"));
        let blocks = fetcher
            .explain_all(vec![
                CodeBlock::new("plaintext", "just text"),
                CodeBlock::new("rust", "fn main() {}"),
            ])
            .await;

        assert!(blocks[0].explanation.is_empty());
        assert_eq!(blocks[1].explanation, vec!["explained".to_string()]);
    }

    #[tokio::test]
    async fn existing_explanations_are_not_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(reply("fresh"))
            .expect(0)
            .mount(&server)
            .await;

        let mut block = CodeBlock::new("rust", "fn main() {}");
        block.explanation = vec!["cached".to_string()];
        let fetcher = fetcher(server.uri(), Some("sk-test"));
        let blocks = fetcher.explain_all(vec![block]).await;
        assert_eq!(blocks[0].explanation, vec!["cached".to_string()]);
    }
}
