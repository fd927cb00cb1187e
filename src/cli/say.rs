//! TUI-less "say" command

use std::error::Error;
use std::path::PathBuf;

use crate::core::attachments::describe_upload;
use crate::core::config::Config;
use crate::core::message::{Attachment, CodeBlock, Message};
use crate::core::providers::{EnvCredentials, ProviderRegistry};
use crate::core::service::{AiResponse, ChatService};
use crate::format::{interleave, parse_markup, Segment};

/// Explanation markup reduced to its text.
fn strip_markup(markup: &str) -> String {
    parse_markup(markup).into_iter().map(|span| span.text).collect()
}

fn push_code_block(out: &mut String, block: &CodeBlock) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("```{}\n{}\n```\n", block.language, block.code));
    if !block.explanation.is_empty() {
        out.push_str("Code Explanation:\n");
        for line in &block.explanation {
            out.push_str(&format!("  • {}\n", strip_markup(line)));
        }
    }
}

/// Plain-text rendering of de-fenced content for terminals and pipes.
pub fn format_plain(text: &str, blocks: &[CodeBlock]) -> String {
    let mut out = String::new();
    for segment in interleave(text, blocks) {
        match segment {
            Segment::Text(part) => {
                let part = part.trim_matches('\n');
                if !part.is_empty() {
                    out.push_str(part);
                    out.push('\n');
                }
            }
            Segment::Code(block) => push_code_block(&mut out, block),
        }
    }
    out.trim_end().to_string()
}

pub fn format_response(response: &AiResponse) -> String {
    format_plain(&response.text, &response.code_blocks)
}

pub async fn run_say(
    config: &Config,
    prompt: Vec<String>,
    files: Vec<PathBuf>,
    provider: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() && files.is_empty() {
        eprintln!("Usage: deepchat say [-f FILE]... <prompt>");
        std::process::exit(1);
    }

    let registry = ProviderRegistry::from_config(config);
    if let Some(requested) = provider.as_deref() {
        if registry.find(requested).is_none() {
            eprintln!("❌ Unknown provider: {requested}");
            eprintln!("Run `deepchat providers` to see the available providers.");
            std::process::exit(1);
        }
    }
    let resolved = registry.resolve(&EnvCredentials, provider.as_deref());

    let attachments: Vec<Attachment> = files.iter().map(Attachment::from_path).collect();
    let content = describe_upload(&prompt, &attachments);
    let history = vec![Message::user(1, content, attachments)];

    let service = ChatService::new(
        reqwest::Client::new(),
        config.temperature(),
        config.explain_code(),
    );
    match service.send(&history, &resolved).await {
        Ok(response) => {
            println!("{}", format_response(&response));
            Ok(())
        }
        Err(err) => {
            eprintln!("❌ Error: {err}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::extract_code_blocks;

    #[test]
    fn code_blocks_are_refenced_with_explanations() {
        let extracted = extract_code_blocks("Here:\n```python\nprint(1)\n```\nDone");
        let mut blocks = extracted.code_blocks;
        blocks[0].explanation = vec![
            "<strong>print</strong> writes to stdout".to_string(),
            "<code class=\"inline-code\">1</code> is the argument".to_string(),
        ];
        assert_eq!(
            format_plain(&extracted.text, &blocks),
            "Here:\n```python\nprint(1)\n```\nCode Explanation:\n  • print writes to stdout\n  • 1 is the argument\nDone"
        );
    }

    #[test]
    fn text_only_reply_is_unchanged() {
        assert_eq!(format_plain("Just text.", &[]), "Just text.");
    }
}
