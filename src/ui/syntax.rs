//! Syntax highlighting for code blocks via `syntect`, with a small cache
//! so redraws do not re-highlight unchanged blocks.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, OnceLock};

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::ui::theme::Theme;

const CACHE_CAPACITY: usize = 64;

type CacheKey = (String, u64);

// Bounded FIFO of highlighted blocks.
struct HighlightCache {
    map: HashMap<CacheKey, Vec<Line<'static>>>,
    order: VecDeque<CacheKey>,
    cap: usize,
}

impl HighlightCache {
    fn new(cap: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            cap,
        }
    }

    fn get(&self, key: &CacheKey) -> Option<Vec<Line<'static>>> {
        self.map.get(key).cloned()
    }

    fn put(&mut self, key: CacheKey, lines: Vec<Line<'static>>) {
        if self.map.insert(key.clone(), lines).is_none() {
            self.order.push_back(key);
        }
        while self.map.len() > self.cap {
            match self.order.pop_front() {
                Some(old) => {
                    self.map.remove(&old);
                }
                None => break,
            }
        }
    }
}

fn cache() -> &'static Mutex<HighlightCache> {
    static CACHE: OnceLock<Mutex<HighlightCache>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HighlightCache::new(CACHE_CAPACITY)))
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

fn hash_code(lang: &str, code: &str, theme_name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    lang.hash(&mut hasher);
    code.hash(&mut hasher);
    theme_name.hash(&mut hasher);
    hasher.finish()
}

/// Map the tags models commonly emit onto syntect's syntax tokens.
pub(crate) fn normalize_lang_hint(s: &str) -> String {
    let t = s.trim().to_ascii_lowercase();
    match t.as_str() {
        "py" | "python" | "python3" => "python".into(),
        "bash" | "sh" | "zsh" | "shell" | "console" => "bash".into(),
        "js" | "javascript" | "jsx" | "node" => "javascript".into(),
        "ts" | "tsx" | "typescript" => "typescript".into(),
        "yaml" | "yml" => "yaml".into(),
        "rust" | "rs" => "rust".into(),
        "c" | "h" => "c".into(),
        "c++" | "cpp" | "cc" | "cxx" | "hpp" => "cpp".into(),
        "c#" | "csharp" | "cs" => "cs".into(),
        "golang" | "go" => "go".into(),
        "kotlin" | "kt" => "kotlin".into(),
        "md" | "markdown" => "markdown".into(),
        other => other.into(),
    }
}

pub(crate) fn syntect_theme_name(theme: &Theme) -> &'static str {
    if theme.is_dark() {
        "base16-ocean.dark"
    } else {
        "InspiredGitHub"
    }
}

/// Highlighted lines for a code block, or `None` when highlighting fails.
/// Unknown languages are highlighted as plain text.
pub fn highlight_code_block(lang_hint: &str, code: &str, theme: &Theme) -> Option<Vec<Line<'static>>> {
    let lang = normalize_lang_hint(lang_hint);
    let theme_name = syntect_theme_name(theme);
    let key = (lang.clone(), hash_code(&lang, code, theme_name));

    if let Some(lines) = cache().lock().ok().and_then(|c| c.get(&key)) {
        return Some(lines);
    }

    let ps = syntax_set();
    let syn_theme = theme_set().themes.get(theme_name)?;
    let syntax = ps
        .find_syntax_by_token(&lang)
        .unwrap_or_else(|| ps.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, syn_theme);

    let mut out: Vec<Line<'static>> = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = highlighter.highlight_line(line, ps).ok()?;
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .map(|(style, text)| {
                let fg = style.foreground;
                Span::styled(
                    text.trim_end_matches('\n').to_string(),
                    Style::default()
                        .fg(Color::Rgb(fg.r, fg.g, fg.b))
                        .bg(theme.code_block_bg),
                )
            })
            .collect();
        out.push(Line::from(spans));
    }

    if let Ok(mut guard) = cache().lock() {
        guard.put(key, out.clone());
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn normalize_lang_hint_maps_common_aliases() {
        assert_eq!(normalize_lang_hint("py"), "python");
        assert_eq!(normalize_lang_hint("JS"), "javascript");
        assert_eq!(normalize_lang_hint("c++"), "cpp");
        assert_eq!(normalize_lang_hint("C#"), "cs");
        assert_eq!(normalize_lang_hint("rs"), "rust");
        assert_eq!(normalize_lang_hint("plaintext"), "plaintext");
    }

    #[test]
    fn syntect_theme_follows_mode() {
        assert_eq!(syntect_theme_name(&Theme::dark()), "base16-ocean.dark");
        assert_eq!(syntect_theme_name(&Theme::light()), "InspiredGitHub");
    }

    #[test]
    fn highlighting_preserves_text() {
        let code = "fn main() {\n    println!(\"hi\");\n}";
        let lines = highlight_code_block("rust", code, &Theme::dark()).unwrap();
        assert_eq!(
            text_of(&lines),
            vec!["fn main() {", "    println!(\"hi\");", "}"]
        );
    }

    #[test]
    fn unknown_languages_fall_back_to_plain_text() {
        let lines = highlight_code_block("no-such-lang", "a\nb", &Theme::light()).unwrap();
        assert_eq!(text_of(&lines), vec!["a", "b"]);
    }

    #[test]
    fn cache_evicts_oldest_entries() {
        let mut cache = HighlightCache::new(2);
        for i in 0..3u64 {
            cache.put(("rust".into(), i), vec![Line::from(i.to_string())]);
        }
        assert!(cache.get(&("rust".into(), 0)).is_none());
        assert!(cache.get(&("rust".into(), 2)).is_some());
    }
}
