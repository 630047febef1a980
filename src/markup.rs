//! BBCode-style markup to Markdown rewriting.
//!
//! The rewriter is a total function over arbitrary text: well-formed tags are
//! converted to their Markdown (or inline HTML) equivalents, malformed or
//! unmatched tags degrade to literal output. Substitution is regex-based and
//! non-recursive, so nested same-tag markup (`[b]a [b]b[/b][/b]`) is not
//! supported; the inner pair is left as literal text.
//!
//! Rules run in a fixed order because the inline passes assume block
//! constructs have already been collapsed into fenced code.

use regex::Regex;
use std::sync::OnceLock;

use crate::{DEFAULT_CODE_LANGUAGE, DEFAULT_DOCS_URL};

/// Placeholder token substituted with the configured documentation URL prefix.
pub const DOCS_URL_TOKEN: &str = "$DOCS_URL";

fn codeblock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)\[codeblock(?: lang="([^"]+)")?\](.*?)\[/codeblock\]"#).unwrap()
    })
}

fn codeblocks_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?s)\[codeblocks\]\s*\[gdscript\](.*?)\[/gdscript\].*?\[csharp\](.*?)\[/csharp\].*?\[/codeblocks\]",
        )
        .unwrap()
    })
}

/// Inline tag patterns and their replacements, applied in order.
fn inline_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"\[b\](.*?)\[/b\]", "**${1}**"),
            (r"\[i\](.*?)\[/i\]", "*${1}*"),
            (r"\[u\](.*?)\[/u\]", "<u>${1}</u>"),
            (r"\[s\](.*?)\[/s\]", "~~${1}~~"),
            (r"\[code\](.*?)\[/code\]", "`${1}`"),
            (r"\[kbd\](.*?)\[/kbd\]", "`${1}`"),
            (r"\[br\]", "\n"),
            (r"\[center\](.*?)\[/center\]", "<center>${1}</center>"),
            (r"\[url=(.*?)\](.*?)\[/url\]", "[${2}](${1})"),
            (r"\[url\](.*?)\[/url\]", "${1}"),
            (r"\[param (.*?)\]", "`${1}`"),
        ]
        .iter()
        .map(|(pattern, repl)| (Regex::new(pattern).unwrap(), *repl))
        .collect()
    })
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\[(?:class|method|constant|signal|member|enum|annotation|constructor|operator|theme_item) ([^\]]+)\]",
        )
        .unwrap()
    })
}

fn html_escape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The alternation lets replace_all keep the inline HTML the rewriter
    // itself emits while escaping every other angle bracket.
    RE.get_or_init(|| Regex::new(r"</?(?:u|center)>|[<>]").unwrap())
}

/// Rewrites BBCode-style markup into Markdown.
pub struct MarkupRewriter {
    docs_url: String,
    default_code_language: String,
    escape_raw_html: bool,
}

impl Default for MarkupRewriter {
    fn default() -> Self {
        MarkupRewriter::new(DEFAULT_DOCS_URL)
    }
}

impl MarkupRewriter {
    pub fn new(docs_url: &str) -> Self {
        MarkupRewriter {
            docs_url: docs_url.to_string(),
            default_code_language: DEFAULT_CODE_LANGUAGE.to_string(),
            escape_raw_html: false,
        }
    }

    /// Language tag used for fenced blocks whose source tag carries no
    /// language attribute.
    pub fn with_default_code_language(mut self, language: &str) -> Self {
        self.default_code_language = language.to_string();
        self
    }

    /// When enabled, residual angle brackets are converted to `[`/`]` so that
    /// untranslated raw markup cannot be interpreted as HTML downstream.
    pub fn with_escape_raw_html(mut self, enabled: bool) -> Self {
        self.escape_raw_html = enabled;
        self
    }

    pub fn docs_url(&self) -> &str {
        &self.docs_url
    }

    /// Convert `text` to Markdown. Never fails; unmatched tags stay literal.
    pub fn rewrite(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        // Strip leading indentation per line, keep blank lines and internal
        // structure as-is.
        let text = text
            .split('\n')
            .map(str::trim_start)
            .collect::<Vec<_>>()
            .join("\n");

        // Fenced code blocks; content passes through verbatim.
        let text = codeblock_re().replace_all(&text, |caps: &regex::Captures| {
            let language = caps
                .get(1)
                .map(|m| m.as_str())
                .unwrap_or(&self.default_code_language);
            format!("```{}\n{}\n```", language, &caps[2])
        });

        // Dual-language wrappers become two consecutive fenced blocks.
        let text = codeblocks_re().replace_all(&text, |caps: &regex::Captures| {
            format!(
                "```gdscript\n{}\n```\n\n```csharp\n{}\n```",
                caps[1].trim(),
                caps[2].trim()
            )
        });

        let mut text = text.into_owned();
        for (pattern, replacement) in inline_rules() {
            text = pattern.replace_all(&text, *replacement).into_owned();
        }

        // Cross-reference tags become inline code holding only the last
        // dot-separated segment; qualification is dropped.
        let text = reference_re().replace_all(&text, |caps: &regex::Captures| {
            let target = caps[1].rsplit('.').next().unwrap_or(&caps[1]);
            format!("`{target}`")
        });

        // A colon stuck inside a closing emphasis marker moves after it,
        // for both Latin and full-width colons.
        let text = text
            .replace(":**", "**:")
            .replace(":*", "*:")
            .replace("：**", "**：")
            .replace("：*", "*：")
            .replace(DOCS_URL_TOKEN, &self.docs_url);

        if self.escape_raw_html {
            html_escape_re()
                .replace_all(&text, |caps: &regex::Captures| match &caps[0] {
                    "<" => "[".to_string(),
                    ">" => "]".to_string(),
                    tag => tag.to_string(),
                })
                .into_owned()
        } else {
            text
        }
    }
}
