//! Multi-tier translation resolution.
//!
//! `resolve` is total: it always returns some Markdown text. Tiers are tried
//! in order (exact, then normalized, then fuzzy) and the original source text
//! is rewritten as-is when no tier produces an acceptable candidate. Fuzzy and
//! miss outcomes emit colored diagnostics on stderr; those are observability
//! signals, never control flow.

use colored::Colorize;

use crate::corpus::{Corpus, normalize_for_matching};
use crate::markup::MarkupRewriter;
use crate::DEFAULT_SIMILARITY_THRESHOLD;

/// Which tier produced the returned text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Exact,
    Normalized,
    /// Accepted fuzzy candidate with its similarity score in [0, 1].
    Fuzzy(f64),
    /// No adequate match; the source text itself was rewritten.
    Miss,
}

pub struct TranslationResolver {
    corpus: Corpus,
    rewriter: MarkupRewriter,
    threshold: f64,
}

impl TranslationResolver {
    pub fn new(corpus: Corpus, rewriter: MarkupRewriter) -> Self {
        TranslationResolver {
            corpus,
            rewriter,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    /// Minimum similarity for the fuzzy tier; a candidate scoring exactly the
    /// threshold is accepted.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn rewriter(&self) -> &MarkupRewriter {
        &self.rewriter
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Resolve `text` to its best available translation, rewritten to
    /// Markdown. Never fails.
    pub fn resolve(&self, text: &str) -> String {
        self.resolve_traced(text).0
    }

    /// Like [`resolve`](Self::resolve), also reporting which tier matched.
    pub fn resolve_traced(&self, text: &str) -> (String, Resolution) {
        if text.is_empty() {
            return (String::new(), Resolution::Miss);
        }

        if let Some(translation) = self.corpus.exact_lookup(text) {
            return (self.rewriter.rewrite(translation), Resolution::Exact);
        }

        let normalized = normalize_for_matching(text);
        if let Some(entry) = self.corpus.normalized_lookup(&normalized) {
            let result = restore_block_spacing(text, self.rewriter.rewrite(&entry.translation));
            return (result, Resolution::Normalized);
        }

        if let Some((index, score)) = self.best_fuzzy(&normalized) {
            if score >= self.threshold {
                let entry = &self.corpus.entries()[index];
                eprintln!(
                    "{}",
                    format!("warning: fuzzy match ({:.1}%)", score * 100.0).yellow()
                );
                eprintln!("  source: {}", excerpt(text));
                eprintln!("  match:  {}", excerpt(&entry.translation));
                let result =
                    restore_block_spacing(text, self.rewriter.rewrite(&entry.translation));
                return (result, Resolution::Fuzzy(score));
            }
        }

        eprintln!(
            "{}",
            format!("error: no translation for: {}", excerpt(text)).red()
        );
        (self.rewriter.rewrite(text), Resolution::Miss)
    }

    /// Linear scan over the whole corpus; O(corpus size) per query by design,
    /// since exact and normalized hits dominate traffic.
    ///
    /// Ties keep the first-encountered entry (strictly-greater comparison in
    /// corpus order), and a perfect score short-circuits the scan.
    fn best_fuzzy(&self, normalized: &str) -> Option<(usize, f64)> {
        if normalized.is_empty() {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for (index, entry) in self.corpus.entries().iter().enumerate() {
            if entry.normalized.is_empty() {
                continue;
            }
            let score = strsim::normalized_levenshtein(normalized, &entry.normalized);
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((index, score));
            }
            if score >= 1.0 {
                break;
            }
        }
        best
    }
}

/// Re-add the leading/trailing newline of the original query so block
/// spacing survives a normalized or fuzzy match.
fn restore_block_spacing(original: &str, mut result: String) -> String {
    if original.starts_with('\n') && !result.starts_with('\n') {
        result.insert(0, '\n');
    }
    if original.ends_with('\n') && !result.ends_with('\n') {
        result.push('\n');
    }
    result
}

fn excerpt(text: &str) -> String {
    let shortened: String = text.chars().take(100).collect();
    if shortened.len() < text.len() {
        format!("{shortened}...")
    } else {
        shortened
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;

    fn resolver(pairs: &[(&str, &str)]) -> TranslationResolver {
        TranslationResolver::new(
            Corpus::from_pairs(pairs.iter().copied()),
            MarkupRewriter::default(),
        )
    }

    #[test]
    fn test_exact_match_is_rewritten() {
        let r = resolver(&[("Hello [b]world[/b]", "Bonjour [b]le monde[/b]")]);
        let (out, tier) = r.resolve_traced("Hello [b]world[/b]");
        assert_eq!(out, "Bonjour **le monde**");
        assert_eq!(tier, Resolution::Exact);
    }

    #[test]
    fn test_exact_property_for_every_entry() {
        let pairs = [("a", "x"), ("b [code]c[/code]", "y [code]z[/code]"), ("c", "z")];
        let r = resolver(&pairs);
        for (source, translation) in pairs {
            let (out, tier) = r.resolve_traced(source);
            assert_eq!(tier, Resolution::Exact);
            assert_eq!(out, r.rewriter().rewrite(translation));
        }
    }

    #[test]
    fn test_normalized_match_on_whitespace_drift() {
        let r = resolver(&[("Hello world", "你好世界")]);
        let (out, tier) = r.resolve_traced("  Hello world  ");
        assert_eq!(out, "你好世界");
        assert_eq!(tier, Resolution::Normalized);
    }

    #[test]
    fn test_normalized_match_restores_block_newlines() {
        let r = resolver(&[("Hello world", "你好世界")]);
        let (out, tier) = r.resolve_traced("\nHello  world\n");
        assert_eq!(tier, Resolution::Normalized);
        assert_eq!(out, "\n你好世界\n");
    }

    #[test]
    fn test_fuzzy_accepted_at_exact_threshold() {
        // Distance 2 over length 8 gives exactly 0.75, representable in
        // binary, so score == threshold holds without float fuzz.
        let r = resolver(&[("abcdefgh", "T")]).with_threshold(0.75);
        let (out, tier) = r.resolve_traced("abcdefxy");
        assert_eq!(tier, Resolution::Fuzzy(0.75));
        assert_eq!(out, "T");
    }

    #[test]
    fn test_fuzzy_rejected_below_threshold() {
        // Distance 3 over length 8 gives exactly 0.625 < 0.75: falls back
        // to the literal rewritten source.
        let r = resolver(&[("abcdefgh", "T")]).with_threshold(0.75);
        let (out, tier) = r.resolve_traced("abcdexyz");
        assert_eq!(tier, Resolution::Miss);
        assert_eq!(out, "abcdexyz");
    }

    #[test]
    fn test_fuzzy_tie_breaks_to_first_corpus_entry() {
        // Both entries are distance 1 from the query.
        let r = resolver(&[("abcdefghiX", "first"), ("abcdefghiY", "second")]);
        let (out, tier) = r.resolve_traced("abcdefghiZ");
        assert!(matches!(tier, Resolution::Fuzzy(_)));
        assert_eq!(out, "first");
    }

    #[test]
    fn test_fuzzy_scan_short_circuits_on_perfect_score() {
        let r = resolver(&[("hello there", "A"), ("hello there", "B")]);
        // Direct scan: the first perfect score ends the walk.
        let (index, score) = r.best_fuzzy("hello there").unwrap();
        assert_eq!(index, 0);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_miss_falls_back_to_rewritten_source() {
        let r = resolver(&[("completely different", "T")]);
        let (out, tier) = r.resolve_traced("[b]Hello[/b] [code]x=1[/code]");
        assert_eq!(tier, Resolution::Miss);
        assert_eq!(out, "**Hello** `x=1`");
    }

    #[test]
    fn test_totality_on_empty_and_whitespace() {
        let r = resolver(&[("a", "b")]);
        assert_eq!(r.resolve(""), "");
        // Whitespace-only input normalizes to nothing and misses.
        let (out, tier) = r.resolve_traced("   ");
        assert_eq!(tier, Resolution::Miss);
        assert_eq!(out, "");
    }

    #[test]
    fn test_empty_corpus() {
        let r = resolver(&[]);
        let (out, tier) = r.resolve_traced("anything");
        assert_eq!(tier, Resolution::Miss);
        assert_eq!(out, "anything");
    }
}
