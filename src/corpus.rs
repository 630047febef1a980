//! Translation corpus loading and indexing.
//!
//! The corpus is built once, before rendering begins, and is immutable
//! afterwards; renderer workers share it by reference without locking.
//!
//! Three indexes are maintained over the same entry list:
//! - raw msgid -> translation (exact tier),
//! - trimmed msgid -> trimmed translation (exact tier, consulted second so a
//!   trimmed variant can never shadow a raw key),
//! - normalized msgid -> entry (normalized tier; first inserted key wins on
//!   collision).
//!
//! Entry order equals `.po` file order, which pins fuzzy tie-breaking.

use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// One (source, translation) pair from the corpus.
#[derive(Debug, Clone)]
pub struct CorpusEntry {
    pub source: String,
    pub translation: String,
    /// Source with code spans deleted, tags stripped and whitespace
    /// collapsed; precomputed because the fuzzy tier scans every entry.
    pub normalized: String,
}

/// Immutable-after-build translation index.
#[derive(Debug, Default)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
    exact: HashMap<String, usize>,
    trimmed: HashMap<String, String>,
    normalized: HashMap<String, usize>,
}

impl Corpus {
    /// Build a corpus from (source, translation) pairs in iteration order.
    /// Pairs with an empty translation are dropped.
    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut corpus = Corpus::default();
        for (source, translation) in pairs {
            corpus.insert(source.into(), translation.into());
        }
        corpus
    }

    /// Load a gettext `.po` file. Only msgid/msgstr are read; comments,
    /// contexts and plural forms are ignored. The header entry (empty msgid)
    /// is skipped.
    pub fn from_po_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        #[derive(PartialEq)]
        enum Field {
            None,
            Msgid,
            Msgstr,
        }

        let mut corpus = Corpus::default();
        let mut cur_id: Option<String> = None;
        let mut cur_str: Option<String> = None;
        let mut field = Field::None;

        let finish =
            |id: &mut Option<String>, s: &mut Option<String>, corpus: &mut Corpus| {
                if let (Some(msgid), Some(msgstr)) = (id.take(), s.take()) {
                    if !msgid.is_empty() && !msgstr.is_empty() {
                        corpus.insert(msgid, msgstr);
                    }
                }
            };

        for line in reader.lines() {
            let line = line?;
            let lt = line.trim();

            if lt.starts_with('#') {
                continue;
            }
            if lt.starts_with("msgid_plural") {
                field = Field::None;
                continue;
            }
            if lt.starts_with("msgstr[") {
                field = Field::None;
                continue;
            }
            if let Some(rest) = lt.strip_prefix("msgid") {
                finish(&mut cur_id, &mut cur_str, &mut corpus);
                cur_id = Some(parse_po_string(rest)?);
                field = Field::Msgid;
                continue;
            }
            if let Some(rest) = lt.strip_prefix("msgstr") {
                cur_str = Some(parse_po_string(rest)?);
                field = Field::Msgstr;
                continue;
            }
            if lt.starts_with('"') {
                let value = parse_po_string(lt)?;
                match field {
                    Field::Msgid => {
                        if let Some(ref mut id) = cur_id {
                            id.push_str(&value);
                        }
                    }
                    Field::Msgstr => {
                        if let Some(ref mut s) = cur_str {
                            s.push_str(&value);
                        }
                    }
                    Field::None => {}
                }
                continue;
            }
            if lt.is_empty() {
                finish(&mut cur_id, &mut cur_str, &mut corpus);
                field = Field::None;
            }
        }
        finish(&mut cur_id, &mut cur_str, &mut corpus);

        Ok(corpus)
    }

    fn insert(&mut self, source: String, translation: String) {
        if translation.is_empty() {
            return;
        }
        let index = self.entries.len();
        let normalized = normalize_for_matching(&source);

        self.exact.entry(source.clone()).or_insert(index);
        self.trimmed
            .entry(source.trim().to_string())
            .or_insert_with(|| translation.trim().to_string());
        if !normalized.is_empty() {
            self.normalized.entry(normalized.clone()).or_insert(index);
        }
        self.entries.push(CorpusEntry {
            source,
            translation,
            normalized,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in corpus order, for the linear fuzzy scan.
    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    /// Exact tier: raw key first, then the trimmed-variant key.
    pub fn exact_lookup(&self, text: &str) -> Option<&str> {
        if let Some(&index) = self.exact.get(text) {
            return Some(&self.entries[index].translation);
        }
        self.trimmed.get(text).map(String::as_str)
    }

    /// Normalized tier lookup. `normalized` must already be the output of
    /// [`normalize_for_matching`].
    pub fn normalized_lookup(&self, normalized: &str) -> Option<&CorpusEntry> {
        if normalized.is_empty() {
            return None;
        }
        self.normalized
            .get(normalized)
            .map(|&index| &self.entries[index])
    }
}

fn parse_po_string(s: &str) -> Result<String> {
    let s = s.trim();
    if !s.starts_with('"') || !s.ends_with('"') || s.len() < 2 {
        return Err(Error::Po(format!("not a quoted string: {s}")));
    }
    let inner = &s[1..s.len() - 1];
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn code_span_res() -> &'static [Regex; 3] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"(?s)\[codeblock[^\]]*\].*?\[/codeblock\]").unwrap(),
            Regex::new(r"(?s)\[codeblocks\].*?\[/codeblocks\]").unwrap(),
            Regex::new(r"\[code\].*?\[/code\]").unwrap(),
        ]
    })
}

fn tag_strip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[/?[a-z_]+(?:[ =][^\]]*)?\]").unwrap())
}

/// Reduce text for matching: delete code-span contents entirely, strip all
/// remaining markup tags, collapse whitespace runs to single spaces and trim.
pub fn normalize_for_matching(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    let mut text = content.to_string();
    for re in code_span_res() {
        text = re.replace_all(&text, "").into_owned();
    }
    let text = tag_strip_re().replace_all(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
