//! classref-l10n translates XML class-reference documentation into localized
//! Markdown using a gettext corpus.
//!
//! The pipeline runs in two phases. Records are rendered in parallel: each
//! natural-language field is resolved against the corpus through exact,
//! normalized and fuzzy tiers, and BBCode-style markup is rewritten to
//! Markdown. Afterwards, a single sequential pass moves the generated
//! documents into a directory tree mirroring the inheritance graph and
//! rewrites parent links as files move.

pub mod corpus;
pub mod error;
pub mod hierarchy;
pub mod markup;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod resolver;
pub mod templates;

pub use corpus::{Corpus, CorpusEntry, normalize_for_matching};
pub use error::{Error, Result};
pub use markup::MarkupRewriter;
pub use pipeline::{BatchOptions, BatchSummary, TranslationPipeline};
pub use record::ClassRecord;
pub use render::{DocumentRenderer, RenderedDocument};
pub use resolver::{Resolution, TranslationResolver};
pub use templates::OutputTemplates;

/// Minimum fuzzy-similarity score accepted when no exact or normalized
/// match exists.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.70;

/// Documentation URL prefix substituted for the `$DOCS_URL` token.
pub const DEFAULT_DOCS_URL: &str = "https://docs.godotengine.org/zh-cn/4.x";

/// Language tag for fenced code blocks without an explicit language.
pub const DEFAULT_CODE_LANGUAGE: &str = "gdscript";

/// Record files excluded from processing by default.
pub const DEFAULT_SKIP_FILES: &[&str] = &["Node.xml", "Object.xml"];
