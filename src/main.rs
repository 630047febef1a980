use clap::Parser;
use std::path::PathBuf;

use classref_l10n::{
    BatchOptions, Corpus, MarkupRewriter, OutputTemplates, TranslationPipeline,
    TranslationResolver, DEFAULT_DOCS_URL, DEFAULT_SIMILARITY_THRESHOLD,
};

/// Translate an XML class-reference directory into localized Markdown.
#[derive(Parser)]
#[command(name = "classref-l10n", version, about)]
struct Cli {
    /// Gettext .po corpus (source string -> translated string)
    corpus: PathBuf,

    /// Directory of XML class records
    input: PathBuf,

    /// Output directory for the Markdown tree
    output: PathBuf,

    /// Minimum fuzzy-similarity score in [0, 1]
    #[arg(long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
    threshold: f64,

    /// Documentation URL substituted for the $DOCS_URL token
    #[arg(long, default_value = DEFAULT_DOCS_URL)]
    docs_url: String,

    /// JSON file of localized output templates (key -> template)
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Record file to skip; repeatable, replaces the default skip list
    #[arg(long = "skip", value_name = "FILE")]
    skip: Vec<String>,

    /// Worker thread count (default: one per core)
    #[arg(long)]
    jobs: Option<usize>,

    /// Convert residual angle brackets to [ ] in rewritten text
    #[arg(long)]
    escape_html: bool,

    /// Print a tree listing of the output with brief-description excerpts
    #[arg(long)]
    tree: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let corpus = Corpus::from_po_file(&cli.corpus)?;
    let rewriter = MarkupRewriter::new(&cli.docs_url).with_escape_raw_html(cli.escape_html);
    let resolver = TranslationResolver::new(corpus, rewriter).with_threshold(cli.threshold);

    let mut templates = OutputTemplates::default();
    if let Some(path) = &cli.templates {
        templates.merge_from_json_file(path)?;
    }

    let mut options = BatchOptions::default();
    if !cli.skip.is_empty() {
        options.skip_files = cli.skip.clone();
    }
    options.threads = cli.jobs;

    let pipeline = TranslationPipeline::new(resolver, templates).with_options(options);
    let summary = pipeline.process_directory(&cli.input, &cli.output)?;

    if cli.tree {
        print!("{}", pipeline.tree_summary(&cli.output)?);
    }
    println!(
        "{} rendered, {} skipped, {} failed",
        summary.rendered, summary.skipped, summary.failed
    );
    Ok(())
}
