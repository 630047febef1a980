//! Batch orchestration.
//!
//! Records are rendered on a rayon worker pool; rendering is embarrassingly
//! parallel, and each worker returns its result by value. The inheritance
//! map is merged by the orchestrator after the parallel phase, so no shared
//! state is mutated under concurrency. Hierarchy reorganization runs
//! strictly afterwards, sequentially, once every document is flushed.

use colored::Colorize;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Result;
use crate::hierarchy::{self, InheritanceMap};
use crate::record::ClassRecord;
use crate::render::{DocumentRenderer, RenderedDocument};
use crate::resolver::TranslationResolver;
use crate::templates::OutputTemplates;
use crate::DEFAULT_SKIP_FILES;

/// Characters of brief-description text shown per file in the tree summary.
const TREE_EXCERPT_LEN: usize = 18;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// XML file names excluded from processing and reorganization.
    pub skip_files: Vec<String>,
    /// Worker thread cap; `None` leaves the rayon default.
    pub threads: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            skip_files: DEFAULT_SKIP_FILES.iter().map(|s| s.to_string()).collect(),
            threads: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rendered: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct TranslationPipeline {
    resolver: TranslationResolver,
    templates: OutputTemplates,
    options: BatchOptions,
}

impl TranslationPipeline {
    pub fn new(resolver: TranslationResolver, templates: OutputTemplates) -> Self {
        TranslationPipeline {
            resolver,
            templates,
            options: BatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Render every XML record in `xml_dir` into `output_dir`, then
    /// reorganize the output tree by inheritance.
    pub fn process_directory(&self, xml_dir: &Path, output_dir: &Path) -> Result<BatchSummary> {
        fs::create_dir_all(output_dir)?;

        let mut files: Vec<PathBuf> = fs::read_dir(xml_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("xml")
            })
            .collect();
        files.sort();

        let mut skipped = 0;
        files.retain(|path| {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if self.options.skip_files.iter().any(|s| s == name) {
                eprintln!("{}", format!("skipping {name}").yellow());
                skipped += 1;
                false
            } else {
                true
            }
        });

        if let Some(threads) = self.options.threads {
            if let Err(error) = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
            {
                eprintln!(
                    "{}",
                    format!("warning: thread cap ignored: {error}").yellow()
                );
            }
        }

        let renderer = DocumentRenderer::new(&self.resolver, &self.templates);
        let results: Vec<Option<RenderedDocument>> = files
            .par_iter()
            .map(|path| match render_one(&renderer, path) {
                Ok(document) => Some(document),
                Err(error) => {
                    let name = path.file_name().unwrap_or_default().to_string_lossy();
                    eprintln!("{}", format!("error: {name}: {error}").red());
                    None
                }
            })
            .collect();

        let failed = results.iter().filter(|r| r.is_none()).count();
        let mut hierarchy = InheritanceMap::new();
        let mut rendered = 0;
        for document in results.into_iter().flatten() {
            hierarchy.insert(document.class_name.clone(), document.inherits.clone());
            let out_path = output_dir.join(format!("{}.md", document.class_name));
            fs::write(&out_path, &document.content)?;
            println!("{} {}", "generated".green(), out_path.display());
            rendered += 1;
        }

        let skip_names: Vec<String> = self
            .options
            .skip_files
            .iter()
            .map(|name| name.trim_end_matches(".xml").to_string())
            .collect();
        hierarchy::reorganize(output_dir, &hierarchy, &skip_names, &self.templates)?;

        Ok(BatchSummary {
            rendered,
            skipped,
            failed,
        })
    }

    /// Plain-text tree of the final output directory; each document is
    /// annotated with the start of its brief description.
    pub fn tree_summary(&self, output_dir: &Path) -> Result<String> {
        let heading = self.templates.brief_heading();
        let mut out = String::new();
        for entry in WalkDir::new(output_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let indent = "  ".repeat(entry.depth() - 1);
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_dir() {
                out.push_str(&format!("{indent}{name}/\n"));
            } else if entry.path().extension().and_then(|e| e.to_str()) == Some("md") {
                let content = fs::read_to_string(entry.path())?;
                match brief_excerpt(&content, heading.as_deref()) {
                    Some(excerpt) => out.push_str(&format!("{indent}{name} — {excerpt}\n")),
                    None => out.push_str(&format!("{indent}{name}\n")),
                }
            }
        }
        Ok(out)
    }
}

fn render_one(renderer: &DocumentRenderer, path: &Path) -> Result<RenderedDocument> {
    let xml = fs::read_to_string(path)?;
    let record = ClassRecord::from_xml_str(&xml)?;
    Ok(renderer.render(&record))
}

/// First characters of the text following the brief-description heading.
fn brief_excerpt(content: &str, heading: Option<&str>) -> Option<String> {
    let heading = heading?;
    let mut lines = content.lines().skip_while(|line| line.trim() != heading);
    lines.next()?;
    lines
        .find(|line| !line.trim().is_empty())
        .map(|line| line.chars().take(TREE_EXCERPT_LEN).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use crate::markup::MarkupRewriter;
    use tempfile::TempDir;

    fn pipeline(pairs: &[(&str, &str)]) -> TranslationPipeline {
        let resolver = TranslationResolver::new(
            Corpus::from_pairs(pairs.iter().copied()),
            MarkupRewriter::default(),
        );
        TranslationPipeline::new(resolver, OutputTemplates::default())
    }

    fn write_class(dir: &Path, name: &str, inherits: Option<&str>, brief: &str) {
        let inherits = inherits
            .map(|p| format!(" inherits=\"{p}\""))
            .unwrap_or_default();
        fs::write(
            dir.join(format!("{name}.xml")),
            format!(
                "<class name=\"{name}\"{inherits}><brief_description>{brief}</brief_description></class>"
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_batch_renders_and_reorganizes() {
        let tmp = TempDir::new().unwrap();
        let xml_dir = tmp.path().join("xml");
        let out_dir = tmp.path().join("out");
        fs::create_dir(&xml_dir).unwrap();

        write_class(&xml_dir, "CanvasItem", None, "Canvas base.");
        write_class(&xml_dir, "Node2D", Some("CanvasItem"), "2D node.");
        write_class(&xml_dir, "Sprite2D", Some("Node2D"), "A 2D sprite.");

        let summary = pipeline(&[("A 2D sprite.", "一个 2D 精灵。")])
            .process_directory(&xml_dir, &out_dir)
            .unwrap();

        assert_eq!(summary, BatchSummary { rendered: 3, skipped: 0, failed: 0 });
        let sprite_path = out_dir.join("CanvasItem").join("Node2D").join("Sprite2D.md");
        let sprite = fs::read_to_string(&sprite_path).unwrap();
        assert!(sprite.contains("> *Inherits: [Node2D](../Node2D.md)*"));
        assert!(sprite.contains("一个 2D 精灵。"));
    }

    #[test]
    fn test_malformed_record_does_not_abort_batch() {
        let tmp = TempDir::new().unwrap();
        let xml_dir = tmp.path().join("xml");
        let out_dir = tmp.path().join("out");
        fs::create_dir(&xml_dir).unwrap();

        write_class(&xml_dir, "Good", None, "Fine.");
        fs::write(xml_dir.join("Broken.xml"), "<class name=").unwrap();

        let summary = pipeline(&[]).process_directory(&xml_dir, &out_dir).unwrap();
        assert_eq!(summary.rendered, 1);
        assert_eq!(summary.failed, 1);
        assert!(out_dir.join("Good.md").exists());
    }

    #[test]
    fn test_skip_list_bypasses_processing() {
        let tmp = TempDir::new().unwrap();
        let xml_dir = tmp.path().join("xml");
        let out_dir = tmp.path().join("out");
        fs::create_dir(&xml_dir).unwrap();

        write_class(&xml_dir, "Node", None, "Skipped.");
        write_class(&xml_dir, "Kept", None, "Kept brief.");

        let summary = pipeline(&[]).process_directory(&xml_dir, &out_dir).unwrap();
        assert_eq!(summary.rendered, 1);
        assert_eq!(summary.skipped, 1);
        assert!(!out_dir.join("Node.md").exists());
        assert!(out_dir.join("Kept.md").exists());
    }

    #[test]
    fn test_tree_summary_annotates_briefs() {
        let tmp = TempDir::new().unwrap();
        let xml_dir = tmp.path().join("xml");
        let out_dir = tmp.path().join("out");
        fs::create_dir(&xml_dir).unwrap();

        write_class(&xml_dir, "Base", None, "Root of everything, truly.");
        write_class(&xml_dir, "Child", Some("Base"), "Leaf.");

        let p = pipeline(&[]);
        p.process_directory(&xml_dir, &out_dir).unwrap();
        let tree = p.tree_summary(&out_dir).unwrap();

        assert!(tree.contains("Base/\n"));
        assert!(tree.contains("  Child.md"));
        // Excerpt is capped at 18 characters.
        assert!(tree.contains("Base.md — Root of everything"));
        assert!(!tree.contains("truly"));
    }

    #[test]
    fn test_thread_cap_conflict_does_not_fail_batch() {
        let tmp = TempDir::new().unwrap();
        let xml_dir = tmp.path().join("xml");
        let out_dir = tmp.path().join("out");
        fs::create_dir(&xml_dir).unwrap();
        write_class(&xml_dir, "Solo", None, "Only one.");

        let options = BatchOptions {
            skip_files: Vec::new(),
            threads: Some(1),
        };
        // The second run hits an already-initialized global pool; the cap
        // request is warned about and the batch proceeds.
        for _ in 0..2 {
            let summary = pipeline(&[])
                .with_options(options.clone())
                .process_directory(&xml_dir, &out_dir)
                .unwrap();
            assert_eq!(summary.rendered, 1);
        }
        assert!(out_dir.join("Solo.md").exists());
    }

    #[test]
    fn test_empty_input_directory() {
        let tmp = TempDir::new().unwrap();
        let xml_dir = tmp.path().join("xml");
        let out_dir = tmp.path().join("out");
        fs::create_dir(&xml_dir).unwrap();

        let summary = pipeline(&[]).process_directory(&xml_dir, &out_dir).unwrap();
        assert_eq!(summary, BatchSummary::default());
    }
}
