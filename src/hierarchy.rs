//! Inheritance-based document placement.
//!
//! Runs once, after every document has been rendered and flushed to the
//! output root. Documents move into a directory path mirroring their
//! ancestor chain, and the parent slot of each moved document is rewritten
//! to a path relative to its new location.
//!
//! The walk over parent pointers tracks visited names, so a cyclic
//! inheritance map terminates with a bounded-depth path instead of hanging.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::templates::OutputTemplates;

/// Scratch directory name inside the output root; removed when done.
pub const STAGING_DIR: &str = "_staging";

/// Record name -> parent name (or none). Incomplete maps are fine: a parent
/// outside the map is a dangling reference, not an error.
pub type InheritanceMap = HashMap<String, Option<String>>;

/// Reorganize `output_dir` in place. `skip_names` are record names whose
/// files stay at the root untouched.
pub fn reorganize(
    output_dir: &Path,
    hierarchy: &InheritanceMap,
    skip_names: &[String],
    templates: &OutputTemplates,
) -> Result<()> {
    let staging = output_dir.join(STAGING_DIR);
    fs::create_dir_all(&staging)?;

    // Stage every root-level document first so directory names can never
    // collide with the files being moved.
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        if skip_names.iter().any(|s| *s == stem) {
            continue;
        }
        fs::rename(&path, staging.join(path.file_name().unwrap_or_default()))?;
    }

    for (class_name, inherits) in hierarchy {
        let staged = staging.join(format!("{class_name}.md"));
        if !staged.exists() {
            // Rendering failed for this record; partial batches are fine.
            continue;
        }

        let mut target_dir = output_dir.to_path_buf();
        if let Some(parent) = inherits {
            for ancestor in ancestor_chain(parent, hierarchy).iter().rev() {
                target_dir.push(ancestor);
            }
            fs::create_dir_all(&target_dir)?;

            let rel_path = if hierarchy.contains_key(parent) {
                // The parent document sits one directory level up.
                format!("../{parent}.md")
            } else {
                format!("{parent}.md")
            };
            let link = templates.localize(
                "inherits_link",
                &[("inherits", parent), ("rel_path", &rel_path)],
            );
            let content = fs::read_to_string(&staged)?;
            fs::write(&staged, rewrite_parent_slot(&content, &link))?;
        }

        fs::rename(&staged, target_dir.join(format!("{class_name}.md")))?;
    }

    // Anything still staged (e.g. a document for a record missing from the
    // map) goes back to the root rather than being deleted with the scratch
    // area.
    for entry in fs::read_dir(&staging)? {
        let path = entry?.path();
        if path.is_file() {
            fs::rename(&path, output_dir.join(path.file_name().unwrap_or_default()))?;
        }
    }
    fs::remove_dir_all(&staging)?;
    Ok(())
}

/// In-map ancestors of `first_parent`, nearest first. Stops at a record with
/// no parent, a parent outside the map, or a revisit (cycle guard).
fn ancestor_chain(first_parent: &str, hierarchy: &InheritanceMap) -> Vec<String> {
    let mut chain = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = Some(first_parent.to_string());
    while let Some(name) = current {
        if !hierarchy.contains_key(&name) || !visited.insert(name.clone()) {
            break;
        }
        current = hierarchy.get(&name).cloned().flatten();
        chain.push(name);
    }
    chain
}

/// Replace the parent slot, the first non-blank line after the title, with
/// `link`. Documents are re-parsed by shape, never by line index.
fn rewrite_parent_slot(content: &str, link: &str) -> String {
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    match lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| !line.trim().is_empty())
        .map(|(index, _)| index)
    {
        Some(index) => lines[index] = link.to_string(),
        None => {
            lines.push(String::new());
            lines.push(link.to_string());
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_doc(dir: &Path, name: &str, parent: Option<&str>) {
        let slot = parent
            .map(|p| format!("*Inherits: {p}*  \n"))
            .unwrap_or_default();
        fs::write(
            dir.join(format!("{name}.md")),
            format!("# {name}\n\n{slot}\n## Brief description\n\nBody of {name}.\n"),
        )
        .unwrap();
    }

    fn map(pairs: &[(&str, Option<&str>)]) -> InheritanceMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_ancestor_chain_nearest_first() {
        let h = map(&[
            ("Sprite2D", Some("Node2D")),
            ("Node2D", Some("CanvasItem")),
            ("CanvasItem", None),
        ]);
        assert_eq!(ancestor_chain("Node2D", &h), vec!["Node2D", "CanvasItem"]);
        assert_eq!(ancestor_chain("CanvasItem", &h), vec!["CanvasItem"]);
        assert!(ancestor_chain("Unknown", &h).is_empty());
    }

    #[test]
    fn test_ancestor_chain_terminates_on_cycle() {
        let h = map(&[("A", Some("B")), ("B", Some("A"))]);
        assert_eq!(ancestor_chain("B", &h), vec!["B", "A"]);
    }

    #[test]
    fn test_inheritance_tree_placement() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path();
        write_doc(out, "Sprite2D", Some("Node2D"));
        write_doc(out, "Node2D", Some("CanvasItem"));
        write_doc(out, "CanvasItem", None);

        let h = map(&[
            ("Sprite2D", Some("Node2D")),
            ("Node2D", Some("CanvasItem")),
            ("CanvasItem", None),
        ]);
        reorganize(out, &h, &[], &OutputTemplates::default()).unwrap();

        assert!(out.join("CanvasItem").join("Node2D").join("Sprite2D.md").exists());
        assert!(out.join("CanvasItem").join("Node2D.md").exists());
        assert!(out.join("CanvasItem.md").exists());
        assert!(!out.join(STAGING_DIR).exists());

        let sprite =
            fs::read_to_string(out.join("CanvasItem").join("Node2D").join("Sprite2D.md"))
                .unwrap();
        let lines: Vec<&str> = sprite.split('\n').collect();
        assert_eq!(lines[0], "# Sprite2D");
        assert_eq!(lines[2], "> *Inherits: [Node2D](../Node2D.md)*");

        // A parent with no further ancestor stays in the same directory.
        let node = fs::read_to_string(out.join("CanvasItem").join("Node2D.md")).unwrap();
        assert!(node.contains("> *Inherits: [CanvasItem](../CanvasItem.md)*"));
    }

    #[test]
    fn test_parent_outside_map_links_same_directory() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path();
        write_doc(out, "Widget", Some("External"));

        let h = map(&[("Widget", Some("External"))]);
        reorganize(out, &h, &[], &OutputTemplates::default()).unwrap();

        // No known ancestors: file stays at the root.
        let widget = fs::read_to_string(out.join("Widget.md")).unwrap();
        assert!(widget.contains("> *Inherits: [External](External.md)*"));
    }

    #[test]
    fn test_missing_staged_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path();
        write_doc(out, "Present", None);

        let h = map(&[("Present", None), ("MissingRender", Some("Present"))]);
        reorganize(out, &h, &[], &OutputTemplates::default()).unwrap();
        assert!(out.join("Present.md").exists());
        assert!(!out.join(STAGING_DIR).exists());
    }

    #[test]
    fn test_skip_names_stay_at_root_untouched() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path();
        write_doc(out, "Node", None);
        write_doc(out, "Sprite2D", Some("Node"));

        let h = map(&[("Sprite2D", Some("Node"))]);
        let before = fs::read_to_string(out.join("Node.md")).unwrap();
        reorganize(out, &h, &["Node".to_string()], &OutputTemplates::default()).unwrap();

        assert_eq!(fs::read_to_string(out.join("Node.md")).unwrap(), before);
        // "Node" is not in the map, so Sprite2D links it in-directory.
        let sprite = fs::read_to_string(out.join("Sprite2D.md")).unwrap();
        assert!(sprite.contains("(Node.md)"));
    }

    #[test]
    fn test_document_without_map_entry_returns_to_root() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path();
        write_doc(out, "Known", None);
        write_doc(out, "Orphan", None);

        // "Orphan" gets staged but no map entry ever claims it.
        let h = map(&[("Known", None)]);
        reorganize(out, &h, &[], &OutputTemplates::default()).unwrap();

        let orphan = fs::read_to_string(out.join("Orphan.md")).unwrap();
        assert!(orphan.contains("Body of Orphan."));
        assert!(out.join("Known.md").exists());
        assert!(!out.join(STAGING_DIR).exists());
    }

    #[test]
    fn test_cyclic_map_terminates_with_bounded_path() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path();
        write_doc(out, "A", Some("B"));
        write_doc(out, "B", Some("A"));

        let h = map(&[("A", Some("B")), ("B", Some("A"))]);
        reorganize(out, &h, &[], &OutputTemplates::default()).unwrap();
        assert!(!out.join(STAGING_DIR).exists());

        // Both documents landed somewhere no deeper than the cycle length.
        let placed: Vec<_> = walkdir::WalkDir::new(out)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "md"))
            .map(|e| e.depth())
            .collect();
        assert_eq!(placed.len(), 2);
        assert!(placed.iter().all(|&depth| depth <= 3));
    }

    #[test]
    fn test_rewrite_parent_slot_replaces_first_nonblank_after_title() {
        let content = "# Title\n\n*Inherits: X*  \n\nBody";
        assert_eq!(
            rewrite_parent_slot(content, "> link"),
            "# Title\n\n> link\n\nBody"
        );
    }

    #[test]
    fn test_rewrite_parent_slot_appends_when_only_title() {
        assert_eq!(rewrite_parent_slot("# Title", "> link"), "# Title\n\n> link");
    }
}
