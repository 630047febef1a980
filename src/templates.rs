//! Localized output templates.
//!
//! Every piece of structural text the renderer emits (headings, table
//! scaffolding, notice lines) comes from this table so the generated
//! documents can be localized without touching the renderer. Values are
//! plain strings with `{placeholder}` slots.
//!
//! A template invoked with a missing binding falls back to the raw template
//! string and emits a warning — formatting problems must never lose content.

use colored::Colorize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

const DEFAULTS: &[(&str, &str)] = &[
    ("class_header", "# {class_name}\n"),
    ("inherits_from", "*Inherits: {inherits}*  "),
    ("inherits_link", "> *Inherits: [{inherits}]({rel_path})*"),
    (
        "status_notice",
        "{emoji} **Note**: may be changed or removed in future versions.\nDetails: {info}  \n",
    ),
    ("version", "*Version: {version}*  \n"),
    ("brief_description", "\n## Brief description\n\n{content}\n"),
    ("description", "\n## Description\n\n{content}\n"),
    ("tutorials", "\n## Tutorials\n"),
    ("tutorial_item", "- [{title}]({url})"),
    ("members", "\n## Members\n"),
    ("members_table", "| Name | Type | Description |\n|------|------|------|"),
    ("member_row", "| `{name}` | `{type}` | {desc}"),
    ("deprecation_notice", "  \n**Note**: {notice}"),
    ("methods", "\n## Methods\n"),
    ("method_header", "### {name}()"),
    ("return_type", "*Returns: `{type}`*"),
    ("return_type_enum", "*Returns: `{type}` (`{enum}`)*  \n"),
    ("parameters", "\n**Parameters:**\n"),
    ("parameter", "- {index}: `{name}` (`{type}`)"),
    ("parameter_default", " [default: `{default}`]"),
    ("constants", "\n## Constants\n"),
    ("constant", "- **`{name}`** = `{value}`"),
    ("signals", "\n## Signals\n"),
    ("signal", "- **`{name}`**"),
];

pub struct OutputTemplates {
    templates: HashMap<String, String>,
}

impl Default for OutputTemplates {
    fn default() -> Self {
        OutputTemplates {
            templates: DEFAULTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl OutputTemplates {
    /// Format the template for `key` with the given bindings.
    ///
    /// Unknown keys localize to the key itself; a template referencing a
    /// binding that was not supplied is returned unformatted. Both cases
    /// emit a warning diagnostic.
    pub fn localize(&self, key: &str, args: &[(&str, &str)]) -> String {
        let Some(template) = self.templates.get(key) else {
            eprintln!("{}", format!("warning: unknown template key '{key}'").yellow());
            return key.to_string();
        };
        match fill(template, args) {
            Some(text) => text,
            None => {
                eprintln!(
                    "{}",
                    format!("warning: template '{key}' is missing an argument").yellow()
                );
                template.clone()
            }
        }
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// Heading line of the brief-description template, used by the tree
    /// summary to locate the excerpt.
    pub fn brief_heading(&self) -> Option<String> {
        self.raw("brief_description")?
            .lines()
            .find(|line| line.starts_with('#'))
            .map(str::to_string)
    }

    /// Override templates from a JSON object file (key -> template string).
    /// Keys starting with `@` are metadata and are skipped, as are
    /// non-string values.
    pub fn merge_from_json_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)?;
        let json: Value = serde_json::from_str(&content).map_err(|e| Error::Templates {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let object = json.as_object().ok_or_else(|| Error::Templates {
            path: path.display().to_string(),
            message: "root must be an object".to_string(),
        })?;

        for (key, value) in object {
            if key.starts_with('@') {
                continue;
            }
            if let Some(template) = value.as_str() {
                self.templates.insert(key.clone(), template.to_string());
            } else {
                eprintln!(
                    "{}",
                    format!("warning: template '{key}' is not a string, skipping").yellow()
                );
            }
        }
        Ok(())
    }
}

/// Substitute `{name}` slots; `None` when a slot has no binding.
fn fill(template: &str, args: &[(&str, &str)]) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            // Unterminated brace: keep literal.
            out.push_str(&rest[open..]);
            return Some(out);
        };
        let name = &after[..close];
        let value = args.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)?;
        out.push_str(value);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Some(out)
}
