//! Per-record Markdown rendering.
//!
//! Rendering one record depends only on that record and the corpus snapshot,
//! so the orchestrator can fan records out to workers freely. The emitted
//! document has a fixed shape: title line, blank line, a one-line parent
//! slot when the record inherits, then body sections in fixed order. The
//! hierarchy pass later re-parses that shape to rewrite the parent slot.
//!
//! A section whose content is absent, empty or whitespace-only is omitted
//! entirely, heading included.

use crate::record::{ClassRecord, Method};
use crate::resolver::TranslationResolver;
use crate::templates::OutputTemplates;

pub const DEPRECATED_MARK: &str = "⚠️";
pub const EXPERIMENTAL_MARK: &str = "🔬";

/// One rendered Markdown document, held until written to the staging area.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub class_name: String,
    pub inherits: Option<String>,
    pub content: String,
}

pub struct DocumentRenderer<'a> {
    resolver: &'a TranslationResolver,
    templates: &'a OutputTemplates,
}

impl<'a> DocumentRenderer<'a> {
    pub fn new(resolver: &'a TranslationResolver, templates: &'a OutputTemplates) -> Self {
        DocumentRenderer {
            resolver,
            templates,
        }
    }

    pub fn render(&self, record: &ClassRecord) -> RenderedDocument {
        let t = self.templates;
        let mut lines: Vec<String> = Vec::new();

        lines.push(t.localize("class_header", &[("class_name", &record.name)]));

        if let Some(inherits) = &record.inherits {
            lines.push(t.localize("inherits_from", &[("inherits", inherits)]));
            if let Some((emoji, info)) =
                self.status_marker(&record.deprecated, &record.experimental)
            {
                lines.push(t.localize("status_notice", &[("emoji", emoji), ("info", &info)]));
            }
        }

        if let Some(version) = nonblank(&record.version) {
            lines.push(t.localize("version", &[("version", version)]));
        }

        if let Some(text) = nonblank(&record.brief_description) {
            let content = self.resolver.resolve(text);
            lines.push(t.localize("brief_description", &[("content", &content)]));
        }

        if let Some(text) = nonblank(&record.description) {
            let content = self.resolver.resolve(text);
            lines.push(t.localize("description", &[("content", &content)]));
        }

        if !record.tutorials.is_empty() {
            lines.push(t.localize("tutorials", &[]));
            for link in &record.tutorials {
                let title = self
                    .resolver
                    .resolve(link.title.as_deref().unwrap_or("Tutorial"));
                let url = link
                    .url
                    .replace(crate::markup::DOCS_URL_TOKEN, self.resolver.rewriter().docs_url());
                lines.push(t.localize("tutorial_item", &[("title", &title), ("url", &url)]));
            }
            lines.push(String::new());
        }

        if !record.members.is_empty() {
            lines.push(t.localize("members", &[]));
            lines.push(t.localize("members_table", &[]));
            for member in &record.members {
                let desc = match nonblank(&member.text) {
                    Some(text) => self.resolver.resolve(text),
                    None => String::new(),
                };
                let mut row = t.localize(
                    "member_row",
                    &[
                        ("name", &member.name),
                        ("type", &member.member_type),
                        ("desc", &desc),
                    ],
                );
                if let Some(notice) = self.status_note(&member.deprecated, &member.experimental) {
                    row.push_str(&t.localize("deprecation_notice", &[("notice", &notice)]));
                }
                // Table rows must stay on one line.
                let row = row.replace(['\n', '\r'], "");
                lines.push(format!("{row} |"));
            }
            lines.push(String::new());
        }

        if !record.methods.is_empty() {
            lines.push(t.localize("methods", &[]));
            for method in &record.methods {
                self.render_method(method, &mut lines);
            }
        }

        if !record.constants.is_empty() {
            lines.push(t.localize("constants", &[]));
            for constant in &record.constants {
                let mut line = t.localize(
                    "constant",
                    &[("name", &constant.name), ("value", &constant.value)],
                );
                self.push_item_note(
                    &mut line,
                    &constant.deprecated,
                    &constant.experimental,
                );
                self.push_item_text(&mut line, &constant.text);
                lines.push(line);
            }
        }

        if !record.signals.is_empty() {
            lines.push(t.localize("signals", &[]));
            for signal in &record.signals {
                let mut line = t.localize("signal", &[("name", &signal.name)]);
                self.push_item_note(&mut line, &signal.deprecated, &signal.experimental);
                self.push_item_text(&mut line, &signal.text);
                lines.push(line);
            }
        }

        RenderedDocument {
            class_name: record.name.clone(),
            inherits: record.inherits.clone(),
            content: lines.join("\n"),
        }
    }

    fn render_method(&self, method: &Method, lines: &mut Vec<String>) {
        let t = self.templates;
        let mut header = t.localize("method_header", &[("name", &method.name)]);

        if let Some(notice) = self.status_note(&method.deprecated, &method.experimental) {
            header.push_str(&format!(" {DEPRECATED_MARK}"));
            lines.push(header);
            lines.push(t.localize("deprecation_notice", &[("notice", &notice)]));
        } else {
            lines.push(header);
            lines.push(String::new());
        }

        if let Some(ret) = &method.return_type {
            match &ret.enum_name {
                Some(enum_name) => lines.push(t.localize(
                    "return_type_enum",
                    &[("type", &ret.type_name), ("enum", enum_name)],
                )),
                None => lines.push(format!(
                    "{}  \n",
                    t.localize("return_type", &[("type", &ret.type_name)])
                )),
            }
        }

        if !method.arguments.is_empty() {
            lines.push(t.localize("parameters", &[]));
            for arg in &method.arguments {
                let mut param = t.localize(
                    "parameter",
                    &[
                        ("index", &arg.index),
                        ("name", &arg.name),
                        ("type", &arg.arg_type),
                    ],
                );
                if let Some(default) = &arg.default {
                    param.push_str(&t.localize("parameter_default", &[("default", default)]));
                }
                lines.push(param);
            }
        }

        if let Some(text) = nonblank(&method.description) {
            lines.push(format!("\n{}\n", self.resolver.resolve(text)));
        }
    }

    /// Deprecation/experimental marker for the inheritance notice;
    /// deprecated takes precedence.
    fn status_marker(
        &self,
        deprecated: &Option<String>,
        experimental: &Option<String>,
    ) -> Option<(&'static str, String)> {
        if let Some(info) = nonblank(deprecated) {
            return Some((DEPRECATED_MARK, self.resolver.resolve(info)));
        }
        if let Some(info) = nonblank(experimental) {
            return Some((EXPERIMENTAL_MARK, self.resolver.resolve(info)));
        }
        None
    }

    /// Free-text note for a member/method/constant/signal, resolved through
    /// the corpus like any other natural-language field.
    fn status_note(
        &self,
        deprecated: &Option<String>,
        experimental: &Option<String>,
    ) -> Option<String> {
        nonblank(deprecated)
            .or_else(|| nonblank(experimental))
            .map(|info| self.resolver.resolve(info))
    }

    fn push_item_note(
        &self,
        line: &mut String,
        deprecated: &Option<String>,
        experimental: &Option<String>,
    ) {
        if let Some(notice) = self.status_note(deprecated, experimental) {
            line.push_str(&format!(" {DEPRECATED_MARK}"));
            line.push_str(
                &self
                    .templates
                    .localize("deprecation_notice", &[("notice", &notice)]),
            );
        }
    }

    fn push_item_text(&self, line: &mut String, text: &Option<String>) {
        if let Some(text) = nonblank(text) {
            line.push_str(&format!("  \n{}\n", self.resolver.resolve(text)));
        }
    }
}

fn nonblank(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}
