//! Structured documentation records.
//!
//! A record is one class-reference entity: a named element tree with
//! attributes and child sections. The parser treats the tree as opaque;
//! unknown attributes and elements are ignored, nothing is validated against
//! a schema. A malformed file yields an error for that record only.

use roxmltree::{Document, Node};

use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct ClassRecord {
    pub name: String,
    pub inherits: Option<String>,
    pub version: Option<String>,
    pub deprecated: Option<String>,
    pub experimental: Option<String>,
    pub brief_description: Option<String>,
    pub description: Option<String>,
    pub tutorials: Vec<TutorialLink>,
    pub members: Vec<Member>,
    pub methods: Vec<Method>,
    pub constants: Vec<Constant>,
    pub signals: Vec<Signal>,
}

#[derive(Debug, Clone)]
pub struct TutorialLink {
    pub title: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub member_type: String,
    pub text: Option<String>,
    pub deprecated: Option<String>,
    pub experimental: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub return_type: Option<ReturnType>,
    pub arguments: Vec<Argument>,
    pub description: Option<String>,
    pub deprecated: Option<String>,
    pub experimental: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReturnType {
    pub type_name: String,
    pub enum_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Argument {
    pub index: String,
    pub name: String,
    pub arg_type: String,
    pub default: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Constant {
    pub name: String,
    pub value: String,
    pub text: Option<String>,
    pub deprecated: Option<String>,
    pub experimental: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Signal {
    pub name: String,
    pub text: Option<String>,
    pub deprecated: Option<String>,
    pub experimental: Option<String>,
}

fn attr(node: Node, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

fn child<'a>(node: Node<'a, 'a>, tag: &str) -> Option<Node<'a, 'a>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
}

fn child_text(node: Node, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|n| n.text())
        .map(str::to_string)
}

impl ClassRecord {
    /// Parse one XML class record.
    pub fn from_xml_str(xml: &str) -> Result<ClassRecord> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();

        let mut record = ClassRecord {
            name: attr(root, "name").unwrap_or_else(|| "Class".to_string()),
            inherits: attr(root, "inherits"),
            version: attr(root, "version"),
            deprecated: attr(root, "deprecated"),
            experimental: attr(root, "experimental"),
            brief_description: child_text(root, "brief_description"),
            description: child_text(root, "description"),
            ..ClassRecord::default()
        };

        if let Some(tutorials) = child(root, "tutorials") {
            for link in tutorials
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "link")
            {
                let Some(url) = link.text().map(str::trim).filter(|u| !u.is_empty()) else {
                    continue;
                };
                record.tutorials.push(TutorialLink {
                    title: attr(link, "title"),
                    url: url.to_string(),
                });
            }
        }

        if let Some(members) = child(root, "members") {
            for node in members
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "member")
            {
                record.members.push(Member {
                    name: attr(node, "name").unwrap_or_default(),
                    member_type: attr(node, "type").unwrap_or_default(),
                    text: node.text().map(str::to_string),
                    deprecated: attr(node, "deprecated"),
                    experimental: attr(node, "experimental"),
                });
            }
        }

        if let Some(methods) = child(root, "methods") {
            for node in methods
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "method")
            {
                record.methods.push(parse_method(node));
            }
        }

        if let Some(constants) = child(root, "constants") {
            for node in constants.children().filter(|n| n.is_element()) {
                record.constants.push(Constant {
                    name: attr(node, "name").unwrap_or_default(),
                    value: attr(node, "value").unwrap_or_default(),
                    text: node.text().map(str::to_string),
                    deprecated: attr(node, "deprecated"),
                    experimental: attr(node, "experimental"),
                });
            }
        }

        if let Some(signals) = child(root, "signals") {
            for node in signals.children().filter(|n| n.is_element()) {
                record.signals.push(Signal {
                    name: attr(node, "name").unwrap_or_default(),
                    text: node.text().map(str::to_string),
                    deprecated: attr(node, "deprecated"),
                    experimental: attr(node, "experimental"),
                });
            }
        }

        Ok(record)
    }
}

fn parse_method(node: Node) -> Method {
    let return_type = child(node, "return").map(|ret| ReturnType {
        type_name: attr(ret, "type").unwrap_or_else(|| "void".to_string()),
        enum_name: attr(ret, "enum"),
    });

    let arguments = node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "argument")
        .map(|arg| Argument {
            index: attr(arg, "index").unwrap_or_default(),
            name: attr(arg, "name").unwrap_or_default(),
            arg_type: attr(arg, "type").unwrap_or_default(),
            default: attr(arg, "default"),
        })
        .collect();

    Method {
        name: attr(node, "name").unwrap_or_default(),
        return_type,
        arguments,
        description: child_text(node, "description"),
        deprecated: attr(node, "deprecated"),
        experimental: attr(node, "experimental"),
    }
}
