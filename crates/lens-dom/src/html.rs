//! HTML → page tree translation.
//!
//! The markup is parsed with `scraper` and copied into an owned, mutable tree.
//! A `<template shadowrootmode="open|closed">` element becomes a shadow root
//! of its parent element (declarative shadow DOM).

use std::path::Path;
use std::rc::Rc;

use ego_tree::{NodeId, NodeRef, Tree};
use scraper::{Html, Node};
use tracing::{debug, info};

use crate::document::{Document, ElementData, NodeKind, ShadowRootMode};
use crate::error::{DomError, Result};
use crate::geometry::Size;
use crate::style::InlineStyle;

#[derive(Debug, Clone, Default)]
pub struct HtmlOptions {
    /// Viewport used to resolve percentage lengths.
    pub viewport: Option<Size>,
    /// Keep text nodes that contain only whitespace.
    pub keep_whitespace_text: bool,
}

pub fn document_from_html(html: &str, options: HtmlOptions) -> Rc<Document> {
    let parsed = Html::parse_document(html);
    let mut tree = Tree::new(NodeKind::Document);
    let root = tree.root().id();
    let mut translator = HtmlTranslator {
        tree: &mut tree,
        options: &options,
        shadow_roots: 0,
    };
    for child in parsed.tree.root().children() {
        translator.convert(child, root);
    }
    let shadow_roots = translator.shadow_roots;

    let document = Document::from_tree(tree);
    if let Some(viewport) = options.viewport {
        document.set_viewport(viewport);
    }
    debug!(shadow_roots, "translated HTML document");
    document
}

pub fn document_from_file(path: &Path, options: HtmlOptions) -> Result<Rc<Document>> {
    let html = std::fs::read_to_string(path).map_err(DomError::Io)?;
    info!(path = %path.display(), bytes = html.len(), "loading page");
    Ok(document_from_html(&html, options))
}

struct HtmlTranslator<'a> {
    tree: &'a mut Tree<NodeKind>,
    options: &'a HtmlOptions,
    shadow_roots: usize,
}

impl HtmlTranslator<'_> {
    fn append(&mut self, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
        let mut parent = self.tree.get_mut(parent)?;
        Some(parent.append(kind).id())
    }

    fn convert(&mut self, node: NodeRef<'_, Node>, parent: NodeId) {
        match node.value() {
            Node::Element(element) => {
                let is_template = element.name() == "template";
                if is_template {
                    if let Some(mode) = shadow_root_mode(element.attr("shadowrootmode")) {
                        self.convert_shadow_root(node, parent, mode);
                        return;
                    }
                }

                let mut data = ElementData::new(element.name());
                for (name, value) in element.attrs() {
                    if name == "style" {
                        data.style = InlineStyle::parse(value);
                    } else {
                        data.set_attr(name, value);
                    }
                }
                let Some(id) = self.append(parent, NodeKind::Element(data)) else {
                    return;
                };
                // Ordinary template contents stay inert.
                if is_template {
                    return;
                }
                for child in node.children() {
                    self.convert(child, id);
                }
            }
            Node::Text(text) => {
                let content: &str = text;
                if self.options.keep_whitespace_text || !content.trim().is_empty() {
                    self.append(parent, NodeKind::Text(content.to_string()));
                }
            }
            // Template contents live under a fragment; splice them into the parent.
            Node::Fragment => {
                for child in node.children() {
                    self.convert(child, parent);
                }
            }
            // Comments, doctype and processing instructions carry nothing the
            // inspector needs.
            _ => {}
        }
    }

    fn convert_shadow_root(&mut self, template: NodeRef<'_, Node>, host: NodeId, mode: ShadowRootMode) {
        let host_is_element = matches!(
            self.tree.get(host).map(|n| n.value()),
            Some(NodeKind::Element(_))
        );
        let already_hosting = self
            .tree
            .get(host)
            .is_some_and(|n| n.children().any(|c| matches!(c.value(), NodeKind::ShadowRoot(_))));
        if !host_is_element || already_hosting {
            // Only the first declarative root of an element takes effect.
            return;
        }
        let root = match self.tree.get_mut(host) {
            Some(mut host) => host.prepend(NodeKind::ShadowRoot(mode)).id(),
            None => return,
        };
        self.shadow_roots += 1;
        for child in template.children() {
            self.convert(child, root);
        }
    }
}

fn shadow_root_mode(attr: Option<&str>) -> Option<ShadowRootMode> {
    match attr?.trim().to_ascii_lowercase().as_str() {
        "open" => Some(ShadowRootMode::Open),
        "closed" => Some(ShadowRootMode::Closed),
        _ => None,
    }
}
