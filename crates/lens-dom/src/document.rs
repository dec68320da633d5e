//! Owned, mutable page tree.
//!
//! The document is shared as `Rc<Document>` between the page host and the
//! inspection components. All mutation goes through `&self` with the tree
//! behind a `RefCell`; no borrow is held while event listeners run.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ego_tree::{NodeId, Tree};
use tracing::trace;

use crate::error::{DomError, Result};
use crate::events::{EventKind, EventListener, ListenerId, ListenerRegistry, MouseEvent};
use crate::geometry::{Rect, Size};
use crate::selector::{Selector, SelectorPath};
use crate::style::InlineStyle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadowRootMode {
    Open,
    Closed,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    /// Shadow root; stored as a child of its host but never listed among the
    /// host's children.
    ShadowRoot(ShadowRootMode),
}

#[derive(Clone, Debug)]
pub struct ElementData {
    pub tag: String,
    attributes: Vec<(String, String)>,
    pub style: InlineStyle,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            style: InlineStyle::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }
}

pub struct Document {
    tree: RefCell<Tree<NodeKind>>,
    listeners: RefCell<ListenerRegistry>,
    viewport: Cell<Size>,
}

impl Document {
    /// An empty `html > (head, body)` document.
    pub fn new() -> Rc<Self> {
        let mut tree = Tree::new(NodeKind::Document);
        {
            let mut root = tree.root_mut();
            let mut html = root.append(NodeKind::Element(ElementData::new("html")));
            html.append(NodeKind::Element(ElementData::new("head")));
            html.append(NodeKind::Element(ElementData::new("body")));
        }
        Self::from_tree(tree)
    }

    pub(crate) fn from_tree(tree: Tree<NodeKind>) -> Rc<Self> {
        Rc::new(Self {
            tree: RefCell::new(tree),
            listeners: RefCell::new(ListenerRegistry::default()),
            viewport: Cell::new(Size::default()),
        })
    }

    pub fn root(&self) -> NodeId {
        self.tree.borrow().root().id()
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.root()).into_iter().next()
    }

    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html)
            .into_iter()
            .find(|id| self.tag_name(*id).as_deref() == Some("body"))
    }

    pub fn viewport(&self) -> Size {
        self.viewport.get()
    }

    pub fn set_viewport(&self, size: Size) {
        self.viewport.set(size);
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.tree.borrow().get(id).is_some()
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let tree = self.tree.borrow();
        let root = tree.root().id();
        let Some(node) = tree.get(id) else {
            return false;
        };
        node.id() == root || node.ancestors().any(|a| a.id() == root)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.tree.borrow().get(id).map(|n| n.value().clone())
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(
            self.tree.borrow().get(id).map(|n| n.value()),
            Some(NodeKind::Element(_))
        )
    }

    fn with_element<R>(&self, id: NodeId, f: impl FnOnce(&ElementData) -> R) -> Option<R> {
        let tree = self.tree.borrow();
        match tree.get(id)?.value() {
            NodeKind::Element(el) => Some(f(el)),
            _ => None,
        }
    }

    fn with_element_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut ElementData) -> R) -> Result<R> {
        let mut tree = self.tree.borrow_mut();
        let mut node = tree.get_mut(id).ok_or(DomError::UnknownNode(id))?;
        match node.value() {
            NodeKind::Element(el) => Ok(f(el)),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        self.with_element(id, |el| el.tag.clone())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.with_element(id, |el| el.attr(name).map(str::to_string))
            .flatten()
    }

    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) -> Result<()> {
        self.with_element_mut(id, |el| el.set_attr(name, value))
    }

    pub fn element_id(&self, id: NodeId) -> Option<String> {
        self.with_element(id, |el| el.id().map(str::to_string))
            .flatten()
    }

    pub fn classes(&self, id: NodeId) -> Vec<String> {
        self.with_element(id, |el| el.classes().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn style(&self, id: NodeId) -> Option<InlineStyle> {
        self.with_element(id, |el| el.style.clone())
    }

    pub fn set_style(&self, id: NodeId, style: InlineStyle) -> Result<()> {
        self.with_element_mut(id, |el| el.style = style)
    }

    pub fn update_style(&self, id: NodeId, f: impl FnOnce(&mut InlineStyle)) -> Result<()> {
        self.with_element_mut(id, |el| f(&mut el.style))
    }

    /// Concatenated text of all descendant text nodes (light tree only).
    pub fn text_content(&self, id: NodeId) -> String {
        let tree = self.tree.borrow();
        let Some(node) = tree.get(id) else {
            return String::new();
        };
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            match n.value() {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::ShadowRoot(_) => continue,
                _ => {}
            }
            let children: Vec<_> = n.children().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.borrow().get(id)?.parent().map(|p| p.id())
    }

    /// Child nodes, excluding an attached shadow root.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        let Some(node) = tree.get(id) else {
            return Vec::new();
        };
        node.children()
            .filter(|c| !matches!(c.value(), NodeKind::ShadowRoot(_)))
            .map(|c| c.id())
            .collect()
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        let Some(node) = tree.get(id) else {
            return Vec::new();
        };
        node.children()
            .filter(|c| matches!(c.value(), NodeKind::Element(_)))
            .map(|c| c.id())
            .collect()
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        tree.orphan(NodeKind::Element(ElementData::new(tag))).id()
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        let mut tree = self.tree.borrow_mut();
        tree.orphan(NodeKind::Text(text.to_string())).id()
    }

    /// Append `child` as the last child of `parent`, moving it if already attached.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let parent_ref = tree.get(parent).ok_or(DomError::UnknownNode(parent))?;
        if tree.get(child).is_none() {
            return Err(DomError::UnknownNode(child));
        }
        if matches!(parent_ref.value(), NodeKind::Text(_)) {
            return Err(DomError::NotAnElement(parent));
        }
        if parent == child || parent_ref.ancestors().any(|a| a.id() == child) {
            return Err(DomError::HierarchyRequest { child });
        }
        tree.get_mut(parent)
            .ok_or(DomError::UnknownNode(parent))?
            .append_id(child);
        trace!(?parent, ?child, "append_child");
        Ok(())
    }

    /// Detach `child` from `parent`.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let mut tree = self.tree.borrow_mut();
        let actual_parent = tree
            .get(child)
            .ok_or(DomError::UnknownNode(child))?
            .parent()
            .map(|p| p.id());
        if actual_parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        tree.get_mut(child)
            .ok_or(DomError::UnknownNode(child))?
            .detach();
        trace!(?parent, ?child, "remove_child");
        Ok(())
    }

    pub fn attach_shadow(&self, host: NodeId, mode: ShadowRootMode) -> Result<NodeId> {
        if !self.is_element(host) {
            return Err(match self.contains_node(host) {
                true => DomError::NotAnElement(host),
                false => DomError::UnknownNode(host),
            });
        }
        if self.attached_shadow_root(host).is_some() {
            return Err(DomError::ShadowRootExists(host));
        }
        let mut tree = self.tree.borrow_mut();
        let mut host_mut = tree.get_mut(host).ok_or(DomError::UnknownNode(host))?;
        Ok(host_mut.prepend(NodeKind::ShadowRoot(mode)).id())
    }

    pub(crate) fn attached_shadow_root(&self, host: NodeId) -> Option<NodeId> {
        let tree = self.tree.borrow();
        tree.get(host)?
            .children()
            .find(|c| matches!(c.value(), NodeKind::ShadowRoot(_)))
            .map(|c| c.id())
    }

    /// The open shadow root hosted by `host`, if any. Closed roots are not exposed.
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        let root = self.attached_shadow_root(host)?;
        (self.shadow_root_mode(root) == Some(ShadowRootMode::Open)).then_some(root)
    }

    pub fn shadow_root_mode(&self, root: NodeId) -> Option<ShadowRootMode> {
        match self.tree.borrow().get(root)?.value() {
            NodeKind::ShadowRoot(mode) => Some(*mode),
            _ => None,
        }
    }

    /// Document or shadow root.
    pub fn is_scope_root(&self, id: NodeId) -> bool {
        matches!(
            self.tree.borrow().get(id).map(|n| n.value()),
            Some(NodeKind::Document) | Some(NodeKind::ShadowRoot(_))
        )
    }

    /// Nearest enclosing document or shadow root of `id`.
    pub fn scope_of(&self, id: NodeId) -> Option<NodeId> {
        let tree = self.tree.borrow();
        tree.get(id)?
            .ancestors()
            .find(|a| matches!(a.value(), NodeKind::Document | NodeKind::ShadowRoot(_)))
            .map(|a| a.id())
    }

    /// Elements of a tree scope in document order, not descending into nested shadow roots.
    pub fn scope_elements(&self, scope: NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        let Some(start) = tree.get(scope) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack: Vec<_> = start.children().collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            match node.value() {
                NodeKind::Element(_) => {
                    out.push(node.id());
                    let children: Vec<_> = node.children().collect();
                    stack.extend(children.into_iter().rev());
                }
                _ => {}
            }
        }
        out
    }

    pub fn get_element_by_id(&self, scope: NodeId, element_id: &str) -> Option<NodeId> {
        self.scope_elements(scope)
            .into_iter()
            .find(|id| self.element_id(*id).as_deref() == Some(element_id))
    }

    pub fn query_selector(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .scope_elements(scope)
            .into_iter()
            .find(|id| selector.matches(self, *id, scope)))
    }

    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .scope_elements(scope)
            .into_iter()
            .filter(|id| selector.matches(self, *id, scope))
            .collect())
    }

    /// Resolve a selector path, descending through open shadow roots.
    pub fn query_selector_path(&self, path: &SelectorPath) -> Result<Option<NodeId>> {
        let mut scope = self.root();
        let mut found = None;
        for (i, part) in path.iter().enumerate() {
            let Some(element) = self.query_selector(scope, part)? else {
                return Ok(None);
            };
            found = Some(element);
            if i + 1 < path.len() {
                match self.shadow_root(element) {
                    Some(root) => scope = root,
                    None => return Ok(None),
                }
            }
        }
        Ok(found)
    }

    /// Box of an element from its inline geometry, relative to the viewport.
    ///
    /// Elements without both `width` and `height` are not laid out.
    pub fn bounding_rect(&self, id: NodeId) -> Option<Rect> {
        let style = self.style(id)?;
        if style.is_display_none() {
            return None;
        }
        let viewport = self.viewport();
        let w = style.length("width")?.resolve(viewport.width);
        let h = style.length("height")?.resolve(viewport.height);
        let x = style.length("left").map_or(0.0, |l| l.resolve(viewport.width));
        let y = style.length("top").map_or(0.0, |l| l.resolve(viewport.height));
        Some(Rect::new(x, y, w, h))
    }

    pub fn add_event_listener(&self, kind: EventKind, listener: EventListener) -> ListenerId {
        let id = self.listeners.borrow_mut().add(kind, listener);
        trace!(event = %kind, ?id, "listener added");
        id
    }

    pub fn remove_event_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        let removed = self.listeners.borrow_mut().remove(kind, id);
        trace!(event = %kind, ?id, removed, "listener removed");
        removed
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.borrow().count(kind)
    }

    /// Deliver an event to the listeners registered for its kind. Returns the
    /// number of listeners invoked. A listener removed by an earlier one during
    /// the same dispatch is skipped.
    pub fn dispatch_event(&self, event: &MouseEvent) -> usize {
        let snapshot = self.listeners.borrow().snapshot(event.kind);
        let mut invoked = 0;
        for (id, listener) in snapshot {
            if !self.listeners.borrow().contains(id) {
                continue;
            }
            listener(event);
            invoked += 1;
        }
        invoked
    }
}
