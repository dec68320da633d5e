//! Selector paths and the small selector grammar used to address elements.
//!
//! Supported: type selectors, `*`, `#id`, `.class`, `:nth-child(n)`, and the
//! child (`>`) and descendant (whitespace) combinators. Generated selectors
//! only ever use this subset.

use std::fmt;
use std::ops::Deref;

use ego_tree::NodeId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::Document;

/// One selector per tree scope, from the document down through shadow roots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorPath(Vec<String>);

impl SelectorPath {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for SelectorPath {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for SelectorPath {
    fn from(parts: Vec<String>) -> Self {
        Self(parts)
    }
}

impl fmt::Display for SelectorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" >>> "))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected character {ch:?} at offset {offset} in {selector:?}")]
    Unexpected {
        selector: String,
        offset: usize,
        ch: char,
    },
    #[error("invalid :nth-child argument in {0:?}")]
    NthChild(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    nth_child: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    Child,
    Descendant,
}

/// A parsed complex selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    // Rightmost compound last; each combinator links to the compound before it.
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '-' || !ch.is_ascii()
}

fn is_ident_char(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

/// Whether `s` can be written as a CSS identifier without escaping.
pub fn is_plain_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_ident_start(first) => {}
        _ => return false,
    }
    if s.starts_with("--") || (s.starts_with('-') && s[1..].starts_with(|c: char| c.is_ascii_digit())) {
        return false;
    }
    chars.all(is_ident_char)
}

struct Parser<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn unexpected(&self) -> SelectorError {
        let (offset, ch) = self
            .chars
            .get(self.pos)
            .copied()
            .unwrap_or((self.src.len(), '\0'));
        SelectorError::Unexpected {
            selector: self.src.to_string(),
            offset,
            ch,
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.unexpected());
        }
        Ok(self.chars[start..self.pos].iter().map(|(_, c)| *c).collect())
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut any = false;
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                any = true;
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
                any = true;
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some(':') => {
                    self.pos += 1;
                    let name = self.ident()?;
                    if !name.eq_ignore_ascii_case("nth-child") || self.peek() != Some('(') {
                        return Err(self.unexpected());
                    }
                    self.pos += 1;
                    let start = self.pos;
                    while self.peek().is_some_and(|c| c != ')') {
                        self.pos += 1;
                    }
                    if self.peek() != Some(')') {
                        return Err(SelectorError::NthChild(self.src.to_string()));
                    }
                    let arg: String = self.chars[start..self.pos].iter().map(|(_, c)| *c).collect();
                    self.pos += 1;
                    let n = arg
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| SelectorError::NthChild(self.src.to_string()))?;
                    compound.nth_child = Some(n);
                }
                _ => break,
            }
            any = true;
        }
        if !any {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn selector(mut self) -> Result<Selector, SelectorError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(SelectorError::Empty);
        }
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_ws => combinators.push(Combinator::Descendant),
                Some(_) => return Err(self.unexpected()),
            }
            compounds.push(self.compound()?);
        }
        Ok(Selector {
            compounds,
            combinators,
        })
    }
}

impl Selector {
    pub fn parse(src: &str) -> Result<Self, SelectorError> {
        Parser::new(src).selector()
    }

    /// Whether `element` matches, with ancestry limited to `scope`.
    pub fn matches(&self, doc: &Document, element: NodeId, scope: NodeId) -> bool {
        self.matches_from(doc, element, scope, self.compounds.len() - 1)
    }

    fn matches_from(&self, doc: &Document, element: NodeId, scope: NodeId, idx: usize) -> bool {
        if !compound_matches(doc, element, &self.compounds[idx]) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        let mut ancestor = doc.parent(element);
        match self.combinators[idx - 1] {
            Combinator::Child => match ancestor {
                Some(parent) if parent != scope && doc.is_element(parent) => {
                    self.matches_from(doc, parent, scope, idx - 1)
                }
                _ => false,
            },
            Combinator::Descendant => {
                while let Some(candidate) = ancestor {
                    if candidate == scope || !doc.is_element(candidate) {
                        return false;
                    }
                    if self.matches_from(doc, candidate, scope, idx - 1) {
                        return true;
                    }
                    ancestor = doc.parent(candidate);
                }
                false
            }
        }
    }
}

fn compound_matches(doc: &Document, element: NodeId, compound: &Compound) -> bool {
    if let Some(tag) = &compound.tag {
        if doc.tag_name(element).as_deref() != Some(tag.as_str()) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if doc.element_id(element).as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    if !compound.classes.is_empty() {
        let classes = doc.classes(element);
        if !compound.classes.iter().all(|c| classes.contains(c)) {
            return false;
        }
    }
    if let Some(n) = compound.nth_child {
        if element_index(doc, element) != Some(n) {
            return false;
        }
    }
    true
}

/// 1-based position among the parent's element children.
fn element_index(doc: &Document, element: NodeId) -> Option<usize> {
    let parent = doc.parent(element)?;
    doc.element_children(parent)
        .iter()
        .position(|id| *id == element)
        .map(|i| i + 1)
}

fn compound_for(doc: &Document, element: NodeId) -> String {
    let mut out = doc.tag_name(element).unwrap_or_else(|| "*".to_string());
    for class in doc.classes(element) {
        if is_plain_ident(&class) {
            out.push('.');
            out.push_str(&class);
        }
    }
    out
}

fn unique_in_scope(doc: &Document, scope: NodeId, selector: &str, element: NodeId) -> bool {
    matches!(doc.query_selector_all(scope, selector).as_deref(), Ok([only]) if *only == element)
}

/// Build a selector that identifies `element` within its tree scope.
///
/// Walks up from the element, stopping at the first ancestor with an id that
/// is unique in the scope, and stops early once the partial chain already
/// matches only the element. Sibling position is added where tag and classes
/// are ambiguous among siblings.
pub fn unique_selector(doc: &Document, element: NodeId) -> Option<String> {
    if !doc.is_element(element) {
        return None;
    }
    let scope = doc.scope_of(element)?;

    let mut parts: Vec<String> = Vec::new();
    let mut current = element;
    loop {
        if let Some(id) = doc.element_id(current).filter(|id| is_plain_ident(id)) {
            let anchored = format!("#{id}");
            if doc.query_selector_all(scope, &anchored).map(|v| v.len()).ok() == Some(1) {
                parts.push(anchored);
                break;
            }
        }

        let mut compound = compound_for(doc, current);
        if let Some(parent) = doc.parent(current) {
            let ambiguous = doc
                .element_children(parent)
                .iter()
                .filter(|sibling| {
                    **sibling != current && compound_for(doc, **sibling) == compound
                })
                .count()
                > 0;
            if ambiguous {
                if let Some(n) = element_index(doc, current) {
                    compound.push_str(&format!(":nth-child({n})"));
                }
            }
        }
        parts.push(compound);

        let candidate = parts.iter().rev().cloned().collect::<Vec<_>>().join(" > ");
        if unique_in_scope(doc, scope, &candidate, element) {
            break;
        }

        match doc.parent(current) {
            Some(parent) if parent != scope && doc.is_element(parent) => current = parent,
            _ => break,
        }
    }

    parts.reverse();
    Some(parts.join(" > "))
}

/// Selector path for `element`: one unique selector per enclosing scope,
/// outermost (document) first.
pub fn selector_path(doc: &Document, element: NodeId) -> Option<SelectorPath> {
    let mut parts = Vec::new();
    let mut current = element;
    loop {
        parts.push(unique_selector(doc, current)?);
        let scope = doc.scope_of(current)?;
        if scope == doc.root() {
            break;
        }
        // Shadow root: continue from its host.
        current = doc.parent(scope)?;
    }
    parts.reverse();
    Some(SelectorPath(parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ShadowRootMode;

    fn el(doc: &Document, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = doc.create_element(tag);
        for (name, value) in attrs {
            doc.set_attribute(id, name, value).unwrap();
        }
        doc.append_child(parent, id).unwrap();
        id
    }

    #[test]
    fn parses_supported_grammar() {
        assert!(Selector::parse("div#main.a.b:nth-child(2) > span .x").is_ok());
        assert!(Selector::parse("*").is_ok());
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
        assert!(matches!(
            Selector::parse("div[role=button]"),
            Err(SelectorError::Unexpected { ch: '[', .. })
        ));
        assert!(matches!(
            Selector::parse("li:nth-child(0)"),
            Err(SelectorError::NthChild(_))
        ));
        assert!(Selector::parse("li:hover").is_err());
    }

    #[test]
    fn matches_child_and_descendant_combinators() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        let nav = el(&doc, body, "nav", &[("class", "menu top")]);
        let ul = el(&doc, nav, "ul", &[]);
        let first = el(&doc, ul, "li", &[]);
        let second = el(&doc, ul, "li", &[("id", "current")]);
        let root = doc.root();

        assert_eq!(doc.query_selector(root, "nav.menu > ul > li").unwrap(), Some(first));
        assert_eq!(doc.query_selector(root, "li:nth-child(2)").unwrap(), Some(second));
        assert_eq!(doc.query_selector(root, ".top li#current").unwrap(), Some(second));
        assert_eq!(doc.query_selector(root, "nav > li").unwrap(), None);
        assert_eq!(doc.query_selector_all(root, "body li").unwrap().len(), 2);
    }

    #[test]
    fn prefers_unique_ids() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        let container = el(&doc, body, "div", &[("id", "container")]);
        let widget = el(&doc, container, "div", &[("class", "widget")]);
        assert_eq!(unique_selector(&doc, container).as_deref(), Some("#container"));
        assert_eq!(unique_selector(&doc, widget).as_deref(), Some("div.widget"));

        // A second widget elsewhere forces anchoring on the container id.
        el(&doc, body, "div", &[("class", "widget")]);
        assert_eq!(unique_selector(&doc, widget).as_deref(), Some("#container > div.widget"));
    }

    #[test]
    fn disambiguates_siblings_with_nth_child() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        let list = el(&doc, body, "ul", &[("id", "list")]);
        el(&doc, list, "li", &[]);
        let second = el(&doc, list, "li", &[]);
        let selector = unique_selector(&doc, second).unwrap();
        assert_eq!(selector, "li:nth-child(2)");
        assert_eq!(doc.query_selector(doc.root(), &selector).unwrap(), Some(second));
    }

    #[test]
    fn duplicate_ids_are_not_used_as_anchors() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        el(&doc, body, "p", &[("id", "dup")]);
        let second = el(&doc, body, "p", &[("id", "dup")]);
        let selector = unique_selector(&doc, second).unwrap();
        assert!(!selector.contains("#dup"), "{selector}");
        assert_eq!(doc.query_selector(doc.root(), &selector).unwrap(), Some(second));
    }

    #[test]
    fn selector_path_crosses_shadow_roots() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        let host = el(&doc, body, "fancy-card", &[("id", "card")]);
        let root = doc.attach_shadow(host, ShadowRootMode::Open).unwrap();
        let button = el(&doc, root, "button", &[("class", "primary")]);

        let path = selector_path(&doc, button).unwrap();
        assert_eq!(path, SelectorPath::new(["#card", "button.primary"]));
        assert_eq!(doc.query_selector_path(&path).unwrap(), Some(button));
        assert_eq!(path.to_string(), "#card >>> button.primary");
    }

    #[test]
    fn selector_path_serializes_as_plain_array() {
        let path = SelectorPath::new(["#container", ".widget"]);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r##"["#container",".widget"]"##);
    }
}
