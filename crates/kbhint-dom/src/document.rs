//! Document
//!
//! Owns the node tree plus the bits of browser state the overlay engine reads
//! from it: URL, ready state and a layout side table standing in for boxes
//! the host page has laid out.

use std::collections::HashMap;

use url::Url;

use crate::selector::{SelectorError, SelectorList};
use crate::{DOMRect, DomError, DomResult, DomTree, NodeId};

/// Document loading state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    #[default]
    Loading,
    Interactive,
    Complete,
}

/// HTML document
#[derive(Debug)]
pub struct Document {
    tree: DomTree,
    url: Option<Url>,
    html: NodeId,
    head: NodeId,
    body: NodeId,
    ready_state: ReadyState,
    layout: HashMap<NodeId, DOMRect>,
}

impl Document {
    /// Create `<html><head/><body/></html>` for the given URL.
    ///
    /// An unparseable URL leaves the document without a hostname.
    pub fn new(url: &str) -> Self {
        let mut doc = Self::empty();
        doc.set_url(url);
        doc
    }

    /// Document skeleton with no URL
    pub fn empty() -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");
        let root = tree.root();
        // Fresh nodes under the document node: insertion cannot fail
        let _ = tree.append_child(root, html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);
        Self {
            tree,
            url: None,
            html,
            head,
            body,
            ready_state: ReadyState::Loading,
            layout: HashMap::new(),
        }
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = match Url::parse(url) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!("ignoring unparseable document url {:?}: {}", url, e);
                None
            }
        };
    }

    /// `location.hash = hash`; no-op without a URL
    pub fn set_hash(&mut self, hash: &str) {
        if let Some(url) = self.url.as_mut() {
            let fragment = hash.trim_start_matches('#');
            url.set_fragment((!fragment.is_empty()).then_some(fragment));
        }
    }

    /// `location.hostname`
    pub fn hostname(&self) -> &str {
        self.url.as_ref().and_then(|u| u.host_str()).unwrap_or("")
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
    }

    pub fn document_element(&self) -> NodeId {
        self.html
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Connected element with this id, in document order
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|&n| self.tree.element(n).is_some_and(|e| e.id() == Some(id)))
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.query_selector_list(&list).into_iter().next())
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.query_selector_list(&list))
    }

    /// Matching connected elements in document order
    pub fn query_selector_list(&self, list: &SelectorList) -> Vec<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .filter(|&n| list.matches(&self.tree, n))
            .collect()
    }

    pub fn matches(&self, element: NodeId, selector: &str) -> Result<bool, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(list.matches(&self.tree, element))
    }

    /// Nearest inclusive ancestor matching the selector
    pub fn closest(&self, element: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(std::iter::once(element)
            .chain(self.tree.ancestors(element))
            .find(|&n| list.matches(&self.tree, n)))
    }

    // ---------------------------------------------------------------------
    // Layout and style
    // ---------------------------------------------------------------------

    /// Record the viewport-relative box the host laid out for an element
    pub fn set_layout_rect(&mut self, element: NodeId, rect: DOMRect) -> DomResult<()> {
        if !self.tree.is_element(element) {
            return Err(DomError::NotAnElement(element));
        }
        self.layout.insert(element, rect);
        Ok(())
    }

    /// `getBoundingClientRect()`; detached or unlaid-out elements are empty
    pub fn bounding_client_rect(&self, element: NodeId) -> DOMRect {
        if !self.tree.is_connected(element) {
            return DOMRect::default();
        }
        self.layout.get(&element).copied().unwrap_or_default()
    }

    /// Computed value of a property: the inline value, else the initial value
    pub fn computed_style(&self, element: NodeId, property: &str) -> String {
        if let Some(value) = self.tree.style(element, property) {
            return value.to_string();
        }
        initial_value(property).to_string()
    }

    /// Number of nodes with a recorded layout box
    pub fn layout_len(&self) -> usize {
        self.layout.len()
    }

    /// Drop layout entries for nodes that no longer exist
    pub fn prune_layout(&mut self) {
        let tree = &self.tree;
        self.layout.retain(|id, _| tree.is_alive(*id));
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

fn initial_value(property: &str) -> &'static str {
    match property {
        "background-color" => "rgba(0, 0, 0, 0)",
        "color" => "rgb(0, 0, 0)",
        "position" => "static",
        "overflow" => "visible",
        "display" => "block",
        "visibility" => "visible",
        "opacity" => "1",
        "transform" => "none",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_and_hostname() {
        let doc = Document::new("https://www.youtube.com/watch?v=abc");
        assert_eq!(doc.hostname(), "www.youtube.com");
        assert_eq!(doc.tree().parent(doc.body()), Some(doc.document_element()));
        assert_eq!(doc.tree().tag_name(doc.head()), Some("head"));

        let nowhere = Document::new("not a url");
        assert_eq!(nowhere.hostname(), "");
    }

    #[test]
    fn test_query_selector() {
        let mut doc = Document::new("https://web.whatsapp.com/");
        let body = doc.body();
        let header = doc.tree_mut().create_element("header");
        let input = doc.tree_mut().create_element("div");
        doc.tree_mut().append_child(body, header).unwrap();
        doc.tree_mut().append_child(header, input).unwrap();
        doc.tree_mut().set_attribute(input, "role", "textbox").unwrap();
        doc.tree_mut().set_attribute(input, "id", "q").unwrap();

        assert_eq!(doc.query_selector("header [role=textbox]").unwrap(), Some(input));
        assert_eq!(doc.query_selector_all("header, div").unwrap(), vec![header, input]);
        assert_eq!(doc.get_element_by_id("q"), Some(input));
        assert_eq!(doc.closest(input, "header").unwrap(), Some(header));
        assert!(doc.query_selector("div::before").is_err());
    }

    #[test]
    fn test_layout_side_table() {
        let mut doc = Document::new("https://example.com/");
        let body = doc.body();
        let el = doc.tree_mut().create_element("input");
        let rect = DOMRect::from_xywh(10.0, 20.0, 200.0, 30.0);
        doc.set_layout_rect(el, rect).unwrap();

        // Detached elements have no box
        assert_eq!(doc.bounding_client_rect(el), DOMRect::default());
        doc.tree_mut().append_child(body, el).unwrap();
        assert_eq!(doc.bounding_client_rect(el), rect);

        doc.tree_mut().destroy(el).unwrap();
        doc.prune_layout();
        assert_eq!(doc.layout_len(), 0);
    }

    #[test]
    fn test_computed_style_defaults() {
        let mut doc = Document::new("https://example.com/");
        let body = doc.body();
        assert_eq!(doc.computed_style(body, "background-color"), "rgba(0, 0, 0, 0)");
        doc.tree_mut().set_style(body, "background-color", "rgb(15, 15, 15)").unwrap();
        assert_eq!(doc.computed_style(body, "background-color"), "rgb(15, 15, 15)");
    }
}
