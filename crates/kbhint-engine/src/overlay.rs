//! Overlay store
//!
//! Sole owner of generic overlay nodes. One entry per anchor, keyed by the
//! anchor's `NodeId`; because ids are generational an entry whose anchor was
//! destroyed simply stops resolving and is pruned on the next reposition.

use std::collections::BTreeMap;

use kbhint_dom::{Document, DomError, DomResult, NodeId, Page, SelectorList};

use crate::contrast::{apply_palette, palette_for};
use crate::position::place;
use crate::{EngineConfig, HintPosition};

pub const OVERLAY_STYLE_ID: &str = "kbhint-overlay-styles";
pub const OVERLAY_CLASS: &str = "kbhint-overlay";

const OVERLAY_CSS: &str = ".kbhint-overlay {
  position: absolute;
  pointer-events: none;
  font-family: inherit;
  font-size: 12px;
  line-height: 1.4;
  font-weight: 600;
  padding: 3px 8px;
  border-radius: 6px;
  white-space: nowrap;
  z-index: 2147483646;
  transform: translateX(-50%);
  backdrop-filter: blur(8px);
}";

/// Insert a `<style id=..>` into the head unless one with that id exists
pub fn ensure_stylesheet(doc: &mut Document, id: &str, css: &str) -> DomResult<NodeId> {
    if let Some(existing) = doc.get_element_by_id(id) {
        return Ok(existing);
    }
    let head = doc.head();
    let tree = doc.tree_mut();
    let style = tree.create_element("style");
    tree.set_attribute(style, "id", id)?;
    tree.set_text_content(style, css)?;
    tree.append_child(head, style)?;
    tracing::debug!("inserted stylesheet #{}", id);
    Ok(style)
}

/// State for one rendered overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEntry {
    anchor: NodeId,
    text: String,
    position: HintPosition,
    node: NodeId,
}

impl OverlayEntry {
    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> HintPosition {
        self.position
    }

    /// The overlay element
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Outcome of one reposition pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositionReport {
    pub positioned: usize,
    pub pruned: usize,
    pub reattached: usize,
}

#[derive(Debug, Default)]
pub struct OverlayStore {
    entries: BTreeMap<NodeId, OverlayEntry>,
    reposition_requested: bool,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, anchor: NodeId) -> Option<&OverlayEntry> {
        self.entries.get(&anchor)
    }

    pub fn entries(&self) -> impl Iterator<Item = &OverlayEntry> {
        self.entries.values()
    }

    /// Whether a render since the last call wants a batched reposition
    pub fn take_reposition_request(&mut self) -> bool {
        std::mem::take(&mut self.reposition_requested)
    }

    /// Create or update the overlay for `anchor`.
    ///
    /// Returns `None` when the anchor is not connected; any overlay it had
    /// is removed instead of positioned.
    pub fn render_for_element(
        &mut self,
        page: &mut Page,
        anchor: NodeId,
        text: &str,
        position: HintPosition,
        config: &EngineConfig,
    ) -> DomResult<Option<NodeId>> {
        if !page.tree().is_element(anchor) {
            return Err(DomError::NotAnElement(anchor));
        }
        ensure_stylesheet(&mut page.document, OVERLAY_STYLE_ID, OVERLAY_CSS)?;

        let existing = self
            .entries
            .get(&anchor)
            .map(|e| e.node)
            .filter(|&n| page.tree().is_alive(n));
        let node = match existing {
            Some(node) => {
                if let Some(entry) = self.entries.get_mut(&anchor) {
                    entry.text = text.to_string();
                    entry.position = position;
                }
                page.tree_mut().set_text_content(node, text)?;
                node
            }
            None => {
                let node = create_overlay_node(page, text)?;
                tracing::debug!("created overlay {:?} for anchor {:?}", node, anchor);
                self.entries.insert(
                    anchor,
                    OverlayEntry {
                        anchor,
                        text: text.to_string(),
                        position,
                        node,
                    },
                );
                node
            }
        };

        self.reposition_requested = true;
        if self.position_entry(page, anchor, config)? {
            Ok(Some(node))
        } else {
            Ok(None)
        }
    }

    /// Render for every element under `root` (or the whole document) that
    /// matches `selector`. Per-element failures are skipped; returns how
    /// many overlays are showing afterwards.
    pub fn render_for_selector(
        &mut self,
        page: &mut Page,
        selector: &str,
        text: &str,
        position: HintPosition,
        root: Option<NodeId>,
        config: &EngineConfig,
    ) -> usize {
        let list = match SelectorList::parse(selector) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("skipping hint with invalid selector {:?}: {}", selector, e);
                return 0;
            }
        };

        let scope = root.unwrap_or_else(|| page.tree().root());
        let matches: Vec<NodeId> = page
            .tree()
            .descendants(scope)
            .into_iter()
            .filter(|&n| list.matches(page.tree(), n))
            .collect();

        let mut rendered = 0;
        for anchor in matches {
            match self.render_for_element(page, anchor, text, position, config) {
                Ok(Some(_)) => rendered += 1,
                Ok(None) => {}
                Err(e) => tracing::debug!("overlay for {:?} skipped: {}", anchor, e),
            }
        }
        rendered
    }

    /// Remove overlays whose anchors currently match `selector`
    pub fn remove_for_selector(&mut self, page: &mut Page, selector: &str) -> usize {
        let list = match SelectorList::parse(selector) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("cannot remove overlays for invalid selector {:?}: {}", selector, e);
                return 0;
            }
        };
        let doomed: Vec<NodeId> = self
            .entries
            .keys()
            .copied()
            .filter(|&a| list.matches(page.tree(), a))
            .collect();
        for anchor in &doomed {
            self.remove(page, *anchor);
        }
        doomed.len()
    }

    /// Remove one anchor's overlay
    pub fn remove(&mut self, page: &mut Page, anchor: NodeId) -> bool {
        match self.entries.remove(&anchor) {
            Some(entry) => {
                destroy_overlay_node(page, entry.node);
                true
            }
            None => false,
        }
    }

    /// Detach every owned node and forget all entries
    pub fn remove_all(&mut self, page: &mut Page) {
        let count = self.entries.len();
        for (_, entry) in std::mem::take(&mut self.entries) {
            destroy_overlay_node(page, entry.node);
        }
        self.reposition_requested = false;
        if count > 0 {
            tracing::debug!("removed {} overlays", count);
        }
    }

    /// Restyle and re-place every live overlay; prune the ones whose anchor
    /// left the document
    pub fn reposition_all(&mut self, page: &mut Page, config: &EngineConfig) -> RepositionReport {
        let mut report = RepositionReport::default();
        let anchors: Vec<NodeId> = self.entries.keys().copied().collect();

        for anchor in anchors {
            if !page.tree().is_connected(anchor) {
                self.remove(page, anchor);
                report.pruned += 1;
                continue;
            }
            match self.reattach(page, anchor) {
                Ok(true) => report.reattached += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("could not re-attach overlay for {:?}: {}", anchor, e);
                    continue;
                }
            }
            match self.position_entry(page, anchor, config) {
                Ok(true) => report.positioned += 1,
                Ok(false) => report.pruned += 1,
                Err(e) => tracing::warn!("could not position overlay for {:?}: {}", anchor, e),
            }
        }

        if report.pruned > 0 || report.reattached > 0 {
            tracing::debug!(
                "reposition: {} placed, {} pruned, {} re-attached",
                report.positioned,
                report.pruned,
                report.reattached
            );
        }
        report
    }

    /// Put back an overlay node the host page detached or destroyed
    fn reattach(&mut self, page: &mut Page, anchor: NodeId) -> DomResult<bool> {
        let Some(entry) = self.entries.get_mut(&anchor) else {
            return Ok(false);
        };
        if !page.tree().is_alive(entry.node) {
            entry.node = create_overlay_node(page, &entry.text)?;
            return Ok(true);
        }
        if !page.tree().is_connected(entry.node) {
            let body = page.document.body();
            page.tree_mut().append_child(body, entry.node)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Style + place one entry. A detached anchor drops the entry.
    fn position_entry(&mut self, page: &mut Page, anchor: NodeId, config: &EngineConfig) -> DomResult<bool> {
        let Some((node, position)) = self.entries.get(&anchor).map(|e| (e.node, e.position)) else {
            return Ok(false);
        };
        if !page.tree().is_connected(anchor) {
            self.remove(page, anchor);
            return Ok(false);
        }

        let palette = palette_for(&page.document, &page.window, anchor, config);
        apply_palette(page.tree_mut(), node, &palette)?;

        let rect = page.document.bounding_client_rect(anchor);
        place(rect, page.window.scroll, position, config).apply(page.tree_mut(), node)?;
        Ok(true)
    }
}

fn create_overlay_node(page: &mut Page, text: &str) -> DomResult<NodeId> {
    let body = page.document.body();
    let tree = page.tree_mut();
    let node = tree.create_element("div");
    tree.set_attribute(node, "class", OVERLAY_CLASS)?;
    tree.set_text_content(node, text)?;
    tree.set_style(node, "visibility", "hidden")?;
    tree.append_child(body, node)?;
    Ok(node)
}

fn destroy_overlay_node(page: &mut Page, node: NodeId) {
    if page.tree().is_alive(node) {
        if let Err(e) = page.tree_mut().destroy(node) {
            tracing::debug!("overlay node {:?} already gone: {}", node, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbhint_dom::DOMRect;

    fn page_with_anchor() -> (Page, NodeId) {
        let mut page = Page::new("https://example.com/");
        let body = page.document.body();
        let anchor = page.tree_mut().create_element("input");
        page.tree_mut().append_child(body, anchor).unwrap();
        page.document
            .set_layout_rect(anchor, DOMRect::from_xywh(100.0, 20.0, 200.0, 30.0))
            .unwrap();
        (page, anchor)
    }

    fn overlay_count(page: &Page) -> usize {
        page.document.query_selector_all(".kbhint-overlay").unwrap().len()
    }

    #[test]
    fn test_render_is_idempotent() {
        let (mut page, anchor) = page_with_anchor();
        let mut store = OverlayStore::new();
        let config = EngineConfig::default();

        let first = store
            .render_for_element(&mut page, anchor, "Ctrl + K", HintPosition::BelowCenter, &config)
            .unwrap();
        let second = store
            .render_for_element(&mut page, anchor, "/", HintPosition::BelowRight, &config)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(overlay_count(&page), 1);
        let entry = store.get(anchor).unwrap();
        assert_eq!(entry.text(), "/");
        assert_eq!(entry.position(), HintPosition::BelowRight);
        assert_eq!(page.tree().text_content(entry.node()), "/");
        assert_eq!(page.tree().style(entry.node(), "left"), Some("292px"));
        assert_eq!(page.tree().style(entry.node(), "top"), Some("54px"));
        assert_eq!(page.tree().style(entry.node(), "visibility"), Some("visible"));
    }

    #[test]
    fn test_stylesheet_inserted_once() {
        let (mut page, anchor) = page_with_anchor();
        let mut store = OverlayStore::new();
        let config = EngineConfig::default();
        for _ in 0..3 {
            store
                .render_for_element(&mut page, anchor, "/", HintPosition::BelowCenter, &config)
                .unwrap();
        }
        let styles = page.document.query_selector_all("head > style").unwrap();
        assert_eq!(styles.len(), 1);
        assert!(store.take_reposition_request());
        assert!(!store.take_reposition_request());
    }

    #[test]
    fn test_detached_anchor_is_not_positioned() {
        let mut page = Page::new("https://example.com/");
        let floating = page.tree_mut().create_element("div");
        let mut store = OverlayStore::new();
        let rendered = store
            .render_for_element(&mut page, floating, "/", HintPosition::BelowCenter, &EngineConfig::default())
            .unwrap();
        assert_eq!(rendered, None);
        assert!(store.is_empty());
        assert_eq!(overlay_count(&page), 0);
    }

    #[test]
    fn test_non_element_anchor_rejected() {
        let mut page = Page::new("https://example.com/");
        let text = page.tree_mut().create_text("hi");
        let mut store = OverlayStore::new();
        assert_eq!(
            store.render_for_element(&mut page, text, "/", HintPosition::BelowCenter, &EngineConfig::default()),
            Err(DomError::NotAnElement(text))
        );
    }

    #[test]
    fn test_render_for_selector_and_remove() {
        let (mut page, anchor) = page_with_anchor();
        let body = page.document.body();
        let other = page.tree_mut().create_element("input");
        page.tree_mut().append_child(body, other).unwrap();
        let mut store = OverlayStore::new();
        let config = EngineConfig::default();

        assert_eq!(
            store.render_for_selector(&mut page, "input", "/", HintPosition::BelowLeft, None, &config),
            2
        );
        assert_eq!(
            store.render_for_selector(&mut page, "input:focus", "/", HintPosition::BelowLeft, None, &config),
            0
        );
        assert_eq!(overlay_count(&page), 2);

        page.tree_mut().set_attribute(other, "name", "q").unwrap();
        assert_eq!(store.remove_for_selector(&mut page, "input[name=q]"), 1);
        assert!(store.get(anchor).is_some());

        store.remove_all(&mut page);
        assert!(store.is_empty());
        assert_eq!(overlay_count(&page), 0);
    }

    #[test]
    fn test_reposition_prunes_stale_anchor() {
        let (mut page, anchor) = page_with_anchor();
        let mut store = OverlayStore::new();
        let config = EngineConfig::default();
        store
            .render_for_element(&mut page, anchor, "/", HintPosition::BelowCenter, &config)
            .unwrap();

        page.tree_mut().destroy(anchor).unwrap();
        let report = store.reposition_all(&mut page, &config);
        assert_eq!(report.pruned, 1);
        assert_eq!(report.positioned, 0);
        assert!(store.is_empty());
        assert_eq!(overlay_count(&page), 0);
    }

    #[test]
    fn test_reposition_reattaches_overlay() {
        let (mut page, anchor) = page_with_anchor();
        let mut store = OverlayStore::new();
        let config = EngineConfig::default();
        let node = store
            .render_for_element(&mut page, anchor, "/", HintPosition::BelowCenter, &config)
            .unwrap()
            .unwrap();

        page.tree_mut().detach(node).unwrap();
        let report = store.reposition_all(&mut page, &config);
        assert_eq!(report.reattached, 1);
        assert!(page.tree().is_connected(node));

        page.tree_mut().destroy(node).unwrap();
        let report = store.reposition_all(&mut page, &config);
        assert_eq!(report.reattached, 1);
        assert_eq!(overlay_count(&page), 1);
        assert_ne!(store.get(anchor).unwrap().node(), node);
    }

    #[test]
    fn test_reposition_follows_scroll() {
        let (mut page, anchor) = page_with_anchor();
        let mut store = OverlayStore::new();
        let config = EngineConfig::default();
        let node = store
            .render_for_element(&mut page, anchor, "/", HintPosition::BelowCenter, &config)
            .unwrap()
            .unwrap();

        page.window.scroll_to(0.0, 500.0);
        page.document
            .set_layout_rect(anchor, DOMRect::from_xywh(100.0, -480.0, 200.0, 30.0))
            .unwrap();
        store.reposition_all(&mut page, &config);
        assert_eq!(page.tree().style(node, "top"), Some("54px"));
    }
}
