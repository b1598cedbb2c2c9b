//! Mutation watcher
//!
//! Decides whether a batch of child-list records touched anything a site
//! module cares about. Scanning stops at the first relevant record.

use kbhint_dom::{
    Document, DomTree, MutationObserverInit, MutationRecord, MutationType, NodeId, SelectorList,
};

#[derive(Debug)]
pub struct MutationWatcher {
    /// `None` when the configured selector failed to parse: nothing is relevant
    relevance: Option<SelectorList>,
    bound: bool,
}

impl MutationWatcher {
    pub fn new(relevance_selector: &str) -> Self {
        let relevance = match SelectorList::parse(relevance_selector) {
            Ok(list) => Some(list),
            Err(e) => {
                tracing::warn!(
                    "invalid relevance selector {:?}: {}; mutations will be ignored",
                    relevance_selector,
                    e
                );
                None
            }
        };
        Self { relevance, bound: false }
    }

    /// Observe child-list changes under the document element
    pub fn bind(&mut self, doc: &mut Document) {
        let target = doc.document_element();
        doc.tree_mut().observe(target, MutationObserverInit::child_list_subtree());
        self.bound = true;
    }

    pub fn unbind(&mut self, doc: &mut Document) {
        doc.tree_mut().disconnect_observer();
        self.bound = false;
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Node is an element that matches, or contains a match
    pub fn is_relevant(&self, tree: &DomTree, node: NodeId) -> bool {
        self.relevance
            .as_ref()
            .is_some_and(|list| list.matches_or_contains(tree, node))
    }

    /// True if any child-list record added a relevant node or targets one
    pub fn scan(&self, tree: &DomTree, records: &[MutationRecord]) -> bool {
        for (i, record) in records.iter().enumerate() {
            if record.mutation_type != MutationType::ChildList {
                continue;
            }
            let relevant = record.added_nodes.iter().any(|&n| self.is_relevant(tree, n))
                || self.is_relevant(tree, record.target);
            tracing::trace!("mutation on {:?} relevant: {}", record.target, relevant);
            if relevant {
                tracing::debug!("relevant mutation at record {} of {}", i + 1, records.len());
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RELEVANCE_SELECTOR;

    fn watched_doc() -> (Document, MutationWatcher) {
        let mut doc = Document::new("https://web.whatsapp.com/");
        let mut watcher = MutationWatcher::new(DEFAULT_RELEVANCE_SELECTOR);
        watcher.bind(&mut doc);
        (doc, watcher)
    }

    #[test]
    fn test_irrelevant_mutation() {
        let (mut doc, watcher) = watched_doc();
        let body = doc.body();
        let div = doc.tree_mut().create_element("div");
        doc.tree_mut().append_child(body, div).unwrap();
        let records = doc.tree_mut().take_records();
        assert_eq!(records.len(), 1);
        assert!(!watcher.scan(doc.tree(), &records));
    }

    #[test]
    fn test_added_subtree_containing_match() {
        let (mut doc, watcher) = watched_doc();
        let body = doc.body();
        let wrapper = doc.tree_mut().create_element("div");
        let icon = doc.tree_mut().create_element("span");
        doc.tree_mut().set_attribute(icon, "data-icon", "search-refreshed").unwrap();
        doc.tree_mut().append_child(wrapper, icon).unwrap();
        doc.tree_mut().append_child(body, wrapper).unwrap();

        let records = doc.tree_mut().take_records();
        assert!(watcher.scan(doc.tree(), &records));
    }

    #[test]
    fn test_target_inside_relevant_node() {
        let (mut doc, watcher) = watched_doc();
        let body = doc.body();
        let header = doc.tree_mut().create_element("header");
        doc.tree_mut().append_child(body, header).unwrap();
        doc.tree_mut().take_records();

        let text = doc.tree_mut().create_text("chat name");
        doc.tree_mut().append_child(header, text).unwrap();
        let records = doc.tree_mut().take_records();
        assert!(watcher.scan(doc.tree(), &records));
    }

    #[test]
    fn test_invalid_selector_never_relevant() {
        let mut doc = Document::new("https://example.com/");
        let mut watcher = MutationWatcher::new("header:has(button)");
        watcher.bind(&mut doc);
        let body = doc.body();
        let header = doc.tree_mut().create_element("header");
        doc.tree_mut().append_child(body, header).unwrap();
        let records = doc.tree_mut().take_records();
        assert!(!watcher.scan(doc.tree(), &records));
    }

    #[test]
    fn test_unbind_stops_records() {
        let (mut doc, mut watcher) = watched_doc();
        watcher.unbind(&mut doc);
        assert!(!watcher.is_bound());
        let body = doc.body();
        let header = doc.tree_mut().create_element("header");
        doc.tree_mut().append_child(body, header).unwrap();
        assert!(doc.tree_mut().take_records().is_empty());
    }
}
