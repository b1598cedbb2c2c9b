//! Mutation Observer
//!
//! The tree owns a single observer. Structural changes inside the observed
//! scope are queued as records until the owner takes them.

use crate::NodeId;

/// Mutation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            old_value: None,
        }
    }

    pub fn attribute(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: Some(name.to_string()),
            old_value,
        }
    }

    pub fn with_siblings(mut self, previous: Option<NodeId>, next: Option<NodeId>) -> Self {
        self.previous_sibling = previous;
        self.next_sibling = next;
        self
    }
}

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// `{ childList: true, subtree: true }`
    pub fn child_list_subtree() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Default::default()
        }
    }

    /// Whether a record of this shape should be queued
    pub fn accepts(&self, record: &MutationRecord) -> bool {
        match record.mutation_type {
            MutationType::ChildList => self.child_list,
            MutationType::Attributes => {
                if !self.attributes {
                    return false;
                }
                match (&self.attribute_filter, &record.attribute_name) {
                    (Some(filter), Some(name)) => filter.iter().any(|f| f == name),
                    _ => true,
                }
            }
        }
    }
}

/// Mutation observer
#[derive(Debug, Default)]
pub struct MutationObserver {
    target: Option<NodeId>,
    options: MutationObserverInit,
    records: Vec<MutationRecord>,
}

impl MutationObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing `target`; replaces any previous observation
    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) {
        self.target = Some(target);
        self.options = options;
    }

    /// Stop observing and drop queued records
    pub fn disconnect(&mut self) {
        self.target = None;
        self.records.clear();
    }

    pub fn is_observing(&self) -> bool {
        self.target.is_some()
    }

    pub fn observation(&self) -> Option<(NodeId, &MutationObserverInit)> {
        self.target.map(|t| (t, &self.options))
    }

    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn push_record(&mut self, mut record: MutationRecord) {
        if !self.options.attribute_old_value {
            record.old_value = None;
        }
        self.records.push(record);
    }

    pub fn has_pending(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.records.len()
    }
}
