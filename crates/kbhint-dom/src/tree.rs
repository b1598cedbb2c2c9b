//! DOM Tree (arena-based allocation)
//!
//! Slots are reused after `destroy`; each reuse bumps the slot generation so
//! outstanding `NodeId`s to the old node stop resolving.

use crate::observer::{MutationObserver, MutationObserverInit, MutationRecord};
use crate::{DomError, DomResult, ElementData, Node, NodeData, NodeId};

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    observer: MutationObserver,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::document()),
            }],
            free: Vec::new(),
            live: 1,
            observer: MutationObserver::new(),
        }
    }

    /// Document node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::from_raw_parts(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::from_raw_parts(index, 0)
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.alloc(Node::comment(content))
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    /// Whether `id` still refers to a live node
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes (document included)
    pub fn len(&self) -> usize {
        self.live
    }

    /// True when only the document node exists
    pub fn is_empty(&self) -> bool {
        self.live <= 1
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id)?.as_element()
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id)?.as_element_mut()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.get(id)?.parent;
        parent.is_valid().then_some(parent)
    }

    /// Parent if it is an element (the document node is not)
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    /// Child ids in document order
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Children { tree: self, next }
    }

    /// Strict ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Strict descendants in preorder
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        while let Some(node) = stack.pop() {
            out.push(node);
            let start = stack.len();
            stack.extend(self.children(node));
            stack[start..].reverse();
        }
        out
    }

    /// Inclusive containment: `node` is `ancestor` or lies below it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.is_alive(ancestor) || !self.is_alive(node) {
            return false;
        }
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether the node is attached to the document
    pub fn is_connected(&self, id: NodeId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        id == NodeId::ROOT || self.ancestors(id).last() == Some(NodeId::ROOT)
    }

    // ---------------------------------------------------------------------
    // Structure mutation
    // ---------------------------------------------------------------------

    /// Append a child node (moving it if already attached)
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or at the end)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        if !self.node(parent)?.is_container() {
            return Err(DomError::HierarchyRequest);
        }
        if self.node(child)?.is_document() {
            return Err(DomError::InvalidNodeType);
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(r) = reference {
            if self.node(r)?.parent != parent {
                return Err(DomError::NotAChild { parent, child: r });
            }
            if r == child {
                return Ok(child);
            }
        }

        if self.node(child)?.parent.is_valid() {
            self.detach(child)?;
        }

        let next = reference.unwrap_or(NodeId::NONE);
        let prev = match reference {
            Some(r) => self.node(r)?.prev_sibling,
            None => self.node(parent)?.last_child,
        };

        {
            let node = self.node_mut(child)?;
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        if prev.is_valid() {
            self.node_mut(prev)?.next_sibling = child;
        } else {
            self.node_mut(parent)?.first_child = child;
        }
        if next.is_valid() {
            self.node_mut(next)?.prev_sibling = child;
        } else {
            self.node_mut(parent)?.last_child = child;
        }

        self.queue_record(
            MutationRecord::child_list(parent, vec![child], Vec::new())
                .with_siblings(prev.is_valid().then_some(prev), next.is_valid().then_some(next)),
        );
        Ok(child)
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.node(child)?.parent != parent {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child)?;
        Ok(child)
    }

    /// Detach a node from its parent; detached nodes stay alive
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        let (parent, prev, next) = {
            let node = self.node(id)?;
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return Ok(());
        }

        if prev.is_valid() {
            self.node_mut(prev)?.next_sibling = next;
        } else {
            self.node_mut(parent)?.first_child = next;
        }
        if next.is_valid() {
            self.node_mut(next)?.prev_sibling = prev;
        } else {
            self.node_mut(parent)?.last_child = prev;
        }
        {
            let node = self.node_mut(id)?;
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }

        self.queue_record(
            MutationRecord::child_list(parent, Vec::new(), vec![id])
                .with_siblings(prev.is_valid().then_some(prev), next.is_valid().then_some(next)),
        );
        Ok(())
    }

    /// Detach a node and free its whole subtree
    pub fn destroy(&mut self, id: NodeId) -> DomResult<()> {
        if self.node(id)?.is_document() {
            return Err(DomError::InvalidNodeType);
        }
        self.detach(id)?;

        let mut doomed = self.descendants(id);
        doomed.push(id);
        for node in doomed {
            let slot = &mut self.slots[node.index() as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index());
            self.live -= 1;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Content
    // ---------------------------------------------------------------------

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(t)) | Some(NodeData::Comment(t)) => t.clone(),
            Some(_) => self
                .descendants(id)
                .into_iter()
                .filter_map(|d| self.get(d).and_then(|n| n.as_text()))
                .collect(),
            None => String::new(),
        }
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(t) | NodeData::Comment(t) => {
                *t = text.to_string();
                return Ok(());
            }
            NodeData::Document => return Err(DomError::InvalidNodeType),
            NodeData::Element(_) => {}
        }
        let old: Vec<NodeId> = self.children(id).collect();
        for child in old {
            self.destroy(child)?;
        }
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Attributes, classes, inline style
    // ---------------------------------------------------------------------

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.get_attr(name)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let element = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        let old = element.set_attr(name, value);
        self.queue_record(MutationRecord::attribute(id, name, old));
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        let element = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        if let Some(old) = element.remove_attr(name) {
            self.queue_record(MutationRecord::attribute(id, name, Some(old)));
        }
        Ok(())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_class(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        let element = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        let old = element.get_attr("class").map(str::to_string);
        if element.add_class(class) {
            self.queue_record(MutationRecord::attribute(id, "class", old));
        }
        Ok(())
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        let element = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        let old = element.get_attr("class").map(str::to_string);
        if element.remove_class(class) {
            self.queue_record(MutationRecord::attribute(id, "class", old));
        }
        Ok(())
    }

    /// Inline style value
    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.element(id)?.style.get(property)
    }

    /// Set an inline style property (empty value removes it)
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) -> DomResult<()> {
        let element = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        element.style.set(property, value);
        Ok(())
    }

    pub fn remove_style(&mut self, id: NodeId, property: &str) -> DomResult<()> {
        let element = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        element.style.remove(property);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Observation
    // ---------------------------------------------------------------------

    pub fn observe(&mut self, target: NodeId, options: MutationObserverInit) {
        self.observer.observe(target, options);
    }

    pub fn disconnect_observer(&mut self) {
        self.observer.disconnect();
    }

    pub fn observer(&self) -> &MutationObserver {
        &self.observer
    }

    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.observer.take_records()
    }

    fn queue_record(&mut self, record: MutationRecord) {
        let Some((target, options)) = self.observer.observation() else {
            return;
        };
        let in_scope = record.target == target || (options.subtree && self.contains(target, record.target));
        if in_scope && options.accepts(&record) {
            self.observer.push_record(record);
        }
    }
}

/// Iterator over a node's children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        self.next = self.tree.get(current).map(|n| n.next_sibling).unwrap_or(NodeId::NONE);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_list() -> (DomTree, NodeId, [NodeId; 3]) {
        let mut tree = DomTree::new();
        let ul = tree.create_element("ul");
        tree.append_child(tree.root(), ul).unwrap();
        let items = [
            tree.create_element("li"),
            tree.create_element("li"),
            tree.create_element("li"),
        ];
        for item in items {
            tree.append_child(ul, item).unwrap();
        }
        (tree, ul, items)
    }

    #[test]
    fn test_append_and_children_order() {
        let (tree, ul, items) = tree_with_list();
        let children: Vec<_> = tree.children(ul).collect();
        assert_eq!(children, items.to_vec());
        assert!(tree.is_connected(items[2]));
    }

    #[test]
    fn test_insert_before() {
        let (mut tree, ul, items) = tree_with_list();
        let first = tree.create_element("li");
        tree.insert_before(ul, first, Some(items[0])).unwrap();
        let children: Vec<_> = tree.children(ul).collect();
        assert_eq!(children[0], first);
        assert_eq!(children.len(), 4);
    }

    #[test]
    fn test_remove_middle_child() {
        let (mut tree, ul, items) = tree_with_list();
        tree.remove_child(ul, items[1]).unwrap();
        let children: Vec<_> = tree.children(ul).collect();
        assert_eq!(children, vec![items[0], items[2]]);
        assert!(!tree.is_connected(items[1]));
        assert!(tree.is_alive(items[1]));
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut tree, ul, items) = tree_with_list();
        assert_eq!(tree.append_child(items[0], ul), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn test_destroy_bumps_generation() {
        let (mut tree, ul, items) = tree_with_list();
        let before = tree.len();
        tree.destroy(ul).unwrap();
        assert_eq!(tree.len(), before - 4);
        assert!(tree.get(items[0]).is_none());

        // Reused slot must not resolve through the stale id
        let fresh = tree.create_element("p");
        assert!(tree.get(fresh).is_some());
        assert!(tree.get(ul).is_none());
        assert!(!tree.is_connected(ul));
    }

    #[test]
    fn test_text_content() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.append_child(tree.root(), div).unwrap();
        tree.set_text_content(div, "Ctrl + K").unwrap();
        assert_eq!(tree.text_content(div), "Ctrl + K");
        tree.set_text_content(div, "/").unwrap();
        assert_eq!(tree.text_content(div), "/");
        assert_eq!(tree.children(div).count(), 1);
    }

    #[test]
    fn test_records_in_scope_only() {
        let mut tree = DomTree::new();
        let watched = tree.create_element("main");
        let outside = tree.create_element("aside");
        tree.append_child(tree.root(), watched).unwrap();
        tree.append_child(tree.root(), outside).unwrap();
        tree.observe(watched, MutationObserverInit::child_list_subtree());

        let inner = tree.create_element("div");
        tree.append_child(watched, inner).unwrap();
        let other = tree.create_element("div");
        tree.append_child(outside, other).unwrap();
        tree.set_attribute(inner, "class", "x").unwrap();

        let records = tree.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, watched);
        assert_eq!(records[0].added_nodes, vec![inner]);
    }

    #[test]
    fn test_descendants_preorder() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        let d = tree.create_element("d");
        tree.append_child(tree.root(), a).unwrap();
        tree.append_child(a, b).unwrap();
        tree.append_child(b, c).unwrap();
        tree.append_child(a, d).unwrap();
        assert_eq!(tree.descendants(tree.root()), vec![a, b, c, d]);
    }
}
