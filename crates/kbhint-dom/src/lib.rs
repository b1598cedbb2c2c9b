//! kbhint DOM - host page model
//!
//! Arena-based document tree the overlay engine draws on. Node ids carry a
//! slot generation, so an id held after its node was destroyed never
//! resolves to a different node.

mod node;
mod tree;
mod document;
mod error;
mod window;
mod page;
pub mod selector;
pub mod geometry;
pub mod observer;
pub mod events;

pub use node::{Attribute, ElementData, InlineStyle, Node, NodeData};
pub use tree::DomTree;
pub use document::{Document, ReadyState};
pub use error::{DomError, DomResult};
pub use selector::{SelectorError, SelectorList};
pub use geometry::DOMRect;
pub use observer::{MutationObserver, MutationObserverInit, MutationRecord, MutationType};
pub use events::{Event, EventKind, EventTarget, ListenerId};
pub use window::{ScrollOffset, VisibilityState, Window};
pub use page::Page;

/// Node identifier (arena slot + slot generation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Document node ID
    pub const ROOT: NodeId = NodeId { index: 0, generation: 0 };

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId { index: u32::MAX, generation: 0 };

    pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.index != u32::MAX
    }
}
