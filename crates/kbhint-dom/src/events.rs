//! Page events
//!
//! Listeners live in a side table on the `Page` keyed by `ListenerId`, never
//! on the nodes themselves.

use std::fmt;
use std::rc::Rc;

use crate::{NodeId, Page};

/// Event kinds the overlay engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DomContentLoaded,
    VisibilityChange,
    PopState,
    HashChange,
    Scroll,
    Resize,
    Focus,
    Blur,
}

impl EventKind {
    /// DOM event type string
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::DomContentLoaded => "DOMContentLoaded",
            EventKind::VisibilityChange => "visibilitychange",
            EventKind::PopState => "popstate",
            EventKind::HashChange => "hashchange",
            EventKind::Scroll => "scroll",
            EventKind::Resize => "resize",
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
        }
    }

    /// Events that fire at high frequency while the user interacts
    pub fn is_high_frequency(&self) -> bool {
        matches!(self, EventKind::Scroll | EventKind::Resize)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an event was dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Document,
    Node(NodeId),
}

/// A dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub target: EventTarget,
}

impl Event {
    pub fn new(kind: EventKind, target: EventTarget) -> Self {
        Self { kind, target }
    }

    pub fn window(kind: EventKind) -> Self {
        Self::new(kind, EventTarget::Window)
    }

    pub fn document(kind: EventKind) -> Self {
        Self::new(kind, EventTarget::Document)
    }
}

/// Handle returned by `Page::add_event_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

pub type Listener = Rc<dyn Fn(&mut Page, &Event)>;

pub(crate) struct Registration {
    pub id: ListenerId,
    pub kind: EventKind,
    pub target: EventTarget,
    pub callback: Listener,
}

impl Registration {
    /// Window listeners hear every event of their kind, including events
    /// targeted at the document or a node
    pub fn hears(&self, event: &Event) -> bool {
        self.kind == event.kind && (self.target == EventTarget::Window || self.target == event.target)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
