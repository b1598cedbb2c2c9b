//! Page - document + window + event listeners

use std::rc::Rc;

use crate::events::{Listener, Registration};
use crate::{DomTree, Document, Event, EventKind, EventTarget, ListenerId, NodeId, Window};

/// A loaded page as seen by content code
#[derive(Debug)]
pub struct Page {
    pub document: Document,
    pub window: Window,
    listeners: Vec<Registration>,
    next_listener: u64,
}

impl Page {
    pub fn new(url: &str) -> Self {
        Self::from_document(Document::new(url))
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            document,
            window: Window::default(),
            listeners: Vec::new(),
            next_listener: 1,
        }
    }

    pub fn hostname(&self) -> &str {
        self.document.hostname()
    }

    pub fn tree(&self) -> &DomTree {
        self.document.tree()
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        self.document.tree_mut()
    }

    /// Register a listener; the returned id removes it again
    pub fn add_event_listener<F>(&mut self, target: EventTarget, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&mut Page, &Event) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Registration {
            id,
            kind,
            target,
            callback: Rc::new(callback),
        });
        id
    }

    /// Returns false if the id was unknown
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|r| r.id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Run every listener that hears the event, in registration order.
    ///
    /// The matching set is fixed before the first callback runs, so
    /// listeners added during dispatch only see later events. Listeners
    /// removed during dispatch are skipped.
    pub fn dispatch(&mut self, event: Event) -> usize {
        let hearing: Vec<(ListenerId, Listener)> = self
            .listeners
            .iter()
            .filter(|r| r.hears(&event))
            .map(|r| (r.id, Rc::clone(&r.callback)))
            .collect();

        let mut delivered = 0;
        for (id, callback) in hearing {
            if !self.listeners.iter().any(|r| r.id == id) {
                continue;
            }
            callback(self, &event);
            delivered += 1;
        }
        delivered
    }

    /// Move focus, firing blur on the old element and focus on the new one
    pub fn focus(&mut self, element: Option<NodeId>) {
        let previous = self.window.active_element;
        if previous == element {
            return;
        }
        self.window.active_element = element;
        if let Some(old) = previous {
            self.dispatch(Event::new(EventKind::Blur, EventTarget::Node(old)));
        }
        if let Some(new) = element {
            self.dispatch(Event::new(EventKind::Focus, EventTarget::Node(new)));
        }
    }
}
