//! Mouse events and document-level listener registration.

use std::fmt;
use std::rc::Rc;

use crate::geometry::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    MouseMove,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::MouseMove => "mousemove",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mouse event delivered to document listeners.
#[derive(Clone, Debug, PartialEq)]
pub struct MouseEvent {
    pub kind: EventKind,
    pub client_x: f32,
    pub client_y: f32,
}

impl MouseEvent {
    pub fn click(x: f32, y: f32) -> Self {
        Self {
            kind: EventKind::Click,
            client_x: x,
            client_y: y,
        }
    }

    pub fn mouse_move(x: f32, y: f32) -> Self {
        Self {
            kind: EventKind::MouseMove,
            client_x: x,
            client_y: y,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.client_x, self.client_y)
    }
}

pub type EventListener = Rc<dyn Fn(&MouseEvent)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(EventKind, ListenerId, EventListener)>,
}

impl ListenerRegistry {
    pub(crate) fn add(&mut self, kind: EventKind, listener: EventListener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push((kind, id, listener));
        id
    }

    pub(crate) fn remove(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, i, _)| !(*k == kind && *i == id));
        self.entries.len() != before
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.entries.iter().filter(|(k, _, _)| *k == kind).count()
    }

    /// Listeners for `kind` in registration order, cloned so dispatch can run
    /// without holding the registry borrow.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<(ListenerId, EventListener)> {
        self.entries
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, id, listener)| (*id, listener.clone()))
            .collect()
    }

    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        self.entries.iter().any(|(_, i, _)| *i == id)
    }
}
