//! Change-notifying stores.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type StoreListener = Rc<dyn Fn()>;

/// Ends a store subscription when dropped or on [`Subscription::unsubscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Read side of a store: current state plus change notifications.
pub trait BaseStore<T> {
    /// `None` until the store has been initialised.
    fn get_state(&self) -> Option<T>;

    fn subscribe(&self, listener: StoreListener) -> Subscription;
}

struct StoreInner<T> {
    state: Option<T>,
    next_id: u64,
    listeners: Vec<(u64, StoreListener)>,
}

/// In-memory store. Clones share the same state.
pub struct SimpleStore<T> {
    inner: Rc<RefCell<StoreInner<T>>>,
}

impl<T> Clone for SimpleStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for SimpleStore<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Clone + 'static> SimpleStore<T> {
    pub fn empty() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                state: None,
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn new(state: T) -> Self {
        let store = Self::empty();
        store.inner.borrow_mut().state = Some(state);
        store
    }

    pub fn set_state(&self, state: T) {
        self.inner.borrow_mut().state = Some(state);
        self.notify();
    }

    /// Mutate the current state in place; no-op (and no notification) while
    /// the store is uninitialised.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            match inner.state.as_mut() {
                Some(state) => f(state),
                None => return false,
            }
        }
        self.notify();
        true
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    fn notify(&self) {
        let listeners: Vec<StoreListener> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

impl<T: Clone + 'static> BaseStore<T> for SimpleStore<T> {
    fn get_state(&self) -> Option<T> {
        self.inner.borrow().state.clone()
    }

    fn subscribe(&self, listener: StoreListener) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.listeners.push((id, listener));
            id
        };
        let weak: Weak<RefCell<StoreInner<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().listeners.retain(|(i, _)| *i != id);
            }
        })
    }
}
