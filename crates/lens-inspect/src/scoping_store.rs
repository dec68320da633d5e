//! Include/exclude selector lists built by scoping clicks.

use std::fmt;

use lens_dom::SelectorPath;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{BaseStore, StoreListener, SimpleStore, Subscription};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopingSelectorKind {
    Include,
    Exclude,
}

impl fmt::Display for ScopingSelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScopingSelectorKind::Include => "include",
            ScopingSelectorKind::Exclude => "exclude",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopingStoreData {
    pub include: Vec<SelectorPath>,
    pub exclude: Vec<SelectorPath>,
}

impl ScopingStoreData {
    pub fn selectors(&self, kind: ScopingSelectorKind) -> &[SelectorPath] {
        match kind {
            ScopingSelectorKind::Include => &self.include,
            ScopingSelectorKind::Exclude => &self.exclude,
        }
    }

    fn selectors_mut(&mut self, kind: ScopingSelectorKind) -> &mut Vec<SelectorPath> {
        match kind {
            ScopingSelectorKind::Include => &mut self.include,
            ScopingSelectorKind::Exclude => &mut self.exclude,
        }
    }
}

/// Store of scoping selectors. Clones share state.
#[derive(Clone)]
pub struct ScopingStore {
    store: SimpleStore<ScopingStoreData>,
}

impl Default for ScopingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopingStore {
    pub fn new() -> Self {
        Self {
            store: SimpleStore::new(ScopingStoreData::default()),
        }
    }

    /// Returns `false` (and does not notify) when the path is already listed.
    pub fn add_selector(&self, kind: ScopingSelectorKind, path: SelectorPath) -> bool {
        let present = self
            .store
            .get_state()
            .is_some_and(|data| data.selectors(kind).contains(&path));
        if present {
            return false;
        }
        debug!(%kind, %path, "scoping selector added");
        self.store.update(|data| data.selectors_mut(kind).push(path))
    }

    pub fn delete_selector(&self, kind: ScopingSelectorKind, path: &SelectorPath) -> bool {
        let present = self
            .store
            .get_state()
            .is_some_and(|data| data.selectors(kind).contains(path));
        if !present {
            return false;
        }
        debug!(%kind, %path, "scoping selector removed");
        self.store
            .update(|data| data.selectors_mut(kind).retain(|p| p != path))
    }

    pub fn clear(&self) {
        self.store.set_state(ScopingStoreData::default());
    }

    pub fn data(&self) -> ScopingStoreData {
        self.store.get_state().unwrap_or_default()
    }
}

impl BaseStore<ScopingStoreData> for ScopingStore {
    fn get_state(&self) -> Option<ScopingStoreData> {
        self.store.get_state()
    }

    fn subscribe(&self, listener: StoreListener) -> Subscription {
        self.store.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn adding_twice_keeps_one_entry_and_one_notification() {
        let store = ScopingStore::new();
        let notifications = Rc::new(Cell::new(0));
        let counter = notifications.clone();
        let _subscription = store.subscribe(Rc::new(move || counter.set(counter.get() + 1)));

        let path = SelectorPath::new(["#main"]);
        assert!(store.add_selector(ScopingSelectorKind::Include, path.clone()));
        assert!(!store.add_selector(ScopingSelectorKind::Include, path.clone()));
        assert!(store.add_selector(ScopingSelectorKind::Exclude, path.clone()));
        assert_eq!(notifications.get(), 2);

        let data = store.data();
        assert_eq!(data.include, vec![path.clone()]);
        assert_eq!(data.exclude, vec![path]);
    }

    #[test]
    fn delete_removes_only_that_list() {
        let store = ScopingStore::new();
        let path = SelectorPath::new(["#host", "button"]);
        store.add_selector(ScopingSelectorKind::Include, path.clone());
        store.add_selector(ScopingSelectorKind::Exclude, path.clone());

        assert!(store.delete_selector(ScopingSelectorKind::Include, &path));
        assert!(!store.delete_selector(ScopingSelectorKind::Include, &path));
        assert!(store.data().include.is_empty());
        assert_eq!(store.data().exclude.len(), 1);

        store.clear();
        assert_eq!(store.data(), ScopingStoreData::default());
    }
}
