//! Inspect mode → click completion handler table.

use std::collections::HashMap;
use std::rc::Rc;

use lens_dom::{MouseEvent, SelectorPath};

use crate::inspect_mode::InspectMode;
use crate::scoping_store::{ScopingSelectorKind, ScopingStore};

pub type InspectHandler = Rc<dyn Fn(&MouseEvent, &SelectorPath)>;

#[derive(Clone, Default)]
pub struct InspectConfigurationFactory {
    handlers: HashMap<InspectMode, InspectHandler>,
}

impl InspectConfigurationFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default table: the scoping modes write into `store`, `element` forwards
    /// to `on_inspect_element`.
    pub fn with_scoping_store(store: ScopingStore, on_inspect_element: InspectHandler) -> Self {
        let include = store.clone();
        let exclude = store;
        Self::new()
            .with(InspectMode::Element, on_inspect_element)
            .with(
                InspectMode::ScopingAddInclude,
                Rc::new(move |_: &MouseEvent, path: &SelectorPath| {
                    include.add_selector(ScopingSelectorKind::Include, path.clone());
                }),
            )
            .with(
                InspectMode::ScopingAddExclude,
                Rc::new(move |_: &MouseEvent, path: &SelectorPath| {
                    exclude.add_selector(ScopingSelectorKind::Exclude, path.clone());
                }),
            )
    }

    pub fn with(mut self, mode: InspectMode, handler: InspectHandler) -> Self {
        self.register(mode, handler);
        self
    }

    pub fn register(&mut self, mode: InspectMode, handler: InspectHandler) -> Option<InspectHandler> {
        self.handlers.insert(mode, handler)
    }

    pub fn get_configuration_by_key(&self, mode: InspectMode) -> Option<InspectHandler> {
        self.handlers.get(&mode).cloned()
    }
}
