//! Drives the scoping listener from the inspect store.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use lens_dom::{MouseEvent, SelectorPath};
use tracing::{debug, warn};

use crate::configuration::InspectConfigurationFactory;
use crate::inspect_mode::{InspectMode, InspectStoreData};
use crate::scoping_listener::{ClickResolved, HoverResolved, ScopingControl};
use crate::store::{BaseStore, Subscription};

/// Request to change the inspect mode; the store owner applies it.
pub type ChangeInspectMode = Rc<dyn Fn(Option<&MouseEvent>, InspectMode)>;

struct ControllerInner {
    store: Rc<dyn BaseStore<InspectStoreData>>,
    scoping: Rc<dyn ScopingControl>,
    change_inspect_mode: ChangeInspectMode,
    configurations: InspectConfigurationFactory,
    on_hover: HoverResolved,
    current_mode: Cell<Option<InspectMode>>,
    subscription: RefCell<Option<Subscription>>,
}

pub struct InspectController {
    inner: Rc<ControllerInner>,
}

impl InspectController {
    pub fn new(
        store: Rc<dyn BaseStore<InspectStoreData>>,
        scoping: Rc<dyn ScopingControl>,
        change_inspect_mode: ChangeInspectMode,
        configurations: InspectConfigurationFactory,
        on_hover: HoverResolved,
    ) -> Self {
        Self {
            inner: Rc::new(ControllerInner {
                store,
                scoping,
                change_inspect_mode,
                configurations,
                on_hover,
                current_mode: Cell::new(None),
                subscription: RefCell::new(None),
            }),
        }
    }

    /// Subscribe to the store and evaluate its current state once.
    pub fn listen_to_store(&self) {
        let weak = Rc::downgrade(&self.inner);
        let subscription = self.inner.store.subscribe(Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                on_change_state(&inner);
            }
        }));
        // Replacing an earlier subscription drops it.
        *self.inner.subscription.borrow_mut() = Some(subscription);
        on_change_state(&self.inner);
    }

    /// Mode seen in the last store notification.
    pub fn current_mode(&self) -> Option<InspectMode> {
        self.inner.current_mode.get()
    }
}

fn on_change_state(inner: &Rc<ControllerInner>) {
    let Some(state) = inner.store.get_state() else {
        return;
    };
    let mode = state.inspect_mode;
    let previous = inner.current_mode.replace(Some(mode));
    if previous != Some(mode) {
        debug!(%mode, "inspect mode changed");
    }

    if mode.is_active() {
        let on_click = click_handler(Rc::downgrade(inner));
        if let Err(err) = inner.scoping.start(on_click, inner.on_hover.clone()) {
            warn!(%err, %mode, "failed to start scoping");
        }
    } else if inner.scoping.is_active() {
        inner.scoping.stop();
    }
}

fn click_handler(inner: Weak<ControllerInner>) -> ClickResolved {
    Rc::new(move |event: &MouseEvent, path: &SelectorPath| {
        if let Some(inner) = inner.upgrade() {
            on_click(&inner, event, path);
        }
    })
}

fn on_click(inner: &ControllerInner, event: &MouseEvent, path: &SelectorPath) {
    inner.scoping.stop();

    match inner.current_mode.get() {
        Some(mode) => match inner.configurations.get_configuration_by_key(mode) {
            Some(handler) => handler(event, path),
            None => warn!(%mode, %path, "no handler registered for inspect mode"),
        },
        None => warn!(%path, "click resolved before any inspect mode was seen"),
    }

    (inner.change_inspect_mode)(Some(event), InspectMode::Off);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::store::SimpleStore;

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Start,
        Stop,
        Handler(InspectMode, SelectorPath),
        ChangeMode(InspectMode),
    }

    type Log = Rc<RefCell<Vec<Call>>>;

    /// Scoping stand-in that logs lifecycle calls and keeps the last callbacks.
    struct Recorder {
        log: Log,
        active: Cell<bool>,
        on_click: RefCell<Option<ClickResolved>>,
        on_hover: RefCell<Option<HoverResolved>>,
    }

    impl ScopingControl for Recorder {
        fn start(&self, on_click: ClickResolved, on_hover: HoverResolved) -> Result<()> {
            self.log.borrow_mut().push(Call::Start);
            self.active.set(true);
            *self.on_click.borrow_mut() = Some(on_click);
            *self.on_hover.borrow_mut() = Some(on_hover);
            Ok(())
        }

        fn stop(&self) {
            self.log.borrow_mut().push(Call::Stop);
            self.active.set(false);
        }

        fn is_active(&self) -> bool {
            self.active.get()
        }
    }

    impl Recorder {
        fn resolve_click(&self, event: &MouseEvent, path: &SelectorPath) {
            let callback = self.on_click.borrow().clone().expect("started");
            callback(event, path);
        }
    }

    struct Fixture {
        store: SimpleStore<InspectStoreData>,
        scoping: Rc<Recorder>,
        controller: InspectController,
        log: Log,
        hovered: Rc<RefCell<Vec<SelectorPath>>>,
    }

    fn fixture(initial: Option<InspectMode>, handled: &[InspectMode]) -> Fixture {
        let store = match initial {
            Some(mode) => SimpleStore::new(InspectStoreData {
                inspect_mode: mode,
                hovered_over_selector: None,
            }),
            None => SimpleStore::empty(),
        };
        let log: Log = Rc::default();
        let scoping = Rc::new(Recorder {
            log: log.clone(),
            active: Cell::new(false),
            on_click: RefCell::new(None),
            on_hover: RefCell::new(None),
        });

        let mut configurations = InspectConfigurationFactory::new();
        for mode in handled.iter().copied() {
            let log = log.clone();
            configurations.register(
                mode,
                Rc::new(move |_: &MouseEvent, path: &SelectorPath| {
                    log.borrow_mut().push(Call::Handler(mode, path.clone()))
                }),
            );
        }

        let change_log = log.clone();
        let writer = store.clone();
        let change: ChangeInspectMode = Rc::new(move |_: Option<&MouseEvent>, mode: InspectMode| {
            change_log.borrow_mut().push(Call::ChangeMode(mode));
            writer.update(|state| state.inspect_mode = mode);
        });

        let hovered = Rc::new(RefCell::new(Vec::new()));
        let sink = hovered.clone();
        let controller = InspectController::new(
            Rc::new(store.clone()),
            scoping.clone(),
            change,
            configurations,
            Rc::new(move |path: &SelectorPath| sink.borrow_mut().push(path.clone())),
        );
        Fixture {
            store,
            scoping,
            controller,
            log,
            hovered,
        }
    }

    fn set_mode(store: &SimpleStore<InspectStoreData>, mode: InspectMode) {
        store.update(|state| state.inspect_mode = mode);
    }

    #[test]
    fn active_state_at_subscription_starts_once() {
        let f = fixture(Some(InspectMode::ScopingAddInclude), &[]);
        f.controller.listen_to_store();
        assert_eq!(*f.log.borrow(), vec![Call::Start]);
        assert_eq!(f.controller.current_mode(), Some(InspectMode::ScopingAddInclude));
    }

    #[test]
    fn inactive_state_never_starts() {
        let f = fixture(Some(InspectMode::Off), &[]);
        f.controller.listen_to_store();
        assert!(f.log.borrow().is_empty());
    }

    #[test]
    fn missing_state_is_ignored() {
        let f = fixture(None, &[]);
        f.controller.listen_to_store();
        assert!(f.log.borrow().is_empty());
        assert_eq!(f.controller.current_mode(), None);

        f.store.set_state(InspectStoreData {
            inspect_mode: InspectMode::Element,
            hovered_over_selector: None,
        });
        assert_eq!(*f.log.borrow(), vec![Call::Start]);
    }

    #[test]
    fn click_stops_then_dispatches_then_turns_off() {
        let f = fixture(Some(InspectMode::Off), &[InspectMode::ScopingAddExclude]);
        f.controller.listen_to_store();
        set_mode(&f.store, InspectMode::ScopingAddExclude);

        let path = SelectorPath::new(["#container", ".widget"]);
        f.scoping.resolve_click(&MouseEvent::click(100.0, 120.0), &path);

        assert_eq!(
            *f.log.borrow(),
            vec![
                Call::Start,
                Call::Stop,
                Call::Handler(InspectMode::ScopingAddExclude, path),
                Call::ChangeMode(InspectMode::Off),
            ]
        );
        assert_eq!(f.controller.current_mode(), Some(InspectMode::Off));
        assert!(!f.scoping.is_active());
    }

    #[test]
    fn handler_sees_mode_recorded_at_click_time() {
        let f = fixture(Some(InspectMode::Element), &[InspectMode::Element, InspectMode::ScopingAddInclude]);
        f.controller.listen_to_store();
        set_mode(&f.store, InspectMode::ScopingAddInclude);
        f.scoping
            .resolve_click(&MouseEvent::click(1.0, 1.0), &SelectorPath::new(["p"]));
        assert!(f
            .log
            .borrow()
            .contains(&Call::Handler(InspectMode::ScopingAddInclude, SelectorPath::new(["p"]))));
    }

    #[test]
    fn missing_handler_still_turns_mode_off() {
        let f = fixture(Some(InspectMode::Element), &[]);
        f.controller.listen_to_store();
        f.scoping
            .resolve_click(&MouseEvent::click(1.0, 1.0), &SelectorPath::new(["p"]));
        assert_eq!(
            *f.log.borrow(),
            vec![Call::Start, Call::Stop, Call::ChangeMode(InspectMode::Off)]
        );
    }

    #[test]
    fn external_off_stops_scoping() {
        let f = fixture(Some(InspectMode::Element), &[]);
        f.controller.listen_to_store();
        set_mode(&f.store, InspectMode::Off);
        set_mode(&f.store, InspectMode::Off);
        assert_eq!(*f.log.borrow(), vec![Call::Start, Call::Stop]);
    }

    #[test]
    fn hover_callback_is_passed_through() {
        let f = fixture(Some(InspectMode::Element), &[]);
        f.controller.listen_to_store();
        let on_hover = f.scoping.on_hover.borrow().clone().unwrap();
        on_hover(&SelectorPath::new(["#hovered"]));
        assert_eq!(*f.hovered.borrow(), vec![SelectorPath::new(["#hovered"])]);
    }

    #[test]
    fn dropping_the_controller_ends_the_subscription() {
        let f = fixture(Some(InspectMode::Off), &[]);
        f.controller.listen_to_store();
        assert_eq!(f.store.listener_count(), 1);
        drop(f.controller);
        assert_eq!(f.store.listener_count(), 0);
        set_mode(&f.store, InspectMode::Element);
        assert!(f.log.borrow().is_empty());
    }
}
