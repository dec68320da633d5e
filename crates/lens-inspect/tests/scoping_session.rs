//! Store → controller → listener → finder, against a parsed page.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use futures::executor::LocalPool;
use lens_config::LensConfig;
use lens_dom::{
    document_from_html, Document, ElementFinderByPosition, EventKind, HtmlOptions, MouseEvent,
    SelectorPath, ShadowUtils,
};
use lens_inspect::{
    BaseStore, ChangeInspectMode, InspectConfigurationFactory, InspectController, InspectMode,
    InspectStoreData, ManualTimers, ScopingListener, ScopingOptions, ScopingStore, SimpleStore,
};

const PAGE: &str = r#"
<body>
  <div id="container" style="left: 0; top: 0; width: 400px; height: 400px">
    <div class="widget" style="left: 80px; top: 100px; width: 60px; height: 60px"></div>
    <div class="widget" style="left: 200px; top: 100px; width: 60px; height: 60px"></div>
  </div>
  <x-card id="card" style="left: 500px; top: 0; width: 200px; height: 200px">
    <template shadowrootmode="open">
      <button class="go" style="left: 510px; top: 10px; width: 60px; height: 30px">Go</button>
    </template>
  </x-card>
</body>"#;

struct Session {
    doc: Rc<Document>,
    timers: Rc<ManualTimers>,
    pool: LocalPool,
    store: SimpleStore<InspectStoreData>,
    scoping: ScopingStore,
    listener: Rc<ScopingListener>,
    inspected: Rc<RefCell<Vec<SelectorPath>>>,
    _controller: InspectController,
}

impl Session {
    fn new(config: &LensConfig) -> Self {
        let doc = document_from_html(PAGE, HtmlOptions::default());
        let timers = Rc::new(ManualTimers::new());
        let pool = LocalPool::new();
        let shadow = ShadowUtils::with_host_id(doc.clone(), config.overlay.shadow_host_id.clone());
        let finder = ElementFinderByPosition::with_excluded_host(
            doc.clone(),
            config.overlay.shadow_host_id.clone(),
        );
        let listener = Rc::new(ScopingListener::new(
            shadow,
            Rc::new(finder),
            timers.clone(),
            Rc::new(pool.spawner()),
            ScopingOptions::from(config),
        ));

        let store = SimpleStore::new(InspectStoreData::default());
        let scoping = ScopingStore::new();
        let inspected = Rc::new(RefCell::new(Vec::new()));
        let sink = inspected.clone();
        let configurations = InspectConfigurationFactory::with_scoping_store(
            scoping.clone(),
            Rc::new(move |_: &MouseEvent, path: &SelectorPath| sink.borrow_mut().push(path.clone())),
        );

        let writer = store.clone();
        let change: ChangeInspectMode = Rc::new(move |_: Option<&MouseEvent>, mode: InspectMode| {
            writer.update(|state| state.inspect_mode = mode);
        });
        let hover_writer = store.clone();
        let controller = InspectController::new(
            Rc::new(store.clone()),
            listener.clone(),
            change,
            configurations,
            Rc::new(move |path: &SelectorPath| {
                hover_writer.update(|state| state.hovered_over_selector = Some(path.clone()));
            }),
        );
        controller.listen_to_store();

        Self {
            doc,
            timers,
            pool,
            store,
            scoping,
            listener,
            inspected,
            _controller: controller,
        }
    }

    fn set_mode(&self, mode: InspectMode) {
        self.store.update(|state| state.inspect_mode = mode);
    }

    fn wait(&mut self, ms: u64) {
        let target = self.timers.now() + Duration::from_millis(ms);
        while let Some(deadline) = self.timers.next_deadline().filter(|d| *d <= target) {
            self.timers.advance_to(deadline);
            self.pool.run_until_stalled();
        }
        self.timers.advance_to(target);
        self.pool.run_until_stalled();
    }

    fn state(&self) -> InspectStoreData {
        self.store.get_state().unwrap_or_default()
    }

    fn mode(&self) -> InspectMode {
        self.state().inspect_mode
    }
}

#[test]
fn scoping_click_adds_include_selector_and_turns_mode_off() -> Result<()> {
    let mut session = Session::new(&LensConfig::default());
    session.set_mode(InspectMode::ScopingAddInclude);
    assert!(session.listener.is_active());
    assert_eq!(session.doc.listener_count(EventKind::Click), 1);

    session.doc.dispatch_event(&MouseEvent::mouse_move(90.0, 110.0));
    session.wait(50);
    assert_eq!(
        session.state().hovered_over_selector,
        Some(SelectorPath::new(["div.widget:nth-child(1)"]))
    );

    session.doc.dispatch_event(&MouseEvent::click(10.0, 10.0));
    session.doc.dispatch_event(&MouseEvent::click(520.0, 20.0));
    session.wait(299);
    assert!(session.scoping.data().include.is_empty());
    session.wait(1);

    assert_eq!(session.scoping.data().include, vec![SelectorPath::new(["#card", "button.go"])]);
    assert_eq!(session.mode(), InspectMode::Off);
    assert!(!session.listener.is_active());
    assert_eq!(session.doc.listener_count(EventKind::Click), 0);
    assert_eq!(session.doc.listener_count(EventKind::MouseMove), 0);
    Ok(())
}

#[test]
fn element_mode_forwards_to_callback() -> Result<()> {
    let mut session = Session::new(&LensConfig::default());
    session.set_mode(InspectMode::Element);
    session.doc.dispatch_event(&MouseEvent::click(210.0, 110.0));
    session.wait(300);
    assert_eq!(
        *session.inspected.borrow(),
        vec![SelectorPath::new(["div.widget:nth-child(2)"])]
    );
    assert!(session.scoping.data().include.is_empty());
    Ok(())
}

#[test]
fn clicks_on_empty_space_keep_scoping_active() -> Result<()> {
    let mut session = Session::new(&LensConfig::default());
    session.set_mode(InspectMode::ScopingAddExclude);
    session.doc.dispatch_event(&MouseEvent::click(900.0, 700.0));
    session.wait(300);
    assert!(session.listener.is_active());
    assert_eq!(session.mode(), InspectMode::ScopingAddExclude);
    Ok(())
}

#[test]
fn configured_debounce_is_used() -> Result<()> {
    let mut config = LensConfig::default();
    config.scoping.click_debounce_ms = 10;
    let mut session = Session::new(&config);
    session.set_mode(InspectMode::ScopingAddExclude);
    session.doc.dispatch_event(&MouseEvent::click(90.0, 110.0));
    session.wait(10);
    assert_eq!(session.scoping.data().exclude.len(), 1);
    Ok(())
}
