//! Debounced hover/click → selector pipeline behind a crosshair overlay.
//!
//! While started, every `click` and `mousemove` on the document restarts the
//! debounce timer of its stream. When a timer fires, the event position is
//! handed to the element finder and the resolved selector path is passed to
//! the callback registered for that stream. Only the newest resolution of a
//! stream is delivered: completions that were overtaken by a later dispatch,
//! or that arrive after `stop`, are dropped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures::task::{LocalSpawn, LocalSpawnExt};
use lens_config::LensConfig;
use lens_dom::{
    ElementFinder, ElementFinderMessage, EventKind, FinderError, InlineStyle, ListenerId,
    MouseEvent, NodeId, SelectorPath, ShadowUtils,
};
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::timers::{TimeoutId, WindowUtils};

pub type ClickResolved = Rc<dyn Fn(&MouseEvent, &SelectorPath)>;
pub type HoverResolved = Rc<dyn Fn(&SelectorPath)>;

pub const DEFAULT_CONTAINER_ID: &str = "insights-scoping-container";

/// Lifecycle used by the inspect controller.
pub trait ScopingControl {
    fn start(&self, on_click: ClickResolved, on_hover: HoverResolved) -> Result<()>;
    fn stop(&self);
    fn is_active(&self) -> bool;
}

#[derive(Clone, Debug)]
pub struct ScopingOptions {
    pub click_debounce: Duration,
    pub hover_debounce: Duration,
    pub container_id: String,
    pub cursor: String,
}

impl Default for ScopingOptions {
    fn default() -> Self {
        Self {
            click_debounce: Duration::from_millis(300),
            hover_debounce: Duration::from_millis(50),
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            cursor: "crosshair".to_string(),
        }
    }
}

impl From<&LensConfig> for ScopingOptions {
    fn from(config: &LensConfig) -> Self {
        Self {
            click_debounce: config.scoping.click_debounce(),
            hover_debounce: config.scoping.hover_debounce(),
            container_id: config.overlay.container_id.clone(),
            cursor: config.overlay.cursor.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stream {
    Click,
    Hover,
}

impl Stream {
    fn name(self) -> &'static str {
        match self {
            Stream::Click => "click",
            Stream::Hover => "hover",
        }
    }
}

#[derive(Default)]
struct DebounceState {
    pending: Option<TimeoutId>,
    /// Bumped on every dispatch and on stop; a completion carrying an older
    /// value is stale.
    generation: u64,
}

struct Callbacks {
    on_click: ClickResolved,
    on_hover: HoverResolved,
}

struct Listeners {
    click: ListenerId,
    mouse_move: ListenerId,
}

struct Inner {
    shadow: ShadowUtils,
    finder: Rc<dyn ElementFinder>,
    timers: Rc<dyn WindowUtils>,
    spawner: Rc<dyn LocalSpawn>,
    options: ScopingOptions,
    click: DebounceState,
    hover: DebounceState,
    callbacks: Option<Callbacks>,
    listeners: Option<Listeners>,
    overlay: Option<NodeId>,
}

impl Inner {
    fn stream_mut(&mut self, stream: Stream) -> &mut DebounceState {
        match stream {
            Stream::Click => &mut self.click,
            Stream::Hover => &mut self.hover,
        }
    }

    fn stream(&self, stream: Stream) -> &DebounceState {
        match stream {
            Stream::Click => &self.click,
            Stream::Hover => &self.hover,
        }
    }

    fn delay(&self, stream: Stream) -> Duration {
        match stream {
            Stream::Click => self.options.click_debounce,
            Stream::Hover => self.options.hover_debounce,
        }
    }
}

pub struct ScopingListener {
    inner: Rc<RefCell<Inner>>,
}

impl ScopingListener {
    pub fn new(
        shadow: ShadowUtils,
        finder: Rc<dyn ElementFinder>,
        timers: Rc<dyn WindowUtils>,
        spawner: Rc<dyn LocalSpawn>,
        options: ScopingOptions,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                shadow,
                finder,
                timers,
                spawner,
                options,
                click: DebounceState::default(),
                hover: DebounceState::default(),
                callbacks: None,
                listeners: None,
                overlay: None,
            })),
        }
    }

    /// Show the overlay, attach the document listeners and remember the
    /// callbacks. Calling it again while started only replaces the callbacks.
    pub fn start(&self, on_click: ClickResolved, on_hover: HoverResolved) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.overlay.is_none() {
            let overlay = mount_overlay(&inner.shadow, &inner.options)?;
            inner.overlay = Some(overlay);
        }
        inner.callbacks = Some(Callbacks { on_click, on_hover });

        if inner.listeners.is_none() {
            let document = inner.shadow.document().clone();
            let click = document.add_event_listener(
                EventKind::Click,
                event_listener(Rc::downgrade(&self.inner), Stream::Click),
            );
            let mouse_move = document.add_event_listener(
                EventKind::MouseMove,
                event_listener(Rc::downgrade(&self.inner), Stream::Hover),
            );
            inner.listeners = Some(Listeners { click, mouse_move });
            debug!("scoping started");
        }
        Ok(())
    }

    /// Remove the overlay and listeners and cancel pending timers. Safe to call
    /// in any state.
    pub fn stop(&self) {
        let mut inner = self.inner.borrow_mut();
        let timers = inner.timers.clone();
        for stream in [Stream::Click, Stream::Hover] {
            let state = inner.stream_mut(stream);
            state.generation += 1;
            if let Some(id) = state.pending.take() {
                timers.clear_timeout(id);
            }
        }
        inner.callbacks = None;

        let document = inner.shadow.document().clone();
        if let Some(listeners) = inner.listeners.take() {
            document.remove_event_listener(EventKind::Click, listeners.click);
            document.remove_event_listener(EventKind::MouseMove, listeners.mouse_move);
            debug!("scoping stopped");
        }
        if let Some(overlay) = inner.overlay.take() {
            if let Some(parent) = document.parent(overlay) {
                if let Err(err) = document.remove_child(parent, overlay) {
                    warn!(%err, "failed to remove scoping overlay");
                }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.borrow().listeners.is_some()
    }

    /// The overlay container while started.
    pub fn overlay(&self) -> Option<NodeId> {
        self.inner.borrow().overlay
    }

    pub fn pending_click(&self) -> Option<TimeoutId> {
        self.inner.borrow().click.pending
    }

    pub fn pending_hover(&self) -> Option<TimeoutId> {
        self.inner.borrow().hover.pending
    }
}

impl ScopingControl for ScopingListener {
    fn start(&self, on_click: ClickResolved, on_hover: HoverResolved) -> Result<()> {
        ScopingListener::start(self, on_click, on_hover)
    }

    fn stop(&self) {
        ScopingListener::stop(self)
    }

    fn is_active(&self) -> bool {
        ScopingListener::is_active(self)
    }
}

impl Drop for ScopingListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn overlay_style(options: &ScopingOptions) -> InlineStyle {
    let mut style = InlineStyle::new();
    style.set("position", "fixed");
    style.set("left", "0");
    style.set("top", "0");
    style.set("width", "100%");
    style.set("height", "100%");
    style.set("pointer-events", "auto");
    style.set("cursor", options.cursor.as_str());
    style.set("visibility", "visible");
    style
}

fn mount_overlay(shadow: &ShadowUtils, options: &ScopingOptions) -> Result<NodeId> {
    let document = shadow.document();
    let container = shadow.shadow_container()?;
    if let Some(existing) = document.get_element_by_id(container, &options.container_id) {
        return Ok(existing);
    }
    let overlay = document.create_element("div");
    document.set_attribute(overlay, "id", &options.container_id)?;
    document.set_style(overlay, overlay_style(options))?;
    document.append_child(container, overlay)?;
    Ok(overlay)
}

fn event_listener(inner: Weak<RefCell<Inner>>, stream: Stream) -> lens_dom::EventListener {
    Rc::new(move |event: &MouseEvent| {
        if let Some(inner) = inner.upgrade() {
            schedule(&inner, stream, event.clone());
        }
    })
}

/// Cancel the stream's pending timer and start a new one for `event`.
fn schedule(inner: &Rc<RefCell<Inner>>, stream: Stream, event: MouseEvent) {
    let (timers, delay, previous) = {
        let mut state = inner.borrow_mut();
        let delay = state.delay(stream);
        (state.timers.clone(), delay, state.stream_mut(stream).pending.take())
    };
    if let Some(previous) = previous {
        timers.clear_timeout(previous);
    }

    let weak = Rc::downgrade(inner);
    let id = timers.set_timeout(
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                dispatch(&inner, stream, event);
            }
        }),
        delay,
    );
    inner.borrow_mut().stream_mut(stream).pending = Some(id);
    trace!(stream = stream.name(), id = id.raw(), "debounce scheduled");
}

/// Timer elapsed: ask the finder for the element under the event position.
fn dispatch(inner: &Rc<RefCell<Inner>>, stream: Stream, event: MouseEvent) {
    let (finder, spawner, generation) = {
        let mut state = inner.borrow_mut();
        let stream_state = state.stream_mut(stream);
        stream_state.pending = None;
        stream_state.generation += 1;
        let generation = stream_state.generation;
        (state.finder.clone(), state.spawner.clone(), generation)
    };

    let message = ElementFinderMessage {
        x: event.client_x,
        y: event.client_y,
    };
    trace!(stream = stream.name(), x = message.x, y = message.y, generation, "resolving");
    let request = finder.process_request(message);
    let weak = Rc::downgrade(inner);
    let task = async move {
        let result = request.await;
        if let Some(inner) = weak.upgrade() {
            complete(&inner, stream, generation, &event, result);
        }
    };
    if let Err(err) = spawner.spawn_local(task) {
        warn!(stream = stream.name(), %err, "failed to spawn selector resolution");
    }
}

enum Delivery {
    Click(ClickResolved),
    Hover(HoverResolved),
}

fn complete(
    inner: &Rc<RefCell<Inner>>,
    stream: Stream,
    generation: u64,
    event: &MouseEvent,
    result: std::result::Result<SelectorPath, FinderError>,
) {
    let callback = {
        let state = inner.borrow();
        let current = state.stream(stream).generation;
        if current != generation {
            trace!(stream = stream.name(), generation, current, "dropping stale resolution");
            return;
        }
        match (&state.callbacks, stream) {
            (Some(callbacks), Stream::Click) => Delivery::Click(callbacks.on_click.clone()),
            (Some(callbacks), Stream::Hover) => Delivery::Hover(callbacks.on_hover.clone()),
            (None, _) => return,
        }
    };

    let path = match result {
        Ok(path) => path,
        Err(err @ FinderError::NoElementAtPoint { .. }) => {
            trace!(stream = stream.name(), %err, "nothing to resolve");
            return;
        }
        Err(err) => {
            warn!(stream = stream.name(), %err, "selector resolution failed");
            return;
        }
    };
    match callback {
        Delivery::Click(on_click) => on_click(event, &path),
        Delivery::Hover(on_hover) => on_hover(&path),
    }
}
