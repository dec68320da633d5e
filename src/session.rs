//! Scripted inspection sessions.
//!
//! A session script is a list of lines, one step each:
//!
//! ```text
//! # comment
//! mode scopingAddInclude
//! move 120 80
//! wait 50
//! click 120 80
//! wait 300
//! ```
//!
//! Time only advances on `wait`; events are dispatched at the current virtual
//! time.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures::executor::LocalPool;
use lens_config::{FeatureFlag, FeatureFlags, LensConfig};
use lens_dom::{Document, ElementFinderByPosition, MouseEvent, SelectorPath, ShadowUtils};
use lens_inspect::{
    BaseStore, ChangeInspectMode, InspectConfigurationFactory, InspectController, InspectHandler,
    InspectMode, InspectStoreData, ManualTimers, ScopingListener, ScopingOptions, ScopingStore,
    ScopingStoreData, SimpleStore,
};
use lens_visual::{DrawerConfiguration, Formatter, HighlightBoxFormatter, HoverHighlighter};
use log::{debug, warn};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Mode(InspectMode),
    Move { x: f32, y: f32 },
    Click { x: f32, y: f32 },
    Wait(Duration),
}

pub fn parse_session(src: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (index, raw) in src.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step = parse_step(line).with_context(|| format!("line {}: {line:?}", index + 1))?;
        steps.push(step);
    }
    Ok(steps)
}

fn parse_step(line: &str) -> Result<Step> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let step = match words.as_slice() {
        ["mode", mode] => Step::Mode(mode.parse()?),
        ["move", x, y] => Step::Move {
            x: x.parse()?,
            y: y.parse()?,
        },
        ["click", x, y] => Step::Click {
            x: x.parse()?,
            y: y.parse()?,
        },
        ["wait", ms] => Step::Wait(Duration::from_millis(ms.parse()?)),
        [command, ..] => bail!("unknown or malformed command {command:?}"),
        [] => bail!("empty step"),
    };
    Ok(step)
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRecord {
    pub mode: InspectMode,
    pub x: f32,
    pub y: f32,
    pub selector: SelectorPath,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightReport {
    pub selector: SelectorPath,
    pub drawer: DrawerConfiguration,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub elapsed_ms: u64,
    pub final_mode: InspectMode,
    pub hovered: Vec<SelectorPath>,
    pub clicks: Vec<ClickRecord>,
    pub inspected: Vec<SelectorPath>,
    pub scoping: ScopingStoreData,
    pub highlight: Option<HighlightReport>,
}

#[derive(Default)]
struct Recorded {
    hovered: Vec<SelectorPath>,
    clicks: Vec<ClickRecord>,
    inspected: Vec<SelectorPath>,
}

/// Inspection pipeline wired against one page, driven by a virtual clock.
pub struct Session {
    document: Rc<Document>,
    timers: Rc<ManualTimers>,
    pool: LocalPool,
    store: SimpleStore<InspectStoreData>,
    scoping: ScopingStore,
    highlighter: Rc<HoverHighlighter>,
    formatter: HighlightBoxFormatter,
    features: FeatureFlags,
    recorded: Rc<RefCell<Recorded>>,
    _controller: InspectController,
}

impl Session {
    pub fn new(document: Rc<Document>, config: &LensConfig) -> Self {
        let timers = Rc::new(ManualTimers::new());
        let pool = LocalPool::new();
        let host_id = config.overlay.shadow_host_id.clone();
        let shadow = ShadowUtils::with_host_id(document.clone(), host_id.clone());
        let finder = ElementFinderByPosition::with_excluded_host(document.clone(), host_id);
        let listener = Rc::new(ScopingListener::new(
            shadow.clone(),
            Rc::new(finder),
            timers.clone(),
            Rc::new(pool.spawner()),
            ScopingOptions::from(config),
        ));

        let formatter = HighlightBoxFormatter::from_config(&config.highlight);
        let highlighter = Rc::new(HoverHighlighter::with_box_id(
            shadow,
            formatter.clone(),
            config.highlight.hover_box_id.clone(),
        ));
        let store = SimpleStore::new(InspectStoreData::default());
        let scoping = ScopingStore::new();
        let recorded = Rc::new(RefCell::new(Recorded::default()));

        let sink = recorded.clone();
        let base = InspectConfigurationFactory::with_scoping_store(
            scoping.clone(),
            Rc::new(move |_: &MouseEvent, path: &SelectorPath| {
                sink.borrow_mut().inspected.push(path.clone())
            }),
        );
        let configurations = recording_configurations(&base, &recorded);

        let writer = store.clone();
        let clear_on_off = highlighter.clone();
        let change: ChangeInspectMode = Rc::new(move |_: Option<&MouseEvent>, mode: InspectMode| {
            if !mode.is_active() {
                clear_on_off.clear();
            }
            writer.update(|state| state.inspect_mode = mode);
        });

        let hover_writer = store.clone();
        let hover_sink = recorded.clone();
        let hover_highlighter = highlighter.clone();
        let on_hover = Rc::new(move |path: &SelectorPath| {
            hover_sink.borrow_mut().hovered.push(path.clone());
            if let Err(err) = hover_highlighter.highlight(path) {
                warn!("failed to draw hover highlight for {path}: {err}");
            }
            hover_writer.update(|state| state.hovered_over_selector = Some(path.clone()));
        });

        let controller = InspectController::new(
            Rc::new(store.clone()),
            listener,
            change,
            configurations,
            on_hover,
        );
        controller.listen_to_store();

        Self {
            document,
            timers,
            pool,
            store,
            scoping,
            highlighter,
            formatter,
            features: config.features.clone(),
            recorded,
            _controller: controller,
        }
    }

    pub fn run(&mut self, steps: &[Step]) -> SessionReport {
        for step in steps {
            self.apply(step);
        }
        self.report()
    }

    pub fn apply(&mut self, step: &Step) {
        debug!("step {step:?} at {:?}", self.timers.now());
        match *step {
            Step::Mode(mode) => self.set_mode(mode),
            Step::Move { x, y } => {
                self.document.dispatch_event(&MouseEvent::mouse_move(x, y));
            }
            Step::Click { x, y } => {
                self.document.dispatch_event(&MouseEvent::click(x, y));
            }
            Step::Wait(duration) => self.wait(duration),
        }
        self.pool.run_until_stalled();
    }

    fn set_mode(&self, requested: InspectMode) {
        let mode = if requested.is_scoping() && !self.features.is_enabled(FeatureFlag::Scoping) {
            warn!("{requested} needs the scoping feature flag; using element mode");
            InspectMode::Element
        } else {
            requested
        };
        self.store.update(|state| state.inspect_mode = mode);
    }

    /// Advance the clock, letting resolutions settle after every batch of
    /// timers that fall due together.
    fn wait(&mut self, duration: Duration) {
        let target = self.timers.now() + duration;
        while let Some(deadline) = self.timers.next_deadline().filter(|d| *d <= target) {
            self.timers.advance_to(deadline);
            self.pool.run_until_stalled();
        }
        self.timers.advance_to(target);
    }

    pub fn report(&self) -> SessionReport {
        let recorded = self.recorded.borrow();
        let state = self.store.get_state().unwrap_or_default();
        let highlight = self.highlighter.current().and_then(|_| {
            let selector = state.hovered_over_selector.clone()?;
            let element = self.document.query_selector_path(&selector).ok()??;
            Some(HighlightReport {
                drawer: self.formatter.drawer_configuration(element, None),
                selector,
            })
        });
        SessionReport {
            elapsed_ms: self.timers.now().as_millis() as u64,
            final_mode: state.inspect_mode,
            hovered: recorded.hovered.clone(),
            clicks: recorded.clicks.clone(),
            inspected: recorded.inspected.clone(),
            scoping: self.scoping.data(),
            highlight,
        }
    }
}

/// Wrap every registered handler so completed clicks are recorded with the
/// mode they were made in.
fn recording_configurations(
    base: &InspectConfigurationFactory,
    recorded: &Rc<RefCell<Recorded>>,
) -> InspectConfigurationFactory {
    let mut configurations = InspectConfigurationFactory::new();
    for mode in InspectMode::ALL {
        let Some(inner) = base.get_configuration_by_key(mode) else {
            continue;
        };
        let sink = recorded.clone();
        let handler: InspectHandler = Rc::new(move |event: &MouseEvent, path: &SelectorPath| {
            sink.borrow_mut().clicks.push(ClickRecord {
                mode,
                x: event.client_x,
                y: event.client_y,
                selector: path.clone(),
            });
            inner(event, path);
        });
        configurations.register(mode, handler);
    }
    configurations
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_dom::{HtmlOptions, document_from_file, document_from_html};
    use std::io::Write;

    const PAGE: &str = r#"
    <body>
      <nav id="nav" style="left: 0; top: 0; width: 1280px; height: 60px">
        <a class="home" style="left: 10px; top: 10px; width: 80px; height: 40px">Home</a>
      </nav>
      <main id="main" style="left: 0; top: 60px; width: 1280px; height: 660px">
        <x-card id="card" style="left: 100px; top: 100px; width: 300px; height: 200px">
          <template shadowrootmode="open">
            <button class="buy" style="left: 120px; top: 120px; width: 100px; height: 40px">Buy</button>
          </template>
        </x-card>
      </main>
    </body>"#;

    const SCRIPT: &str = "
        # include the shadow button, then exclude the nav link
        mode scopingAddInclude
        move 130 130
        wait 50
        click 130 130
        wait 300
        mode scopingAddExclude
        click 20 20
        wait 300
    ";

    fn config(scoping: bool) -> LensConfig {
        let mut config = LensConfig::default();
        config.features.set(FeatureFlag::Scoping, scoping);
        config
    }

    #[test]
    fn parses_steps_and_skips_comments() -> Result<()> {
        let steps = parse_session("# hi\n\nmode element\nmove 1 2.5\nclick 3 4\nwait 10\n")?;
        assert_eq!(
            steps,
            vec![
                Step::Mode(InspectMode::Element),
                Step::Move { x: 1.0, y: 2.5 },
                Step::Click { x: 3.0, y: 4.0 },
                Step::Wait(Duration::from_millis(10)),
            ]
        );
        Ok(())
    }

    #[test]
    fn parse_errors_name_the_line() {
        let err = parse_session("mode element\nclick 1\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
        let err = parse_session("mode hover\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 1"));
    }

    #[test]
    fn scoping_session_builds_include_and_exclude_lists() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(PAGE.as_bytes())?;
        let document = document_from_file(file.path(), HtmlOptions::default())?;

        let mut session = Session::new(document, &config(true));
        let report = session.run(&parse_session(SCRIPT)?);

        assert_eq!(report.elapsed_ms, 650);
        assert_eq!(report.final_mode, InspectMode::Off);
        assert_eq!(report.hovered, vec![SelectorPath::new(["#card", "button.buy"])]);
        assert_eq!(report.scoping.include, vec![SelectorPath::new(["#card", "button.buy"])]);
        assert_eq!(report.scoping.exclude, vec![SelectorPath::new(["a.home"])]);
        let modes: Vec<InspectMode> = report.clicks.iter().map(|c| c.mode).collect();
        assert_eq!(modes, vec![InspectMode::ScopingAddInclude, InspectMode::ScopingAddExclude]);
        assert!(report.inspected.is_empty());
        // Turning the mode off removes the hover box.
        assert!(report.highlight.is_none());
        Ok(())
    }

    #[test]
    fn scoping_modes_fall_back_to_element_without_the_flag() -> Result<()> {
        let document = document_from_html(PAGE, HtmlOptions::default());
        let mut session = Session::new(document, &config(false));
        let report = session.run(&parse_session(SCRIPT)?);

        assert_eq!(report.scoping, ScopingStoreData::default());
        assert_eq!(
            report.inspected,
            vec![SelectorPath::new(["#card", "button.buy"]), SelectorPath::new(["a.home"])]
        );
        assert!(report.clicks.iter().all(|c| c.mode == InspectMode::Element));
        Ok(())
    }

    #[test]
    fn hover_highlight_is_reported_while_active() -> Result<()> {
        let document = document_from_html(PAGE, HtmlOptions::default());
        let mut session = Session::new(document, &config(true));
        let report = session.run(&parse_session("mode element\nmove 20 20\nwait 50\n")?);

        let highlight = report.highlight.expect("hover highlight");
        assert_eq!(highlight.selector, SelectorPath::new(["a.home"]));
        assert_eq!(highlight.drawer.border_color, "#CC0000");
        assert_eq!(report.final_mode, InspectMode::Element);
        Ok(())
    }
}
