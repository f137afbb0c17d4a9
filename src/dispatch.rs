//! Routes window events and script folder changes to the engine.
use crate::backend::{WindowId, WindowSystem};
use crate::config::{Options, RULES_SCRIPT};
use crate::context::ExecutionContext;
use crate::engine::ScriptEngine;
use crate::error::EngineResult;
use crate::registry::{is_script, EventKind};
use crate::watch::FsChange;
use gory::*;
use libewmh::WmEvent;
use std::collections::HashSet;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, error, info, warn};

pub struct Dispatcher {
    engine: ScriptEngine,
    wm: Rc<dyn WindowSystem>,
    ctx: Rc<ExecutionContext>,
    debug: bool,
    subscribed: HashSet<WindowId>,
    last_name: Option<(WindowId, String)>,
}

impl Dispatcher {
    /// Load the folder and list what was found. `None` means there is nothing to run.
    pub fn start(opts: &Options, wm: Rc<dyn WindowSystem>) -> EngineResult<Option<Self>> {
        let ctx = Rc::new(ExecutionContext::new());
        let engine = ScriptEngine::init(&opts.folder, wm.clone(), ctx.clone(), opts.mode())?;
        let dispatcher =
            Self { engine, wm, ctx, debug: opts.debug, subscribed: HashSet::new(), last_name: None };

        dispatcher.print_buckets();
        if dispatcher.engine.registry().is_empty() {
            println!("No script files found in {}, exiting", opts.folder.display());
            return Ok(None);
        }
        Ok(Some(dispatcher))
    }

    pub fn handle_window_event(&mut self, event: WmEvent) {
        debug!("event: {:?}", event);
        match event {
            WmEvent::Opened(win) => {
                self.subscribe(win);
                self.run_bucket(EventKind::Open, win);
            },
            WmEvent::Closed(win) => {
                self.run_bucket(EventKind::Close, win);
                self.engine.release_window(win);
                self.subscribed.remove(&win);
                debug!("close: id: {}, callbacks left: {}", win, self.engine.callback_count());
                if self.last_name.as_ref().map_or(false, |(w, _)| *w == win) {
                    self.last_name = None;
                }
            },
            WmEvent::ActiveChanged { previous, current } => {
                if let Some(win) = previous {
                    self.run_bucket(EventKind::Blur, win);
                }
                if let Some(win) = current {
                    self.run_bucket(EventKind::Focus, win);
                }
            },
            WmEvent::NameChanged(win) => {
                // Window managers like to repeat themselves
                let name = self.wm.name(win).unwrap_or_default();
                if self.last_name.as_ref().map_or(false, |(w, n)| *w == win && *n == name) {
                    return;
                }
                self.last_name = Some((win, name));
                self.run_bucket(EventKind::NameChange, win);
            },
            WmEvent::GeometryChanged(win) => self.engine.fire_geometry_changed(win),
        }
    }

    /// React to a change in the script folder, true when the scripts were reloaded
    pub fn handle_fs_change(&mut self, change: &FsChange) -> bool {
        debug!("fs: {:?}", change);
        match change {
            FsChange::Created(_) | FsChange::Removed(_) => self.reload(),
            FsChange::Modified(path) => {
                if path.file_name().map_or(false, |x| x == RULES_SCRIPT) {
                    self.reload()
                } else if is_script(path) && !self.engine.registry().is_member(path) && self.is_loaded_module(path) {
                    self.reload()
                } else {
                    false
                }
            },
        }
    }

    /// Swap in a freshly built engine. The running one stays when the new one can't be built.
    pub fn reload(&mut self) -> bool {
        match self.engine.reinit() {
            Ok(engine) => {
                self.engine = engine;
                info!("reload: scripts reloaded from {}", self.engine.folder().display());
                self.print_buckets();
                if self.engine.registry().is_empty() {
                    println!("No script files found in {}", self.engine.folder().display());
                }
                true
            },
            Err(e) => {
                error!("reload: {}, keeping the previous scripts until it is fixed", e);
                false
            },
        }
    }

    fn is_loaded_module(&self, path: &Path) -> bool {
        path.file_stem().and_then(|x| x.to_str()).map_or(false, |name| self.engine.is_module_loaded(name))
    }

    fn subscribe(&mut self, win: WindowId) {
        if self.subscribed.contains(&win) {
            return;
        }
        match self.wm.subscribe(win) {
            Ok(()) => {
                self.subscribed.insert(win);
            },
            Err(e) => warn!("subscribe: id: {}, {}", win, e),
        }
    }

    fn run_bucket(&self, kind: EventKind, win: WindowId) {
        let _guard = self.ctx.enter(Some(win));
        for path in self.engine.registry().bucket(kind) {
            self.engine.run(path);
        }
    }

    fn print_buckets(&self) {
        if !self.debug {
            return;
        }
        for kind in EventKind::ALL {
            let heading = format!("Lua files handling \"{}\" events:", kind);
            println!("{}", heading.as_str().cyan());
            for path in self.engine.registry().bucket(kind) {
                println!("  {}", path.display());
            }
        }
    }
}
