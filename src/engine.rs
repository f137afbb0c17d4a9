//! Hosts the Lua interpreter the scripts run in.
//!
//! An engine is built in one go: fresh interpreter, capabilities installed, rules script run,
//! folder classified. Reloading builds a complete replacement and drops the old engine as a
//! whole, which takes every registered callback with it.
use crate::backend::{WindowId, WindowSystem};
use crate::capabilities::{self, Capabilities};
use crate::config::{Mode, RULES_SCRIPT};
use crate::context::ExecutionContext;
use crate::error::{EngineError, EngineResult};
use crate::registry::{Assignments, ScriptRegistry};
use mlua::{Function, Lua, RegistryKey, Table};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, error, trace};

/// Script functions waiting for geometry changes, keyed by subscription id
#[derive(Default)]
pub struct CallbackRegistry {
    next_id: u64,
    entries: BTreeMap<u64, (WindowId, RegistryKey)>,
}

impl CallbackRegistry {
    pub fn register(&mut self, win: WindowId, key: RegistryKey) -> u64 {
        self.next_id += 1;
        self.entries.insert(self.next_id, (win, key));
        self.next_id
    }

    /// Subscriptions of the window in registration order
    pub fn for_window(&self, win: WindowId) -> Vec<(u64, &RegistryKey)> {
        self.entries.iter().filter(|(_, (w, _))| *w == win).map(|(id, (_, key))| (*id, key)).collect()
    }

    /// Forget the window's subscriptions and hand back their keys
    pub fn release_window(&mut self, win: WindowId) -> Vec<RegistryKey> {
        let ids: Vec<u64> = self.entries.iter().filter(|(_, (w, _))| *w == win).map(|(id, _)| *id).collect();
        ids.into_iter().filter_map(|id| self.entries.remove(&id)).map(|(_, key)| key).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct ScriptEngine {
    lua: Lua,
    folder: PathBuf,
    registry: ScriptRegistry,
    callbacks: Rc<RefCell<CallbackRegistry>>,
    wm: Rc<dyn WindowSystem>,
    ctx: Rc<ExecutionContext>,
    mode: Mode,
}

impl ScriptEngine {
    /// Build an engine for the folder. Fails when the rules script is missing or doesn't run.
    pub fn init(
        folder: &Path, wm: Rc<dyn WindowSystem>, ctx: Rc<ExecutionContext>, mode: Mode,
    ) -> EngineResult<Self> {
        let rules = folder.join(RULES_SCRIPT);
        if !rules.is_file() {
            return Err(EngineError::RulesScriptMissing(rules).into());
        }

        let lua = Lua::new();
        let callbacks = Rc::new(RefCell::new(CallbackRegistry::default()));
        let caps = Capabilities { wm: wm.clone(), ctx: ctx.clone(), mode, callbacks: callbacks.clone() };
        capabilities::install(&lua, Rc::new(caps))?;
        extend_package_path(&lua, folder)?;

        // The rules script runs outside of any window
        {
            let _guard = ctx.enter(None);
            load(&lua, &rules).map_err(|e| EngineError::RulesScriptFailed(rules.clone(), e.to_string()))?;
        }

        let assignments = Assignments::from_globals(&lua.globals());
        let registry = ScriptRegistry::classify(folder, &assignments)?;
        debug!("init: folder: {}, buckets: {:?}", folder.display(), registry.iter().map(|(k, v)| (k, v.len())).collect::<Vec<_>>());

        Ok(Self { lua, folder: folder.to_path_buf(), registry, callbacks, wm, ctx, mode })
    }

    /// Build a replacement engine for the same folder. The caller swaps it in on success and
    /// keeps using this one otherwise.
    pub fn reinit(&self) -> EngineResult<Self> {
        ScriptEngine::init(&self.folder, self.wm.clone(), self.ctx.clone(), self.mode)
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn registry(&self) -> &ScriptRegistry {
        &self.registry
    }

    /// Run one script against whatever window is current. Failures are logged with the
    /// script's path and never propagate.
    pub fn run(&self, path: &Path) -> bool {
        trace!("run: {}, window: {:?}", path.display(), self.ctx.current());
        match load(&self.lua, path) {
            Ok(()) => true,
            Err(e) => {
                error!("{}: {}", path.display(), e);
                false
            },
        }
    }

    /// True when a script has `require`d the module
    pub fn is_module_loaded(&self, name: &str) -> bool {
        let loaded = || -> mlua::Result<bool> {
            let package: Table = self.lua.globals().get("package")?;
            let loaded: Table = package.get("loaded")?;
            loaded.contains_key(name)
        };
        loaded().unwrap_or(false)
    }

    /// Call every geometry callback of the window with the window made current
    pub fn fire_geometry_changed(&self, win: WindowId) {
        // Collect first, callbacks may register further callbacks
        let funcs: Vec<(u64, Function)> = {
            let callbacks = self.callbacks.borrow();
            callbacks
                .for_window(win)
                .into_iter()
                .filter_map(|(id, key)| {
                    let func: mlua::Result<Function> = self.lua.registry_value(key);
                    func.ok().map(|f| (id, f))
                })
                .collect()
        };

        for (id, func) in funcs {
            let _guard = self.ctx.enter(Some(win));
            let result: mlua::Result<()> = func.call(());
            if let Err(e) = result {
                error!("on_geometry_changed: id: {}, subscription: {}, {}", win, id, e);
            }
        }
    }

    /// Drop the geometry callbacks of a window that went away
    pub fn release_window(&self, win: WindowId) {
        let keys = self.callbacks.borrow_mut().release_window(win);
        for key in keys {
            if let Err(e) = self.lua.remove_registry_value(key) {
                debug!("release_window: id: {}, {}", win, e);
            }
        }
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.borrow().len()
    }
}

/// Version string of the embedded interpreter e.g. `Lua 5.4`
pub fn lua_version() -> EngineResult<String> {
    let lua = Lua::new();
    let version: String = lua.globals().get("_VERSION")?;
    Ok(version)
}

// Let scripts `require` modules that live next to them
fn extend_package_path(lua: &Lua, folder: &Path) -> mlua::Result<()> {
    let package: Table = lua.globals().get("package")?;
    let path: String = package.get("path")?;
    package.set("path", format!("{}/?.lua;{}", folder.display(), path))
}

fn load(lua: &Lua, path: &Path) -> mlua::Result<()> {
    let source = fs::read(path).map_err(mlua::Error::external)?;
    lua.load(&source[..]).set_name(format!("@{}", path.display())).exec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{FakeWindow, FakeWindowSystem, Request};
    use crate::registry::EventKind;
    use pretty_assertions::assert_eq;

    struct Setup {
        tmp: tempfile::TempDir,
        fake: Rc<FakeWindowSystem>,
        ctx: Rc<ExecutionContext>,
    }

    impl Setup {
        fn new(rules: &str) -> Self {
            let tmp = tempfile::tempdir().unwrap();
            fs::write(tmp.path().join(RULES_SCRIPT), rules).unwrap();
            let fake = FakeWindowSystem::new()
                .with_window(1, FakeWindow::named("one"))
                .with_window(2, FakeWindow::named("two"));
            Self { tmp, fake: Rc::new(fake), ctx: Rc::new(ExecutionContext::new()) }
        }

        fn script(&self, name: &str, src: &str) -> PathBuf {
            let path = self.tmp.path().join(name);
            fs::write(&path, src).unwrap();
            path
        }

        fn engine(&self) -> EngineResult<ScriptEngine> {
            ScriptEngine::init(self.tmp.path(), self.fake.clone(), self.ctx.clone(), Mode::default())
        }
    }

    #[test]
    fn test_missing_rules_script() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = Rc::new(ExecutionContext::new());
        let err = ScriptEngine::init(tmp.path(), Rc::new(FakeWindowSystem::new()), ctx, Mode::default())
            .err()
            .unwrap();
        assert_eq!(
            err.downcast_ref::<EngineError>(),
            Some(&EngineError::RulesScriptMissing(tmp.path().join(RULES_SCRIPT)))
        );
    }

    #[test]
    fn test_broken_rules_script() {
        let setup = Setup::new("this is not lua");
        let err = setup.engine().err().unwrap();
        assert!(matches!(err.downcast_ref::<EngineError>(), Some(EngineError::RulesScriptFailed(..))));
    }

    #[test]
    fn test_rules_script_classifies_and_runs_without_window() {
        let setup = Setup::new("scripts_window_close = { 'bye.lua' }\nmaximize()\n");
        let hello = setup.script("hello.lua", "");
        let bye = setup.script("bye.lua", "");
        let engine = setup.engine().unwrap();
        assert_eq!(engine.registry().bucket(EventKind::Open), &[hello]);
        assert_eq!(engine.registry().bucket(EventKind::Close), &[bye]);
        assert!(setup.fake.requests().is_empty());
    }

    #[test]
    fn test_malformed_script_does_not_stop_the_next() {
        let setup = Setup::new("");
        let bad = setup.script("a_bad.lua", "error('boom')\nmaximize()\n");
        let good = setup.script("b_good.lua", "set_window_opacity(0.5)\n");
        let engine = setup.engine().unwrap();
        assert_eq!(engine.registry().bucket(EventKind::Open), &[bad.clone(), good.clone()]);

        let _guard = setup.ctx.enter(Some(1));
        assert!(!engine.run(&bad));
        assert!(engine.run(&good));
        assert_eq!(setup.fake.requests(), vec![Request::Opacity(1, 0.5)]);
    }

    #[test]
    fn test_syntax_error_is_reported_not_raised() {
        let setup = Setup::new("");
        let broken = setup.script("broken.lua", "if then end");
        let engine = setup.engine().unwrap();
        assert!(!engine.run(&broken));
        assert!(!engine.run(&setup.tmp.path().join("vanished.lua")));
    }

    #[test]
    fn test_reinit_is_idempotent() {
        let setup = Setup::new("scripts_window_focus = { 'f.lua' }");
        setup.script("f.lua", "");
        setup.script("o.lua", "");
        let engine = setup.engine().unwrap();
        let again = engine.reinit().unwrap();
        assert_eq!(engine.registry(), again.registry());
    }

    #[test]
    fn test_require_helper_module() {
        let setup = Setup::new("scripts_modules = { 'helpers.lua' }");
        setup.script("helpers.lua", "return { answer = function() return 42 end }");
        let main = setup.script("main.lua", "local h = require('helpers')\nresult = h.answer()\n");
        let engine = setup.engine().unwrap();

        assert!(!engine.registry().is_member(&setup.tmp.path().join("helpers.lua")));
        assert!(!engine.is_module_loaded("helpers"));
        assert!(engine.run(&main));
        assert!(engine.is_module_loaded("helpers"));
        assert!(!engine.is_module_loaded("unused"));
        let result: i64 = engine.lua.globals().get("result").unwrap();
        assert_eq!(result, 42);
    }

    #[test]
    fn test_geometry_callbacks_run_in_their_window() {
        let setup = Setup::new("");
        let sub = setup.script("sub.lua", "on_geometry_changed(function() seen = get_window_xid() end)");
        let engine = setup.engine().unwrap();
        {
            let _guard = setup.ctx.enter(Some(2));
            assert!(engine.run(&sub));
        }
        assert_eq!(engine.callback_count(), 1);

        // Fired while another window is current
        let _outer = setup.ctx.enter(Some(1));
        engine.fire_geometry_changed(2);
        let seen: i64 = engine.lua.globals().get("seen").unwrap();
        assert_eq!(seen, 2);
        assert_eq!(setup.ctx.current(), Some(1));

        // Not subscribed
        engine.lua.globals().set("seen", 0).unwrap();
        engine.fire_geometry_changed(1);
        let seen: i64 = engine.lua.globals().get("seen").unwrap();
        assert_eq!(seen, 0);
    }

    #[test]
    fn test_failing_callback_restores_context() {
        let setup = Setup::new("");
        let sub = setup.script("sub.lua", "on_geometry_changed(function() error('nope') end)");
        let engine = setup.engine().unwrap();
        {
            let _guard = setup.ctx.enter(Some(2));
            engine.run(&sub);
        }
        engine.fire_geometry_changed(2);
        assert_eq!(setup.ctx.current(), None);
    }

    #[test]
    fn test_release_window_drops_callbacks() {
        let setup = Setup::new("");
        let sub = setup.script("sub.lua", "on_geometry_changed(function() count = (count or 0) + 1 end)");
        let engine = setup.engine().unwrap();
        for win in [1, 2] {
            let _guard = setup.ctx.enter(Some(win));
            engine.run(&sub);
        }
        engine.release_window(2);
        assert_eq!(engine.callback_count(), 1);
        engine.fire_geometry_changed(2);
        let count: Option<i64> = engine.lua.globals().get("count").unwrap();
        assert_eq!(count, None);
    }

    #[test]
    fn test_reinit_forgets_callbacks() {
        let setup = Setup::new("");
        let sub = setup.script("sub.lua", "on_geometry_changed(function() fired = true end)");
        let engine = setup.engine().unwrap();
        {
            let _guard = setup.ctx.enter(Some(1));
            engine.run(&sub);
        }
        let engine = engine.reinit().unwrap();
        assert_eq!(engine.callback_count(), 0);
        engine.fire_geometry_changed(1);
        let fired: Option<bool> = engine.lua.globals().get("fired").unwrap();
        assert_eq!(fired, None);
    }

    #[test]
    fn test_lua_version() {
        assert!(lua_version().unwrap().starts_with("Lua 5."));
    }
}
