//! The functions scripts call to inspect and steer the current window.
//!
//! Every function is a plain global in the interpreter. Each one checks its own arguments and
//! raises a script error naming itself when they don't fit, which stops only the calling
//! script. Functions that change something do nothing when there is no current window or when
//! running in emulate mode; queries always answer.
mod args;
mod geometry;
mod monitor;
mod process;
mod property;
mod queries;
mod state;

pub use args::{ArgError, Args};

use crate::backend::{WindowId, WindowSystem};
use crate::config::Mode;
use crate::context::ExecutionContext;
use crate::engine::CallbackRegistry;
use libewmh::WindowManagerResult;
use mlua::{Function, Lua, MultiValue, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{trace, warn};

type Operation = fn(&Capabilities, &Lua, Args) -> mlua::Result<MultiValue>;

/// Everything a capability needs to do its job
pub struct Capabilities {
    pub wm: Rc<dyn WindowSystem>,
    pub ctx: Rc<ExecutionContext>,
    pub mode: Mode,
    pub callbacks: Rc<RefCell<CallbackRegistry>>,
}

impl Capabilities {
    /// Window scripts are currently looking at
    pub fn window(&self) -> Option<WindowId> {
        self.ctx.current()
    }

    /// Window a mutation should act on, nothing in emulate mode
    pub fn target(&self) -> Option<WindowId> {
        if self.mode.emulate {
            None
        } else {
            self.ctx.current()
        }
    }

    /// Log a failed request, true when it went through
    pub fn report(&self, op: &str, result: WindowManagerResult<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("{}: failed: {}", op, e);
                false
            },
        }
    }
}

/// Name scripts use and the function behind it
const CATALOGUE: &[(&str, Operation)] = &[
    // identity
    ("get_window_name", queries::get_window_name),
    ("get_window_has_name", queries::get_window_has_name),
    ("get_application_name", queries::get_application_name),
    ("get_window_class", queries::get_window_class),
    ("get_class_instance_name", queries::get_class_instance_name),
    ("get_window_role", queries::get_window_role),
    ("get_window_xid", queries::get_window_xid),
    ("get_window_type", queries::get_window_type),
    ("get_process_name", queries::get_process_name),
    // geometry
    ("get_window_geometry", queries::get_window_geometry),
    ("get_client_window_geometry", queries::get_client_window_geometry),
    ("get_screen_geometry", queries::get_screen_geometry),
    ("get_monitor_index", geometry::get_monitor_index),
    ("get_monitor_geometry", geometry::get_monitor_geometry),
    ("xy", geometry::xy),
    ("xywh", geometry::xywh),
    ("set_window_position", geometry::set_window_position),
    ("set_window_position2", geometry::set_window_position2),
    ("set_window_geometry", geometry::set_window_geometry),
    ("set_window_geometry2", geometry::set_window_geometry2),
    ("set_window_size", geometry::set_window_size),
    ("set_window_strut", geometry::set_window_strut),
    ("center", geometry::center),
    ("set_monitor", geometry::set_monitor),
    ("set_viewport", geometry::set_viewport),
    // state queries
    ("get_window_is_maximized", queries::get_window_is_maximized),
    ("get_window_is_maximized_vertically", queries::get_window_is_maximized_vertically),
    ("get_window_is_maximized_horizontally", queries::get_window_is_maximized_horizontally),
    ("get_window_is_maximized_horisontally", queries::get_window_is_maximized_horizontally),
    ("get_window_is_pinned", queries::get_window_is_pinned),
    ("get_window_is_decorated", queries::get_window_is_decorated),
    ("get_window_fullscreen", queries::get_window_fullscreen),
    ("get_window_is_fullscreen", queries::get_window_fullscreen),
    ("get_workspace_count", queries::get_workspace_count),
    // state changes
    ("make_always_on_top", state::make_always_on_top),
    ("set_on_top", state::set_on_top),
    ("set_window_above", state::set_window_above),
    ("set_window_below", state::set_window_below),
    ("shade", state::shade),
    ("unshade", state::unshade),
    ("minimize", state::minimize),
    ("unminimize", state::unminimize),
    ("maximize", state::maximize),
    ("unmaximize", state::unmaximize),
    ("maximize_vertically", state::maximize_vertically),
    ("maximize_horizontally", state::maximize_horizontally),
    ("maximize_horisontally", state::maximize_horizontally),
    ("pin_window", state::pin_window),
    ("unpin_window", state::unpin_window),
    ("stick_window", state::stick_window),
    ("unstick_window", state::unstick_window),
    ("set_skip_tasklist", state::set_skip_tasklist),
    ("set_skip_pager", state::set_skip_pager),
    ("set_window_fullscreen", state::set_window_fullscreen),
    ("decorate_window", state::decorate_window),
    ("undecorate_window", state::undecorate_window),
    ("set_window_type", state::set_window_type),
    ("set_window_opacity", state::set_window_opacity),
    ("set_opacity", state::set_window_opacity),
    ("set_window_workspace", state::set_window_workspace),
    ("change_workspace", state::change_workspace),
    ("focus", state::focus),
    ("focus_window", state::focus),
    ("close_window", state::close_window),
    // properties
    ("get_window_property", property::get_window_property),
    ("set_window_property", property::set_window_property),
    ("delete_window_property", property::delete_window_property),
    // misc
    ("debug_print", debug_print),
    ("on_geometry_changed", on_geometry_changed),
];

/// Register every capability as a global function of the interpreter
pub fn install(lua: &Lua, caps: Rc<Capabilities>) -> mlua::Result<()> {
    let globals = lua.globals();
    let tostring: Function = globals.get("tostring")?;
    lua.set_named_registry_value(TOSTRING, tostring)?;
    for (name, op) in CATALOGUE {
        let (name, op) = (*name, *op);
        let caps = caps.clone();
        let func = lua.create_function(move |lua, args: MultiValue| {
            trace!("{}: {} args", name, args.len());
            op(&caps, lua, Args::new(name, args))
        })?;
        globals.set(name, func)?;
    }
    Ok(())
}

pub(crate) fn nothing() -> mlua::Result<MultiValue> {
    Ok(MultiValue::new())
}

pub(crate) fn ints(values: &[i64]) -> mlua::Result<MultiValue> {
    Ok(MultiValue::from_vec(values.iter().map(|v| Value::Integer(*v as mlua::Integer)).collect()))
}

pub(crate) fn boolean(value: bool) -> mlua::Result<MultiValue> {
    Ok(MultiValue::from_vec(vec![Value::Boolean(value)]))
}

pub(crate) fn text(lua: &Lua, value: &str) -> mlua::Result<MultiValue> {
    Ok(MultiValue::from_vec(vec![Value::String(lua.create_string(value)?)]))
}

// Scripts may replace the global one
const TOSTRING: &str = "wmscript.tostring";

/// `print` that only prints in debug mode
fn debug_print(caps: &Capabilities, lua: &Lua, args: Args) -> mlua::Result<MultiValue> {
    let tostring: Function = lua.named_registry_value(TOSTRING)?;
    let mut parts = vec![];
    for value in args.into_values() {
        let s: mlua::String = tostring.call(value)?;
        parts.push(s.to_string_lossy().to_string());
    }
    if caps.mode.debug {
        println!("{}", parts.join("\t"));
    }
    nothing()
}

/// Call the function every time the current window moves or changes size
fn on_geometry_changed(caps: &Capabilities, lua: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.exactly(1, ArgError::OneExpected)?;
    let func = match args.value(0) {
        Some(Value::Function(func)) => func.clone(),
        _ => return Err(args.fail(ArgError::FunctionExpected)),
    };
    if let Some(win) = caps.window() {
        let key = lua.create_registry_value(func)?;
        let id = caps.callbacks.borrow_mut().register(win, key);
        trace!("on_geometry_changed: id: {}, subscription: {}", win, id);
    }
    nothing()
}
