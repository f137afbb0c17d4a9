use super::monitor::{self, Axis, MonitorSelector};
use super::{boolean, ints, nothing, ArgError, Args, Capabilities};
use mlua::{Lua, MultiValue, Value};
use tracing::{error, warn};

pub fn xy(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    match args.len() {
        0 => match caps.window().and_then(|win| caps.wm.frame_geometry(win)) {
            Some(r) => ints(&[r.x as i64, r.y as i64]),
            None => nothing(),
        },
        2 => {
            let x = args.int_or(0, ArgError::TwoExpected)?;
            let y = args.int_or(1, ArgError::TwoExpected)?;
            if let Some(win) = caps.target() {
                caps.report("xy", caps.wm.move_resize(win, Some(x), Some(y), None, None));
            }
            nothing()
        },
        _ => Err(args.fail(ArgError::TwoExpected)),
    }
}

pub fn xywh(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    match args.len() {
        0 => match caps.window().and_then(|win| caps.wm.frame_geometry(win)) {
            Some(r) => ints(&[r.x as i64, r.y as i64, r.width as i64, r.height as i64]),
            None => nothing(),
        },
        4 => set_geometry(caps, &args, ArgError::FourExpected),
        _ => Err(args.fail(ArgError::FourExpected)),
    }
}

fn set_geometry(caps: &Capabilities, args: &Args, err: ArgError) -> mlua::Result<MultiValue> {
    let v = args.ints(err)?;
    if let Some(win) = caps.target() {
        caps.report(args.name(), caps.wm.move_resize(win, Some(v[0]), Some(v[1]), Some(v[2]), Some(v[3])));
    }
    nothing()
}

pub fn set_window_position(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.exactly(2, ArgError::TwoExpected)?;
    let (x, y) = (args.int(0)?, args.int(1)?);
    if let Some(win) = caps.target() {
        caps.report("set_window_position", caps.wm.move_resize(win, Some(x), Some(y), None, None));
    }
    nothing()
}

/// Move without asking the window manager
pub fn set_window_position2(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.exactly(2, ArgError::TwoExpected)?;
    let (x, y) = (args.int(0)?, args.int(1)?);
    if let Some(win) = caps.target() {
        caps.report("set_window_position2", caps.wm.configure(win, x, y, None));
    }
    nothing()
}

pub fn set_window_geometry(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.exactly(4, ArgError::FourExpected)?;
    set_geometry(caps, &args, ArgError::NumberExpected)
}

/// Move and resize without asking the window manager
pub fn set_window_geometry2(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.exactly(4, ArgError::FourExpected)?;
    let v = args.ints(ArgError::NumberExpected)?;
    if let Some(win) = caps.target() {
        caps.report("set_window_geometry2", caps.wm.configure(win, v[0], v[1], Some((v[2], v[3]))));
    }
    nothing()
}

pub fn set_window_size(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.exactly(2, ArgError::TwoExpected)?;
    let w = args.int_or(0, ArgError::TwoExpected)?;
    let h = args.int_or(1, ArgError::TwoExpected)?;
    if let Some(win) = caps.target() {
        if let Err(e) = caps.wm.move_resize(win, None, None, Some(w), Some(h)) {
            error!("set_window_size: failed: {}", e);
        }
    }
    nothing()
}

/// Reserve screen edges, `left right top bottom` followed by up to eight optional start/end
/// values. Missing values are zero, extra ones are ignored.
pub fn set_window_strut(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    if args.len() < 4 {
        return Err(args.fail(ArgError::FourExpected));
    }
    let mut strut = [0u32; 12];
    for (i, slot) in strut.iter_mut().enumerate().take(args.len()) {
        *slot = args.int(i)?.max(0) as u32;
    }
    if let Some(win) = caps.target() {
        caps.report("set_window_strut", caps.wm.set_strut(win, &strut));
    }
    nothing()
}

/// `center([monitor], [axis])`, either argument may come first
pub fn center(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    if args.len() > 2 {
        return Err(args.fail(ArgError::OneOrTwoExpected));
    }

    let monitors = caps.wm.monitors();
    let mut selector = MonitorSelector::AllMonitorsAsOne;
    let mut axis = Axis::Both;
    for i in 0..args.len() {
        match args.value(i) {
            Some(Value::Integer(_)) | Some(Value::Number(_)) => {
                selector = MonitorSelector::from_script(args.int(i)?)
                    .unwrap_or(MonitorSelector::CurrentWindowMonitor)
                    .clamp(monitors.len());
            },
            Some(Value::String(_)) => axis = Axis::from_script(&args.string(i)?),
            _ => return Err(args.fail(ArgError::NumberOrStringExpected)),
        }
    }

    let win = match caps.window() {
        Some(win) => win,
        None => return boolean(false),
    };
    let frame = match caps.wm.frame_geometry(win) {
        Some(frame) => frame,
        None => return boolean(false),
    };

    // Monitors that can't be resolved fall back to the work area
    let bounds = match selector {
        MonitorSelector::AllMonitorsAsOne => None,
        other => monitor::monitor_geometry(other, &monitors, Some(&frame)),
    };
    let bounds = match bounds.or_else(|| caps.wm.workarea()) {
        Some(bounds) => bounds,
        None => return boolean(false),
    };

    let (x, y) = monitor::centered(&frame, &bounds, axis);
    match caps.target() {
        Some(win) => boolean(caps.report("center", caps.wm.configure(win, x, y, None))),
        None => boolean(true),
    }
}

/// Move the window onto another monitor keeping its offset, `-1` spreads over all of them
pub fn set_monitor(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.exactly(1, ArgError::OneExpected)?;
    let n = args.int(0)?;

    let win = match caps.window() {
        Some(win) => win,
        None => return boolean(false),
    };
    let monitors = caps.wm.monitors();
    let frame = match caps.wm.frame_geometry(win) {
        Some(frame) => frame,
        None => return boolean(false),
    };

    let selector = MonitorSelector::from_script(n).unwrap_or(MonitorSelector::CurrentWindowMonitor).clamp(monitors.len());
    let current = monitor::monitor_index(&monitors, &frame).and_then(|i| monitors.get(i).copied());
    let (from, to) = match (current, monitor::monitor_geometry(selector, &monitors, Some(&frame))) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            warn!("set_monitor: monitor {} could not be resolved", n);
            return boolean(false);
        },
    };

    let (x, y) = monitor::relocate(&frame, &from, &to);
    match caps.target() {
        Some(win) => boolean(caps.report("set_monitor", caps.wm.configure(win, x, y, None))),
        None => boolean(true),
    }
}

/// `set_viewport(page)` moves the window to a horizontal page of a large virtual desktop,
/// `set_viewport(x, y)` moves it to absolute coordinates
pub fn set_viewport(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    let page = match args.len() {
        1 => {
            let page = args.int(0)?;
            if page <= 0 {
                error!("set_viewport: {}", ArgError::PositiveIntegerExpected);
                return boolean(false);
            }
            Some(page)
        },
        2 => {
            args.int(0)?;
            args.int(1)?;
            None
        },
        _ => return Err(args.fail(ArgError::OneOrTwoExpected)),
    };

    let win = match caps.window() {
        Some(win) => win,
        None => return boolean(false),
    };
    let frame = match caps.wm.frame_geometry(win) {
        Some(frame) => frame,
        None => return boolean(false),
    };
    let (vx, _) = match caps.wm.viewport() {
        Some(origin) => origin,
        None => {
            error!("set_viewport: could not find the current viewport");
            return boolean(false);
        },
    };

    let (x, y) = match page {
        Some(page) => match page_offset(page, caps.wm.screen_size().0, vx, frame.x) {
            Some(x) => (x, frame.y),
            None => {
                error!("set_viewport: page {} is out of range", page);
                return boolean(false);
            },
        },
        None => (args.int(0)?, args.int(1)?),
    };
    match caps.target() {
        Some(win) => boolean(caps.report("set_viewport", caps.wm.configure(win, x, y, Some((frame.width, frame.height))))),
        None => boolean(true),
    }
}

// Left edge of the window on the given page, `None` when it doesn't fit in an i32
fn page_offset(page: i32, screen_width: i32, vx: i32, x: i32) -> Option<i32> {
    (page - 1).checked_mul(screen_width)?.checked_sub(vx)?.checked_add(x)
}

pub fn get_monitor_index(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    let index = caps
        .window()
        .and_then(|win| caps.wm.frame_geometry(win))
        .and_then(|frame| monitor::monitor_index(&caps.wm.monitors(), &frame));
    match index {
        Some(i) => ints(&[i as i64 + 1]),
        None => nothing(),
    }
}

/// Geometry of the window's monitor, or of the given one. Nothing when it doesn't exist.
pub fn get_monitor_geometry(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    if args.len() > 1 {
        return Err(args.fail(ArgError::OneExpected));
    }
    let selector = match args.len() {
        0 => Some(MonitorSelector::CurrentWindowMonitor),
        _ => MonitorSelector::from_script(args.int(0)?),
    };
    let frame = caps.window().and_then(|win| caps.wm.frame_geometry(win));
    let geometry = selector.and_then(|s| monitor::monitor_geometry(s, &caps.wm.monitors(), frame.as_ref()));
    match geometry {
        Some(r) => ints(&[r.x as i64, r.y as i64, r.width as i64, r.height as i64]),
        None => nothing(),
    }
}
