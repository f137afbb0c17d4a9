use super::{boolean, nothing, ArgError, Args, Capabilities};
use libewmh::{WinState, ALL_DESKTOPS, SOURCE_APPLICATION, SOURCE_PAGER};
use mlua::{Lua, MultiValue};
use tracing::warn;

// Add or remove states through the window manager's pager protocol
fn change(caps: &Capabilities, args: Args, add: bool, first: WinState, second: Option<WinState>) -> mlua::Result<MultiValue> {
    args.none()?;
    if let Some(win) = caps.target() {
        caps.report(args.name(), caps.wm.change_state(win, add, first, second, SOURCE_PAGER));
    }
    nothing()
}

// Boolean argument picks add or remove
fn flag(caps: &Capabilities, args: Args, state: WinState) -> mlua::Result<MultiValue> {
    args.exactly(1, ArgError::OneExpected)?;
    let add = args.boolean(0)?;
    if let Some(win) = caps.target() {
        caps.report(args.name(), caps.wm.change_state(win, add, state, None, SOURCE_PAGER));
    }
    nothing()
}

// Direct state request on behalf of the application, the argument defaults to true
fn stack(caps: &Capabilities, args: Args, state: WinState) -> mlua::Result<MultiValue> {
    if args.len() > 1 {
        return Err(args.fail(ArgError::OneExpected));
    }
    let add = args.boolean_or(0, true)?;
    if let Some(win) = caps.target() {
        caps.report(args.name(), caps.wm.change_state(win, add, state, None, SOURCE_APPLICATION));
    }
    nothing()
}

pub fn make_always_on_top(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    change(caps, args, true, WinState::Above, None)
}

/// Raise the window over the others once without keeping it above
pub fn set_on_top(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    if let Some(win) = caps.target() {
        if caps.report("set_on_top", caps.wm.change_state(win, true, WinState::Above, None, SOURCE_PAGER)) {
            caps.report("set_on_top", caps.wm.change_state(win, false, WinState::Above, None, SOURCE_PAGER));
        }
    }
    nothing()
}

pub fn set_window_above(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    stack(caps, args, WinState::Above)
}

pub fn set_window_below(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    stack(caps, args, WinState::Below)
}

pub fn shade(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    change(caps, args, true, WinState::Shaded, None)
}

pub fn unshade(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    change(caps, args, false, WinState::Shaded, None)
}

pub fn maximize(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    change(caps, args, true, WinState::MaxHorz, Some(WinState::MaxVert))
}

pub fn unmaximize(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    change(caps, args, false, WinState::MaxHorz, Some(WinState::MaxVert))
}

pub fn maximize_vertically(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    change(caps, args, true, WinState::MaxVert, None)
}

pub fn maximize_horizontally(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    change(caps, args, true, WinState::MaxHorz, None)
}

pub fn stick_window(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    change(caps, args, true, WinState::Sticky, None)
}

pub fn unstick_window(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    change(caps, args, false, WinState::Sticky, None)
}

pub fn set_skip_tasklist(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    flag(caps, args, WinState::SkipTaskbar)
}

pub fn set_skip_pager(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    flag(caps, args, WinState::SkipPager)
}

pub fn set_window_fullscreen(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    flag(caps, args, WinState::Fullscreen)
}

pub fn minimize(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    if let Some(win) = caps.target() {
        caps.report("minimize", caps.wm.minimize(win));
    }
    nothing()
}

pub fn unminimize(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    if let Some(win) = caps.target() {
        caps.report("unminimize", caps.wm.activate(win));
    }
    nothing()
}

pub fn focus(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    if let Some(win) = caps.target() {
        caps.report(args.name(), caps.wm.activate(win));
    }
    nothing()
}

pub fn close_window(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    if let Some(win) = caps.target() {
        caps.report("close_window", caps.wm.close(win));
    }
    nothing()
}

/// Show the window on every desktop
pub fn pin_window(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    if let Some(win) = caps.target() {
        caps.report("pin_window", caps.wm.set_desktop(win, ALL_DESKTOPS));
    }
    nothing()
}

/// Keep the window on the current desktop only
pub fn unpin_window(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    if let Some(win) = caps.target() {
        let desktop = caps.wm.current_desktop().unwrap_or(0);
        caps.report("unpin_window", caps.wm.set_desktop(win, desktop));
    }
    nothing()
}

fn decorate(caps: &Capabilities, args: Args, decorated: bool) -> mlua::Result<MultiValue> {
    args.none()?;
    if caps.window().is_none() {
        return boolean(false);
    }
    match caps.target() {
        Some(win) => boolean(caps.report(args.name(), caps.wm.set_decorated(win, decorated))),
        None => boolean(true),
    }
}

pub fn decorate_window(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    decorate(caps, args, true)
}

pub fn undecorate_window(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    decorate(caps, args, false)
}

/// `set_window_type("WINDOW_TYPE_DOCK")`, the `_NET_WM_` prefixed and bare `DOCK` spellings work too
pub fn set_window_type(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.exactly(1, ArgError::OneExpected)?;
    let name = args.string(0)?;
    if let Some(win) = caps.target() {
        caps.report("set_window_type", caps.wm.set_window_type(win, &name));
    }
    nothing()
}

/// Opacity from 0.0 to 1.0, values outside are clamped
pub fn set_window_opacity(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.exactly(1, ArgError::OneExpected)?;
    let opacity = args.number(0)?;
    if let Some(win) = caps.target() {
        caps.report(args.name(), caps.wm.set_opacity(win, opacity.clamp(0.0, 1.0)));
    }
    nothing()
}

// Zero based desktop for a 1 based workspace number, warns about numbers past the last one
fn workspace(caps: &Capabilities, args: &Args) -> mlua::Result<Option<u32>> {
    args.exactly(1, ArgError::OneExpected)?;
    let number = args.int(0)?;
    if caps.window().is_none() {
        return Ok(None);
    }
    let count = caps.wm.desktop_count().unwrap_or(0) as i32;
    if number < 1 || number > count {
        warn!("{}: workspace number {} does not exist", args.name(), number);
    }
    Ok(if number >= 1 { Some((number - 1) as u32) } else { None })
}

pub fn set_window_workspace(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    if let Some(desktop) = workspace(caps, &args)? {
        if let Some(win) = caps.target() {
            caps.report("set_window_workspace", caps.wm.set_desktop(win, desktop));
        }
    }
    boolean(true)
}

pub fn change_workspace(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    if let Some(desktop) = workspace(caps, &args)? {
        if caps.target().is_some() {
            caps.report("change_workspace", caps.wm.switch_desktop(desktop));
        }
    }
    boolean(true)
}

#[cfg(test)]
mod tests {
    use crate::backend::fake::{FakeWindow, FakeWindowSystem, Request};
    use crate::capabilities::testing::Harness;
    use crate::config::Mode;
    use libewmh::{WinState, ALL_DESKTOPS, SOURCE_APPLICATION, SOURCE_PAGER};
    use pretty_assertions::assert_eq;

    fn harness(mode: Mode) -> Harness {
        Harness::new(FakeWindowSystem::new().with_window(1, FakeWindow::named("a")), mode)
    }

    #[test]
    fn test_toggles_change_state() {
        let h = harness(Mode::default());
        let _guard = h.ctx.enter(Some(1));
        h.exec("maximize() shade()").unwrap();
        assert!(h.eval::<bool>("return get_window_is_maximized()").unwrap());
        assert_eq!(h.fake.window(1).unwrap().states, vec![WinState::MaxHorz, WinState::MaxVert, WinState::Shaded]);

        h.exec("unmaximize() unshade() maximize_horisontally()").unwrap();
        assert_eq!(h.fake.window(1).unwrap().states, vec![WinState::MaxHorz]);
        assert!(h.eval::<bool>("return get_window_is_maximized_horizontally()").unwrap());

        h.exec("set_window_fullscreen(true) set_skip_pager(true) set_skip_tasklist(false)").unwrap();
        assert!(h.eval::<bool>("return get_window_fullscreen()").unwrap());
        assert!(h.fake.window(1).unwrap().states.contains(&WinState::SkipPager));
    }

    #[test]
    fn test_above_below_sources() {
        let h = harness(Mode::default());
        let _guard = h.ctx.enter(Some(1));
        h.exec("make_always_on_top() set_window_above() set_window_below(false)").unwrap();
        assert_eq!(
            h.fake.requests(),
            vec![
                Request::State { win: 1, add: true, first: WinState::Above, second: None, source: SOURCE_PAGER },
                Request::State { win: 1, add: true, first: WinState::Above, second: None, source: SOURCE_APPLICATION },
                Request::State { win: 1, add: false, first: WinState::Below, second: None, source: SOURCE_APPLICATION },
            ]
        );
    }

    #[test]
    fn test_set_on_top_does_not_stay_above() {
        let h = harness(Mode::default());
        let _guard = h.ctx.enter(Some(1));
        h.exec("set_on_top()").unwrap();
        assert_eq!(h.fake.requests().len(), 2);
        assert!(h.fake.window(1).unwrap().states.is_empty());
    }

    #[test]
    fn test_pin_and_unpin() {
        let mut fake = FakeWindowSystem::new().with_window(1, FakeWindow::named("a"));
        fake.current_desktop = 2;
        let h = Harness::new(fake, Mode::default());
        let _guard = h.ctx.enter(Some(1));
        h.exec("pin_window()").unwrap();
        assert!(h.eval::<bool>("return get_window_is_pinned()").unwrap());
        assert_eq!(h.fake.window(1).unwrap().desktop, ALL_DESKTOPS);
        h.exec("unpin_window()").unwrap();
        assert_eq!(h.fake.window(1).unwrap().desktop, 2);
    }

    #[test]
    fn test_minimize_and_focus() {
        let h = harness(Mode::default());
        let _guard = h.ctx.enter(Some(1));
        h.exec("minimize() unminimize() focus_window() close_window()").unwrap();
        assert_eq!(
            h.fake.requests(),
            vec![Request::Minimize(1), Request::Activate(1), Request::Activate(1), Request::Close(1)]
        );
    }

    #[test]
    fn test_decorations() {
        let h = harness(Mode::default());
        let _guard = h.ctx.enter(Some(1));
        assert!(h.eval::<bool>("return undecorate_window()").unwrap());
        assert!(!h.eval::<bool>("return get_window_is_decorated()").unwrap());

        h.fake.set_failing(true);
        assert!(!h.eval::<bool>("return decorate_window()").unwrap());
    }

    #[test]
    fn test_workspaces() {
        let h = harness(Mode::default());
        let _guard = h.ctx.enter(Some(1));
        assert!(h.eval::<bool>("return set_window_workspace(3)").unwrap());
        assert!(h.eval::<bool>("return change_workspace(2)").unwrap());

        // Past the last workspace still tries, negative numbers don't
        assert!(h.eval::<bool>("return set_window_workspace(9)").unwrap());
        assert!(h.eval::<bool>("return change_workspace(-1)").unwrap());
        assert_eq!(
            h.fake.requests(),
            vec![Request::Desktop(1, 2), Request::SwitchDesktop(1), Request::Desktop(1, 8)]
        );
    }

    #[test]
    fn test_type_and_opacity() {
        let h = harness(Mode::default());
        let _guard = h.ctx.enter(Some(1));
        h.exec("set_window_type('WINDOW_TYPE_DOCK') set_opacity(1.5) set_window_opacity(0.25)").unwrap();
        assert_eq!(
            h.fake.requests(),
            vec![Request::Type(1, "WINDOW_TYPE_DOCK".to_owned()), Request::Opacity(1, 1.0), Request::Opacity(1, 0.25)]
        );
        let err = h.exec("set_window_opacity('x')").unwrap_err().to_string();
        assert!(err.contains("set_window_opacity: Number expected as indata"), "{}", err);
    }

    #[test]
    fn test_emulate_mode() {
        let h = harness(Mode { debug: false, emulate: true });
        let _guard = h.ctx.enter(Some(1));
        h.exec("maximize() pin_window() minimize() set_window_opacity(0.5) focus() close_window()").unwrap();
        assert!(h.eval::<bool>("return decorate_window()").unwrap());
        assert!(h.eval::<bool>("return set_window_workspace(2)").unwrap());
        assert!(h.fake.requests().is_empty());
    }
}
