use super::{boolean, ints, process, text, Args, Capabilities};
use libewmh::{Rect, WinState, ALL_DESKTOPS};
use mlua::{Lua, MultiValue};

fn window_text<F>(caps: &Capabilities, lua: &Lua, args: Args, f: F) -> mlua::Result<MultiValue>
where
    F: FnOnce(u32) -> Option<String>,
{
    args.none()?;
    let value = caps.window().and_then(f).unwrap_or_default();
    text(lua, &value)
}

fn rect(r: Rect) -> mlua::Result<MultiValue> {
    ints(&[r.x as i64, r.y as i64, r.width as i64, r.height as i64])
}

fn has_states(caps: &Capabilities, args: Args, wanted: &[WinState]) -> mlua::Result<MultiValue> {
    args.none()?;
    let states = caps.window().map(|win| caps.wm.states(win)).unwrap_or_default();
    boolean(wanted.iter().all(|s| states.contains(s)))
}

pub fn get_window_name(caps: &Capabilities, lua: &Lua, args: Args) -> mlua::Result<MultiValue> {
    window_text(caps, lua, args, |win| caps.wm.name(win))
}

/// Distinguishes a window without any name property from one whose name is empty
pub fn get_window_has_name(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    boolean(caps.window().map_or(false, |win| caps.wm.name(win).is_some()))
}

pub fn get_application_name(caps: &Capabilities, lua: &Lua, args: Args) -> mlua::Result<MultiValue> {
    window_text(caps, lua, args, |win| caps.wm.app_name(win))
}

pub fn get_window_class(caps: &Capabilities, lua: &Lua, args: Args) -> mlua::Result<MultiValue> {
    window_text(caps, lua, args, |win| caps.wm.class(win))
}

pub fn get_class_instance_name(caps: &Capabilities, lua: &Lua, args: Args) -> mlua::Result<MultiValue> {
    window_text(caps, lua, args, |win| caps.wm.instance(win))
}

pub fn get_window_role(caps: &Capabilities, lua: &Lua, args: Args) -> mlua::Result<MultiValue> {
    window_text(caps, lua, args, |win| caps.wm.role(win))
}

pub fn get_window_xid(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    ints(&[caps.window().unwrap_or(0) as i64])
}

pub fn get_window_type(caps: &Capabilities, lua: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    let name = match caps.window() {
        Some(win) => caps.wm.window_type(win).map_or("WINDOW_TYPE_UNRECOGNIZED", |t| t.script_name()),
        None => "WINDOW_ERROR",
    };
    text(lua, name)
}

pub fn get_process_name(caps: &Capabilities, lua: &Lua, args: Args) -> mlua::Result<MultiValue> {
    window_text(caps, lua, args, |win| caps.wm.pid(win).map(process::process_name))
}

/// Frame geometry, zeros without a window
pub fn get_window_geometry(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    rect(caps.window().and_then(|win| caps.wm.frame_geometry(win)).unwrap_or_default())
}

/// Geometry of the client area without the decorations
pub fn get_client_window_geometry(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    rect(caps.window().and_then(|win| caps.wm.client_geometry(win)).unwrap_or_default())
}

pub fn get_screen_geometry(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    let (w, h) = match caps.window() {
        Some(_) => caps.wm.screen_size(),
        None => (-1, -1),
    };
    ints(&[w as i64, h as i64])
}

pub fn get_window_is_maximized(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    has_states(caps, args, &[WinState::MaxHorz, WinState::MaxVert])
}

pub fn get_window_is_maximized_vertically(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    has_states(caps, args, &[WinState::MaxVert])
}

pub fn get_window_is_maximized_horizontally(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    has_states(caps, args, &[WinState::MaxHorz])
}

pub fn get_window_fullscreen(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    has_states(caps, args, &[WinState::Fullscreen])
}

/// Pinned windows show up on every desktop
pub fn get_window_is_pinned(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    boolean(caps.window().and_then(|win| caps.wm.desktop(win)) == Some(ALL_DESKTOPS))
}

pub fn get_window_is_decorated(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    boolean(caps.window().map_or(false, |win| caps.wm.is_decorated(win)))
}

pub fn get_workspace_count(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.none()?;
    let count = caps.window().and_then(|_| caps.wm.desktop_count()).unwrap_or(0);
    ints(&[count as i64])
}

#[cfg(test)]
mod tests {
    use crate::backend::fake::{FakeWindow, FakeWindowSystem};
    use crate::capabilities::testing::Harness;
    use crate::config::Mode;
    use libewmh::{Rect, WinState, WinType, ALL_DESKTOPS};

    fn harness() -> Harness {
        let mut win = FakeWindow::named("Terminal").at(Rect::new(10, 20, 300, 200));
        win.class = "XTerm".to_owned();
        win.instance = "xterm".to_owned();
        win.role = Some("main".to_owned());
        win.window_type = WinType::Dialog;
        win.borders = (2, 2, 20, 2);
        win.states = vec![WinState::MaxVert, WinState::Fullscreen];
        win.pid = Some(std::process::id());

        let mut unnamed = FakeWindow::named("");
        unnamed.name = None;
        unnamed.window_type = WinType::Notification;
        unnamed.desktop = ALL_DESKTOPS;

        let fake = FakeWindowSystem::new().with_window(1, win).with_window(2, unnamed).with_window(3, FakeWindow::named(""));
        Harness::new(fake, Mode::default())
    }

    #[test]
    fn test_identity() {
        let h = harness();
        let _guard = h.ctx.enter(Some(1));
        assert_eq!(h.eval::<String>("return get_window_name()").unwrap(), "Terminal");
        assert_eq!(h.eval::<String>("return get_application_name()").unwrap(), "Terminal");
        assert_eq!(h.eval::<String>("return get_window_class()").unwrap(), "XTerm");
        assert_eq!(h.eval::<String>("return get_class_instance_name()").unwrap(), "xterm");
        assert_eq!(h.eval::<String>("return get_window_role()").unwrap(), "main");
        assert_eq!(h.eval::<i64>("return get_window_xid()").unwrap(), 1);
        assert_eq!(h.eval::<String>("return get_window_type()").unwrap(), "WINDOW_TYPE_DIALOG");
        assert!(!h.eval::<String>("return get_process_name()").unwrap().is_empty());
    }

    #[test]
    fn test_has_name() {
        let h = harness();
        {
            let _guard = h.ctx.enter(Some(2));
            assert!(!h.eval::<bool>("return get_window_has_name()").unwrap());
            assert_eq!(h.eval::<String>("return get_window_name()").unwrap(), "");
            assert_eq!(h.eval::<String>("return get_window_type()").unwrap(), "WINDOW_TYPE_UNRECOGNIZED");
            assert!(h.eval::<bool>("return get_window_is_pinned()").unwrap());
        }
        let _guard = h.ctx.enter(Some(3));
        assert!(h.eval::<bool>("return get_window_has_name()").unwrap());
        assert_eq!(h.eval::<String>("return get_window_name()").unwrap(), "");
    }

    #[test]
    fn test_no_window_answers() {
        let h = harness();
        assert_eq!(h.eval::<String>("return get_window_name()").unwrap(), "");
        assert_eq!(h.eval::<String>("return get_window_type()").unwrap(), "WINDOW_ERROR");
        assert_eq!(h.eval::<i64>("return get_window_xid()").unwrap(), 0);
        assert_eq!(h.eval::<(i64, i64)>("return get_screen_geometry()").unwrap(), (-1, -1));
        assert_eq!(h.eval::<(i64, i64, i64, i64)>("return get_window_geometry()").unwrap(), (0, 0, 0, 0));
        assert_eq!(h.eval::<i64>("return get_workspace_count()").unwrap(), 0);
        assert_eq!(h.eval::<String>("return get_process_name()").unwrap(), "");
        assert!(!h.eval::<bool>("return get_window_is_maximized()").unwrap());
    }

    #[test]
    fn test_geometry_and_state() {
        let h = harness();
        let _guard = h.ctx.enter(Some(1));
        assert_eq!(h.eval::<(i64, i64, i64, i64)>("return get_window_geometry()").unwrap(), (10, 20, 300, 200));
        assert_eq!(h.eval::<(i64, i64, i64, i64)>("return get_client_window_geometry()").unwrap(), (12, 40, 296, 178));
        assert_eq!(h.eval::<(i64, i64)>("return get_screen_geometry()").unwrap(), (1920, 1080));
        assert_eq!(h.eval::<i64>("return get_workspace_count()").unwrap(), 4);
        assert!(!h.eval::<bool>("return get_window_is_maximized()").unwrap());
        assert!(h.eval::<bool>("return get_window_is_maximized_vertically()").unwrap());
        assert!(!h.eval::<bool>("return get_window_is_maximized_horisontally()").unwrap());
        assert!(h.eval::<bool>("return get_window_is_fullscreen()").unwrap());
        assert!(h.eval::<bool>("return get_window_is_decorated()").unwrap());
        assert!(!h.eval::<bool>("return get_window_is_pinned()").unwrap());
    }
}
